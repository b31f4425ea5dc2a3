use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::camera::pixel_ray;
use crate::error::RenderError;
use crate::math::Color;
use crate::photon::generate_maps;
use crate::radiance::{radiance, EstimatorParams};
use crate::scene::Scene;

/// `peaks` records whatever exceeds this per-channel threshold above the
/// clamped [0,1] direct color — the residual the bloom filter blurs.
const BLOOM_THRESHOLD: f64 = 0.8;

/// Pixel margins excluded from tracing — each stays black without ever
/// calling the estimator, a cheap way to preview a crop of a larger frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipMargins {
    pub top: usize,
    pub left: usize,
    pub right: usize,
    pub bottom: usize,
}

/// Every knob the sampling driver needs, gathered in one place so the CLI
/// layer builds exactly one of these and hands it to [`render`].
#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    pub samples_per_pixel: u32,
    /// Russian roulette only kicks in once a path's depth reaches this.
    pub min_depth: u32,
    /// Number of row-bands the frame is split into for `rayon` dispatch.
    /// Must evenly divide the image height.
    pub chunks: usize,
    /// Photons emitted per light source; negative disables photon mapping.
    pub caustics_photons: i64,
    pub gather_radius_global: f64,
    pub gather_radius_caustics: f64,
    pub bloom_iterations: u32,
    pub gamma: f64,
    pub seed: u64,
    pub skip: SkipMargins,
}

/// The rendered frame before post-processing: `data` holds each pixel's
/// averaged direct radiance clamped to `[0, 1]`, `peaks` holds the
/// high-intensity residual above [`BLOOM_THRESHOLD`] that
/// [`crate::post::bloom`] blurs separately.
pub struct Framebuffer {
    pub cols: usize,
    pub rows: usize,
    pub data: Vec<Color>,
    pub peaks: Vec<Color>,
}

/// Renders `scene` under `config`.
///
/// Builds the global and caustics photon maps once, sequentially, then
/// splits the framebuffer into `config.chunks` disjoint row-bands and
/// samples each in parallel via `rayon`'s `par_chunks_mut` — no channel or
/// queue needed since each band owns a non-overlapping mutable slice.
/// Per-band RNG seeds are drawn from a single master generator, in
/// band-index order, on the calling thread *before* the parallel dispatch
/// starts: this keeps the render byte-for-byte deterministic for a given
/// `config.seed` regardless of how the thread pool actually schedules the
/// bands.
pub fn render(scene: &Scene, config: &RenderConfig) -> Result<Framebuffer, RenderError> {
    if config.chunks == 0 || scene.rows % config.chunks != 0 {
        return Err(RenderError::Configuration(format!(
            "chunks ({}) must evenly divide the image height ({})",
            config.chunks, scene.rows
        )));
    }
    if config.samples_per_pixel == 0 {
        return Err(RenderError::Configuration(
            "samples_per_pixel must be at least 1".into(),
        ));
    }
    if config.gamma <= 0.0 {
        return Err(RenderError::Configuration(
            "gamma must be positive".into(),
        ));
    }

    let mut master_rng = SmallRng::seed_from_u64(config.seed);

    let photon_maps = generate_maps(&scene.shapes, config.caustics_photons, &mut master_rng);

    let band_rows = scene.rows / config.chunks;
    let band_seeds: Vec<u64> = (0..config.chunks).map(|_| master_rng.gen()).collect();

    let cols = scene.cols;
    let rows = scene.rows;
    let mut data = vec![Color::zero(); cols * rows];
    let mut peaks = vec![Color::zero(); cols * rows];

    let params = EstimatorParams {
        gather_radius_global: config.gather_radius_global,
        gather_radius_caustics: config.gather_radius_caustics,
        min_depth: config.min_depth,
    };

    data.par_chunks_mut(band_rows * cols)
        .zip(peaks.par_chunks_mut(band_rows * cols))
        .zip(band_seeds.par_iter())
        .enumerate()
        .for_each(|(band_index, ((data_band, peaks_band), &seed))| {
            let mut rng = SmallRng::seed_from_u64(seed);
            let row_offset = band_index * band_rows;

            for local_y in 0..band_rows {
                let y = row_offset + local_y;
                for x in 0..cols {
                    let idx = local_y * cols + x;

                    if y < config.skip.top
                        || y >= rows.saturating_sub(config.skip.bottom)
                        || x < config.skip.left
                        || x >= cols.saturating_sub(config.skip.right)
                    {
                        continue;
                    }

                    let mut sum = Color::zero();
                    for _ in 0..config.samples_per_pixel {
                        let dx: f64 = rng.gen();
                        let dy: f64 = rng.gen();
                        let ray = pixel_ray(scene, x, y, dx, dy);
                        sum += radiance(
                            ray,
                            &scene.shapes,
                            &photon_maps,
                            params,
                            0,
                            crate::photon::AIR_IOR,
                            &mut rng,
                        );
                    }
                    let averaged = sum / config.samples_per_pixel as f64;
                    data_band[idx] = averaged.clamp01();
                    peaks_band[idx] = averaged.peaks(BLOOM_THRESHOLD);
                }
            }
        });

    Ok(Framebuffer {
        cols,
        rows,
        data,
        peaks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::shape::{Material, Shape};

    fn tiny_scene() -> Scene {
        let shapes = vec![
            Shape::Sphere {
                center: Point3::new(0.0, 0.0, 10.0),
                radius: 2.0,
                albedo: Color::new(0.8, 0.3, 0.3),
                emission: Color::zero(),
                material: Material::Diffuse,
            },
            Shape::Sphere {
                center: Point3::new(0.0, 5.0, 5.0),
                radius: 0.5,
                albedo: Color::zero(),
                emission: Color::ones(),
                material: Material::Diffuse,
            },
        ];
        Scene::new(shapes, Point3::zero(), 0.0, 0.0, 0.0, 8, 8, 60.0).unwrap()
    }

    fn base_config() -> RenderConfig {
        RenderConfig {
            samples_per_pixel: 4,
            min_depth: 3,
            chunks: 4,
            caustics_photons: -1,
            gather_radius_global: 1.0,
            gather_radius_caustics: 0.3,
            bloom_iterations: 0,
            gamma: 2.2,
            seed: 7,
            skip: SkipMargins::default(),
        }
    }

    #[test]
    fn rejects_chunk_count_not_dividing_rows() {
        let scene = tiny_scene();
        let mut config = base_config();
        config.chunks = 3;
        assert!(render(&scene, &config).is_err());
    }

    #[test]
    fn rejects_zero_samples() {
        let scene = tiny_scene();
        let mut config = base_config();
        config.samples_per_pixel = 0;
        assert!(render(&scene, &config).is_err());
    }

    #[test]
    fn rejects_non_positive_gamma() {
        let scene = tiny_scene();
        let mut config = base_config();
        config.gamma = 0.0;
        assert!(render(&scene, &config).is_err());
    }

    #[test]
    fn same_seed_is_deterministic() {
        let scene = tiny_scene();
        let config = base_config();
        let a = render(&scene, &config).unwrap();
        let b = render(&scene, &config).unwrap();
        assert_eq!(a.data.len(), b.data.len());
        for (x, y) in a.data.iter().zip(b.data.iter()) {
            assert_eq!(x, y);
        }
    }

    #[test]
    fn skip_margins_leave_pixels_black() {
        let scene = tiny_scene();
        let mut config = base_config();
        config.skip = SkipMargins {
            top: 8,
            left: 0,
            right: 0,
            bottom: 0,
        };
        let fb = render(&scene, &config).unwrap();
        assert!(fb.data.iter().all(|c| *c == Color::zero()));
    }

    #[test]
    fn data_channels_stay_within_unit_range() {
        let scene = tiny_scene();
        let config = base_config();
        let fb = render(&scene, &config).unwrap();
        for c in &fb.data {
            assert!(c.x >= 0.0 && c.x <= 1.0);
            assert!(c.y >= 0.0 && c.y <= 1.0);
            assert!(c.z >= 0.0 && c.z <= 1.0);
        }
    }
}
