use rand::rngs::SmallRng;
use rand::Rng;

use crate::kdtree::KdTree;
use crate::math::{Color, Point3, Ray, Vec3};
use crate::photon::{PhotonMaps, AIR_IOR, GLASS_IOR};
use crate::shape::{closest_intersection, Material, Shape};

/// Safety backstop on recursion depth, independent of Russian roulette.
/// The estimator's own termination is purely probabilistic (see
/// [`radiance`]'s step 3); this only guards against the degenerate case of
/// an albedo so close to white that termination becomes vanishingly
/// unlikely within any practical number of bounces.
const MAX_BOUNCES: u32 = 64;

/// The knobs the recursive estimator needs on every call, bundled so
/// [`radiance`]'s parameter list doesn't grow with every tuning constant
/// the driver exposes on the command line.
#[derive(Debug, Clone, Copy)]
pub struct EstimatorParams {
    /// Gather radius for the global/diffuse photon map.
    pub gather_radius_global: f64,
    /// Gather radius for the caustics map — typically smaller than
    /// `gather_radius_global` since caustics are sharper features.
    pub gather_radius_caustics: f64,
    /// Russian roulette only kicks in once `depth >= min_depth`; below
    /// that, every path continues with its albedo unscaled.
    pub min_depth: u32,
}

/// Traces one camera ray and returns its estimated incoming radiance.
///
/// 1. Find the closest intersection; no hit returns black.
/// 2. Orient the surface normal against the ray.
/// 3. Russian roulette: once `depth >= min_depth`, let `q = max(albedo
///    channels)`; terminate (returning just the surface's emission) with
///    probability `1 - q`, otherwise rescale albedo by `1/q` before
///    continuing. Below `min_depth`, always continue with the albedo
///    unscaled.
/// 4. Dispatch on material: diffuse combines the global and caustics
///    photon-map density estimates with one continued cosine-weighted
///    indirect bounce; specular mirror-reflects and recurses; refractive
///    Russian-roulettes between the Schlick-weighted reflected and
///    Snell-transmitted rays, carrying the refractive index across the
///    interface.
pub fn radiance(
    ray: Ray,
    shapes: &[Shape],
    maps: &PhotonMaps,
    params: EstimatorParams,
    depth: u32,
    refractive_index: f64,
    rng: &mut SmallRng,
) -> Color {
    if depth >= MAX_BOUNCES {
        return Color::zero();
    }

    let Some((shape, t)) = closest_intersection(shapes, &ray) else {
        return Color::zero();
    };

    let hit_point = ray.at(t);
    let mut normal = shape.normal(hit_point).normalized();
    let entering = normal.dot(ray.direction) < 0.0;
    if !entering {
        normal = -normal;
    }

    let emit = shape.emission();
    let mut albedo = shape.albedo();

    if depth >= params.min_depth {
        let q = albedo.x.max(albedo.y).max(albedo.z).clamp(0.0, 1.0);
        if q <= 0.0 || rng.gen::<f64>() >= q {
            return emit;
        }
        albedo = albedo / q;
    }

    match shape.material() {
        Material::Diffuse => {
            let density = gather(
                &maps.global,
                hit_point,
                params.gather_radius_global,
                maps.emitted_per_light,
            ) + gather(
                &maps.caustics,
                hit_point,
                params.gather_radius_caustics,
                maps.emitted_per_light,
            );

            let bounce_dir = Vec3::random_cosine_hemisphere(normal, rng);
            let indirect = radiance(
                Ray::new(hit_point, bounce_dir),
                shapes,
                maps,
                params,
                depth + 1,
                refractive_index,
                rng,
            );

            emit + albedo.hadamard(density) + albedo.hadamard(indirect)
        }
        Material::Specular => {
            let reflected = Ray::new(hit_point, ray.direction.reflect(normal));
            let bounced = radiance(reflected, shapes, maps, params, depth + 1, refractive_index, rng);
            emit + albedo.hadamard(bounced)
        }
        Material::Refractive => {
            let (eta_ratio, n_out, next_index) = if entering {
                (refractive_index / GLASS_IOR, normal, GLASS_IOR)
            } else {
                (refractive_index / AIR_IOR, -normal, AIR_IOR)
            };

            let cos_theta = (-ray.direction).dot(n_out).min(1.0);
            let reflectance = schlick_reflectance(cos_theta, eta_ratio);

            let next_ray = match ray.direction.refract(n_out, eta_ratio) {
                Some(refracted) if rng.gen::<f64>() >= reflectance => {
                    Ray::new(hit_point, refracted)
                }
                _ => Ray::new(hit_point, ray.direction.reflect(n_out)),
            };
            let transmitted = next_ray.direction.dot(n_out) < 0.0;
            let carried_index = if transmitted { next_index } else { refractive_index };

            let bounced = radiance(next_ray, shapes, maps, params, depth + 1, carried_index, rng);
            emit + albedo.hadamard(bounced)
        }
    }
}

fn schlick_reflectance(cosine: f64, eta_ratio: f64) -> f64 {
    let r0 = ((1.0 - eta_ratio) / (1.0 + eta_ratio)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

/// Jensen-style kernel density estimate `k / (pi * r^2 * N)` over a single
/// photon map, broadcast across all three color channels — this renderer
/// tracks photon positions only, not per-photon power, so the estimate is
/// a scalar irradiance proxy rather than a spectral one.
fn gather(tree: &KdTree, point: Point3, radius: f64, emitted_per_light: usize) -> Color {
    if emitted_per_light == 0 || radius <= 0.0 {
        return Color::zero();
    }
    let k = tree.count_within(point, radius);
    if k == 0 {
        return Color::zero();
    }
    let value = k as f64 / (std::f64::consts::PI * radius * radius * emitted_per_light as f64);
    Color::new(value, value, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Color;
    use rand::SeedableRng;

    fn cornell_corner() -> Vec<Shape> {
        vec![
            Shape::Sphere {
                center: Point3::new(0.0, 3.0, 0.0),
                radius: 0.3,
                albedo: Color::zero(),
                emission: Color::ones(),
                material: Material::Diffuse,
            },
            Shape::Plane {
                point: Point3::new(0.0, -1.0, 0.0),
                normal: Vec3::unit_y(),
                albedo: Color::new(0.8, 0.8, 0.8),
                emission: Color::zero(),
                material: Material::Diffuse,
            },
        ]
    }

    fn empty_maps() -> PhotonMaps {
        PhotonMaps {
            global: KdTree::build(Vec::new()),
            caustics: KdTree::build(Vec::new()),
            emitted_per_light: 0,
        }
    }

    #[test]
    fn miss_returns_black() {
        let shapes = cornell_corner();
        let maps = empty_maps();
        let params = EstimatorParams {
            gather_radius_global: 1.0,
            gather_radius_caustics: 0.3,
            min_depth: 3,
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let ray = Ray::new(Point3::new(0.0, 100.0, 0.0), Vec3::unit_y());
        let c = radiance(ray, &shapes, &maps, params, 0, AIR_IOR, &mut rng);
        assert_eq!(c, Color::zero());
    }

    #[test]
    fn direct_hit_on_emitter_returns_its_emission_at_minimum() {
        let shapes = cornell_corner();
        let maps = empty_maps();
        let params = EstimatorParams {
            gather_radius_global: 1.0,
            gather_radius_caustics: 0.3,
            min_depth: 3,
        };
        let mut rng = SmallRng::seed_from_u64(2);
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::unit_y());
        let c = radiance(ray, &shapes, &maps, params, 0, AIR_IOR, &mut rng);
        assert!(c.x >= 1.0 - 1e-9 && c.y >= 1.0 - 1e-9 && c.z >= 1.0 - 1e-9);
    }

    #[test]
    fn below_min_depth_never_terminates_early() {
        // A fully black-albedo diffuse floor would normally terminate
        // every path on the first Russian-roulette roll (q = 0); with
        // min_depth set above the trace's actual depth it must still
        // recurse into the indirect bounce instead of stopping at `emit`.
        let shapes = vec![Shape::Plane {
            point: Point3::new(0.0, -1.0, 0.0),
            normal: Vec3::unit_y(),
            albedo: Color::zero(),
            emission: Color::zero(),
            material: Material::Diffuse,
        }];
        let maps = empty_maps();
        let params = EstimatorParams {
            gather_radius_global: 1.0,
            gather_radius_caustics: 0.3,
            min_depth: 5,
        };
        let mut rng = SmallRng::seed_from_u64(9);
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), -Vec3::unit_y());
        // Should not panic or infinite-loop; depth cap still applies above min_depth.
        let _ = radiance(ray, &shapes, &maps, params, 0, AIR_IOR, &mut rng);
    }

    #[test]
    fn depth_cap_terminates_recursion_between_facing_mirrors() {
        let shapes = vec![
            Shape::Plane {
                point: Point3::new(0.0, 0.0, -5.0),
                normal: Vec3::unit_z(),
                albedo: Color::ones(),
                emission: Color::zero(),
                material: Material::Specular,
            },
            Shape::Plane {
                point: Point3::new(0.0, 0.0, 5.0),
                normal: -Vec3::unit_z(),
                albedo: Color::ones(),
                emission: Color::zero(),
                material: Material::Specular,
            },
        ];
        let maps = empty_maps();
        let params = EstimatorParams {
            gather_radius_global: 1.0,
            gather_radius_caustics: 0.3,
            min_depth: 1000,
        };
        let mut rng = SmallRng::seed_from_u64(42);
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::unit_z());
        let _ = radiance(ray, &shapes, &maps, params, 0, AIR_IOR, &mut rng);
    }
}
