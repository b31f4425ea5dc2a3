use rand::rngs::SmallRng;
use rand::Rng;

use crate::kdtree::KdTree;
use crate::math::{Point3, Ray, Vec3};
use crate::shape::{closest_intersection, Material, Shape};

/// Refractive index of air and of the dielectric material the photon
/// tracer assumes for every `Refractive` surface, matching the radiance
/// estimator's convention.
pub const AIR_IOR: f64 = 1.0;
pub const GLASS_IOR: f64 = 1.5;

/// Caps the length of any single photon path so a photon trapped between
/// mirrored or glass surfaces cannot recurse forever.
const MAX_BOUNCES: u32 = 32;

/// The two photon maps built once per frame: the global/diffuse map
/// (every photon that terminates on a diffuse surface) and the caustics
/// map (the subset of those that arrived after at least one specular or
/// refractive bounce).
pub struct PhotonMaps {
    pub global: KdTree,
    pub caustics: KdTree,
    /// Number of photons emitted per light source — the `N` in the
    /// Jensen-style density estimate `k / (pi * r^2 * N)`. Zero when
    /// photon mapping is disabled (`caustics_per_emitter < 0`).
    pub emitted_per_light: usize,
}

impl PhotonMaps {
    fn empty() -> Self {
        PhotonMaps {
            global: KdTree::build(Vec::new()),
            caustics: KdTree::build(Vec::new()),
            emitted_per_light: 0,
        }
    }
}

/// Emits `photons_per_emitter` photons from each emitter shape and traces
/// them through the scene, recording diffuse hits into the global map and
/// post-specular/refractive diffuse hits into the caustics map.
///
/// A negative `photons_per_emitter` disables photon mapping entirely: both
/// maps come back empty and [`PhotonMaps::emitted_per_light`] is zero,
/// which the radiance estimator reads as "skip the density term, fall back
/// to pure path tracing for the diffuse contribution".
pub fn generate_maps(shapes: &[Shape], photons_per_emitter: i64, rng: &mut SmallRng) -> PhotonMaps {
    if photons_per_emitter < 0 {
        return PhotonMaps::empty();
    }

    let emitters: Vec<&Shape> = shapes.iter().filter(|s| s.is_emitter()).collect();
    if emitters.is_empty() {
        return PhotonMaps::empty();
    }

    let mut global = Vec::new();
    let mut caustics = Vec::new();

    for emitter in &emitters {
        for _ in 0..photons_per_emitter {
            let direction = Vec3::random_unit_sphere(rng);
            let origin = emitter.emission_point(direction);
            let ray = Ray::new(origin, direction);
            trace_photon(shapes, ray, false, 0, rng, &mut global, &mut caustics);
        }
    }

    PhotonMaps {
        global: KdTree::build(global),
        caustics: KdTree::build(caustics),
        emitted_per_light: photons_per_emitter as usize,
    }
}

fn trace_photon(
    shapes: &[Shape],
    ray: Ray,
    has_bounced_specular: bool,
    depth: u32,
    rng: &mut SmallRng,
    global: &mut Vec<Point3>,
    caustics: &mut Vec<Point3>,
) {
    if depth >= MAX_BOUNCES {
        return;
    }

    let Some((shape, t)) = closest_intersection(shapes, &ray) else {
        return;
    };

    let hit_point = ray.at(t);
    let mut normal = shape.normal(hit_point).normalized();
    let entering = normal.dot(ray.direction) < 0.0;
    if !entering {
        normal = -normal;
    }

    match shape.material() {
        Material::Diffuse => {
            global.push(hit_point);
            if has_bounced_specular {
                caustics.push(hit_point);
            }
        }
        Material::Specular => {
            let reflected = Ray::new(hit_point, ray.direction.reflect(normal));
            trace_photon(shapes, reflected, true, depth + 1, rng, global, caustics);
        }
        Material::Refractive => {
            let (eta_ratio, n_out) = if entering {
                (AIR_IOR / GLASS_IOR, normal)
            } else {
                (GLASS_IOR / AIR_IOR, -normal)
            };

            let cos_theta = (-ray.direction).dot(n_out).min(1.0);
            let reflectance = schlick_reflectance(cos_theta, eta_ratio);

            let next_ray = match ray.direction.refract(n_out, eta_ratio) {
                Some(refracted) if rng.gen::<f64>() >= reflectance => {
                    Ray::new(hit_point, refracted)
                }
                _ => Ray::new(hit_point, ray.direction.reflect(n_out)),
            };
            trace_photon(shapes, next_ray, true, depth + 1, rng, global, caustics);
        }
    }
}

/// Schlick's approximation to the Fresnel reflectance, used to pick
/// between the reflected and transmitted photon paths by Russian roulette.
fn schlick_reflectance(cosine: f64, eta_ratio: f64) -> f64 {
    let r0 = ((1.0 - eta_ratio) / (1.0 + eta_ratio)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
