use crate::math::{rotate_roll_pitch_yaw, Ray, Vec3};
use crate::scene::Scene;

/// Builds the primary ray for pixel `(x, y)`, jittered by the sub-pixel
/// offset `(dx, dy) in [0, 1)` that the sampling driver supplies for each
/// Monte Carlo sample.
///
/// Raster coordinates increase right and down; the image plane's `y` axis
/// increases up, so the vertical term is negated. The resulting direction
/// is built in camera space looking down `+z`, normalized, then carried
/// into world space by the scene's fixed roll → pitch → yaw rotation.
pub fn pixel_ray(scene: &Scene, x: usize, y: usize, dx: f64, dy: f64) -> Ray {
    let px = -scene.width + scene.pix_w * (x as f64 + dx);
    let py = scene.height - scene.pix_h * (y as f64 + dy);

    let local = Vec3::new(px, py, scene.near).normalized();
    let direction = rotate_roll_pitch_yaw(local, scene.roll, scene.pitch, scene.yaw);

    Ray::new(scene.camera_position, direction)
}
