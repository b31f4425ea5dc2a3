use crate::error::RenderError;
use crate::math::Point3;
use crate::shape::Shape;

/// Half the image plane's height in world units, held fixed the way the
/// renderer this design is descended from hardcoded its "real world"
/// frustum height; the plane's half-width is then derived from this and
/// the image's aspect ratio so pixels stay square.
const WORLD_HEIGHT: f64 = 2.0;

/// The scene: geometry plus the camera frustum it is viewed through.
///
/// `width`/`height` (`W`/`H`) are the image plane's *half*-extents in
/// world units: the plane spans `[-W, W] x [-H, H]`. `height` is fixed at
/// [`WORLD_HEIGHT`]; `width` follows from the cols/rows aspect ratio.
/// `near` is the distance from the camera to that plane, derived from the
/// requested field of view as `fov / tan(fov/2)` (`fov` in radians) —
/// reproduced exactly from the renderer this design is descended from,
/// including its unusual units. `pix_w`/`pix_h` are the resulting
/// per-pixel steps across the full `2W x 2H` plane, used by
/// [`crate::camera::pixel_ray`] to place each sample.
pub struct Scene {
    pub shapes: Vec<Shape>,
    pub camera_position: Point3,
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
    pub cols: usize,
    pub rows: usize,
    pub fov_degrees: f64,
    pub width: f64,
    pub height: f64,
    pub near: f64,
    pub pix_w: f64,
    pub pix_h: f64,
}

impl Scene {
    /// Builds a scene and derives its frustum parameters. `cols`/`rows`
    /// and `fov_degrees` are driver-level configuration — image dimensions
    /// and field of view live on the CLI, not in the scene document — the
    /// image plane's world-space half-height is held fixed at
    /// [`WORLD_HEIGHT`] and its half-width follows from the cols/rows
    /// aspect ratio, matching the "real world frustum" derivation in
    /// `original_source/main.go`.
    pub fn new(
        shapes: Vec<Shape>,
        camera_position: Point3,
        pitch: f64,
        yaw: f64,
        roll: f64,
        cols: usize,
        rows: usize,
        fov_degrees: f64,
    ) -> Result<Self, RenderError> {
        if cols == 0 || rows == 0 {
            return Err(RenderError::Configuration(
                "image resolution must be at least 1x1".into(),
            ));
        }
        if !(0.0..180.0).contains(&fov_degrees) {
            return Err(RenderError::Configuration(
                "field of view must be in (0, 180) degrees".into(),
            ));
        }

        let height = WORLD_HEIGHT;
        let width = height * cols as f64 / rows as f64;

        let fov = fov_degrees.to_radians();
        let near = (fov / (fov / 2.0).tan()).abs();
        let pix_w = 2.0 * width / cols as f64;
        let pix_h = 2.0 * height / rows as f64;

        Ok(Scene {
            shapes,
            camera_position,
            pitch,
            yaw,
            roll,
            cols,
            rows,
            fov_degrees,
            width,
            height,
            near,
            pix_w,
            pix_h,
        })
    }

    /// Shapes with non-zero emission — the photon tracer's light sources.
    pub fn emitters(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| s.is_emitter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Color;
    use crate::shape::Material;

    fn empty_scene(cols: usize, rows: usize, fov: f64) -> Result<Scene, RenderError> {
        Scene::new(Vec::new(), Point3::zero(), 0.0, 0.0, 0.0, cols, rows, fov)
    }

    #[test]
    fn zero_resolution_is_rejected() {
        assert!(empty_scene(0, 10, 60.0).is_err());
        assert!(empty_scene(10, 0, 60.0).is_err());
    }

    #[test]
    fn out_of_range_fov_is_rejected() {
        assert!(empty_scene(10, 10, 0.0).is_err());
        assert!(empty_scene(10, 10, 180.0).is_err());
        assert!(empty_scene(10, 10, -5.0).is_err());
    }

    #[test]
    fn pixel_extents_subdivide_the_full_image_plane() {
        let scene = empty_scene(400, 300, 60.0).unwrap();
        assert!((scene.pix_w * 400.0 - 2.0 * scene.width).abs() < 1e-9);
        assert!((scene.pix_h * 300.0 - 2.0 * scene.height).abs() < 1e-9);
        assert!(scene.near > 0.0);
    }

    #[test]
    fn emitters_filters_by_emission() {
        let shapes = vec![
            Shape::Sphere {
                center: Point3::zero(),
                radius: 1.0,
                albedo: Color::zero(),
                emission: Color::ones(),
                material: Material::Diffuse,
            },
            Shape::Sphere {
                center: Point3::new(5.0, 0.0, 0.0),
                radius: 1.0,
                albedo: Color::ones(),
                emission: Color::zero(),
                material: Material::Diffuse,
            },
        ];
        let scene = Scene::new(shapes, Point3::zero(), 0.0, 0.0, 0.0, 10, 10, 60.0).unwrap();
        assert_eq!(scene.emitters().count(), 1);
    }
}
