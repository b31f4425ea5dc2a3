use std::path::Path;

use serde::Deserialize;

use crate::error::RenderError;
use crate::math::Point3;
use crate::scene::Scene;
use crate::shape::{Material, Shape};

/// Tolerance for the plane-normal unit-length check — scene files are
/// hand-authored JSON, so a normal like `[0.0, 1.0, 0.0]` is exact, but this
/// leaves room for values entered to a handful of decimal places.
const NORMAL_LENGTH_EPSILON: f64 = 1e-6;

/// The on-disk JSON document, kept separate from the in-memory [`Scene`]
/// and [`Shape`] types so the core renderer never carries a `serde`
/// dependency on its hot-path data.
///
/// Image dimensions and field of view are deliberately *not* part of this
/// document — they're driver-level CLI flags, not scene data, matching
/// `original_source/main.go`'s `-w`/`-h`/`-fov` flags rather than its
/// (file-format-agnostic) `geometry.ParseScene` call.
#[derive(Debug, Deserialize)]
struct SceneFile {
    camera: CameraFile,
    shapes: Vec<ShapeFile>,
}

#[derive(Debug, Deserialize)]
struct CameraFile {
    position: [f64; 3],
    #[serde(default)]
    pitch: f64,
    #[serde(default)]
    yaw: f64,
    #[serde(default)]
    roll: f64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ShapeFile {
    Sphere {
        center: [f64; 3],
        radius: f64,
        #[serde(default)]
        albedo: [f64; 3],
        #[serde(default)]
        emission: [f64; 3],
        material: MaterialFile,
    },
    Plane {
        point: [f64; 3],
        normal: [f64; 3],
        #[serde(default)]
        albedo: [f64; 3],
        #[serde(default)]
        emission: [f64; 3],
        material: MaterialFile,
    },
    Cube {
        center: [f64; 3],
        half_extent: f64,
        #[serde(default)]
        albedo: [f64; 3],
        #[serde(default)]
        emission: [f64; 3],
        material: MaterialFile,
    },
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum MaterialFile {
    Diffuse,
    Specular,
    Refractive,
}

impl From<MaterialFile> for Material {
    fn from(m: MaterialFile) -> Self {
        match m {
            MaterialFile::Diffuse => Material::Diffuse,
            MaterialFile::Specular => Material::Specular,
            MaterialFile::Refractive => Material::Refractive,
        }
    }
}

fn vec3(a: [f64; 3]) -> Point3 {
    Point3::new(a[0], a[1], a[2])
}

fn scene_err(path: &Path, message: impl Into<String>) -> RenderError {
    RenderError::Scene {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Loads and validates a scene from a JSON file on disk, combining it with
/// the driver-supplied resolution and field of view (CLI-level
/// configuration, not scene data).
pub fn load_scene_file(
    path: &Path,
    cols: usize,
    rows: usize,
    fov_degrees: f64,
) -> Result<Scene, RenderError> {
    let text = std::fs::read_to_string(path)?;
    let file: SceneFile = serde_json::from_str(&text)
        .map_err(|e| scene_err(path, format!("invalid scene JSON: {e}")))?;

    let mut shapes = Vec::with_capacity(file.shapes.len());
    for shape in file.shapes {
        shapes.push(convert_shape(path, shape)?);
    }

    Scene::new(
        shapes,
        vec3(file.camera.position),
        file.camera.pitch,
        file.camera.yaw,
        file.camera.roll,
        cols,
        rows,
        fov_degrees,
    )
}

fn convert_shape(path: &Path, shape: ShapeFile) -> Result<Shape, RenderError> {
    match shape {
        ShapeFile::Sphere {
            center,
            radius,
            albedo,
            emission,
            material,
        } => {
            if radius <= 0.0 {
                return Err(scene_err(path, "sphere radius must be positive"));
            }
            Ok(Shape::Sphere {
                center: vec3(center),
                radius,
                albedo: vec3(albedo),
                emission: vec3(emission),
                material: material.into(),
            })
        }
        ShapeFile::Plane {
            point,
            normal,
            albedo,
            emission,
            material,
        } => {
            let n = vec3(normal);
            if n.is_zero() {
                return Err(scene_err(path, "plane normal must be non-zero"));
            }
            // Spec invariant: a plane's normal must already be unit length.
            // Rather than silently normalizing a caller's mistake, the
            // loader reports it as the SceneError §7 names ("non-unit
            // plane normal") so a malformed scene file fails fast instead
            // of quietly rescaling geometry.
            if (n.length() - 1.0).abs() > NORMAL_LENGTH_EPSILON {
                return Err(scene_err(path, "plane normal must be unit length"));
            }
            Ok(Shape::Plane {
                point: vec3(point),
                normal: n,
                albedo: vec3(albedo),
                emission: vec3(emission),
                material: material.into(),
            })
        }
        ShapeFile::Cube {
            center,
            half_extent,
            albedo,
            emission,
            material,
        } => {
            if half_extent <= 0.0 {
                return Err(scene_err(path, "cube half_extent must be positive"));
            }
            Ok(Shape::Cube {
                center: vec3(center),
                half_extent,
                albedo: vec3(albedo),
                emission: vec3(emission),
                material: material.into(),
            })
        }
    }
}
