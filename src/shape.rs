use crate::math::{Color, Point3, Ray, Vec3};

/// The surface interaction model a [`Shape`] carries. Dispatch on this tag
/// drives both the photon tracer and the radiance estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    Diffuse,
    Specular,
    Refractive,
}

/// A tagged geometric primitive. Each variant carries exactly the
/// attributes its intersection math needs — no runtime kind-switch over a
/// shared blob of fields, and no unreachable arm in the intersect/normal
/// dispatch below.
#[derive(Debug, Clone)]
pub enum Shape {
    Sphere {
        center: Point3,
        radius: f64,
        albedo: Color,
        emission: Color,
        material: Material,
    },
    Plane {
        point: Point3,
        normal: Vec3,
        albedo: Color,
        emission: Color,
        material: Material,
    },
    Cube {
        center: Point3,
        half_extent: f64,
        albedo: Color,
        emission: Color,
        material: Material,
    },
}

/// The self-intersection guard shared by [`Shape::intersect`] and
/// [`closest_intersection`] — prevents a bounced ray from immediately
/// re-hitting the surface it just left.
pub const T_EPSILON: f64 = 1e-15;

impl Shape {
    pub fn albedo(&self) -> Color {
        match *self {
            Shape::Sphere { albedo, .. } => albedo,
            Shape::Plane { albedo, .. } => albedo,
            Shape::Cube { albedo, .. } => albedo,
        }
    }

    pub fn emission(&self) -> Color {
        match *self {
            Shape::Sphere { emission, .. } => emission,
            Shape::Plane { emission, .. } => emission,
            Shape::Cube { emission, .. } => emission,
        }
    }

    pub fn material(&self) -> Material {
        match *self {
            Shape::Sphere { material, .. } => material,
            Shape::Plane { material, .. } => material,
            Shape::Cube { material, .. } => material,
        }
    }

    pub fn is_emitter(&self) -> bool {
        !self.emission().is_zero()
    }

    /// The point on the shape's own surface a photon departing in `direction`
    /// should be emitted from. Starting a photon at a sphere's or cube's
    /// *center* would have it re-intersect its own surface at `t = radius`
    /// (well past the [`T_EPSILON`] self-hit guard) and terminate there
    /// instead of reaching the rest of the scene, so curved/solid emitters
    /// are walked out to their boundary along the same direction the photon
    /// is about to travel; a plane has no interior to escape, so its
    /// reference point is already a valid surface origin regardless of
    /// direction.
    pub fn emission_point(&self, direction: Vec3) -> Point3 {
        match *self {
            Shape::Sphere { center, radius, .. } => center + direction * radius,
            Shape::Plane { point, .. } => point,
            Shape::Cube {
                center,
                half_extent,
                ..
            } => {
                let max_component = direction.x.abs().max(direction.y.abs()).max(direction.z.abs());
                center + direction * (half_extent / max_component)
            }
        }
    }

    /// Nearest positive ray parameter of intersection, or `+inf` if none.
    pub fn intersect(&self, ray: &Ray) -> f64 {
        match *self {
            Shape::Sphere { center, radius, .. } => sphere_intersect(center, radius, ray),
            Shape::Plane { point, normal, .. } => plane_intersect(point, normal, ray),
            Shape::Cube {
                center,
                half_extent,
                ..
            } => cube_intersect(center, half_extent, ray),
        }
    }

    /// Outward-facing (not necessarily unit) surface normal at `point`.
    /// Callers normalize and flip-to-face-the-ray as needed.
    pub fn normal(&self, point: Point3) -> Vec3 {
        match *self {
            Shape::Sphere { center, .. } => point - center,
            Shape::Plane { normal, .. } => normal,
            Shape::Cube {
                center,
                half_extent,
                ..
            } => cube_normal(center, half_extent, point),
        }
    }
}

fn sphere_intersect(center: Point3, radius: f64, ray: &Ray) -> f64 {
    let d = center - ray.origin;
    let b = d.dot(ray.direction);
    let c = b * b - d.dot(d) + radius * radius;

    if c < 0.0 {
        return f64::INFINITY;
    }

    let s = c.sqrt();
    if b - s > 0.0 {
        return b - s;
    }
    if b + s > 0.0 {
        return b + s;
    }
    f64::INFINITY
}

fn plane_intersect(point: Point3, normal: Vec3, ray: &Ray) -> f64 {
    let denom = ray.direction.dot(normal);
    if denom == 0.0 {
        return f64::INFINITY;
    }
    (point - ray.origin).dot(normal) / denom
}

/// The six face-outward offset vectors shared by cube intersection and
/// normal computation, in a fixed order (-x, +x, -y, +y, -z, +z).
fn cube_face_offsets(half_extent: f64) -> [Vec3; 6] {
    [
        Vec3::new(-half_extent, 0.0, 0.0),
        Vec3::new(half_extent, 0.0, 0.0),
        Vec3::new(0.0, -half_extent, 0.0),
        Vec3::new(0.0, half_extent, 0.0),
        Vec3::new(0.0, 0.0, -half_extent),
        Vec3::new(0.0, 0.0, half_extent),
    ]
}

fn cube_intersect(center: Point3, half_extent: f64, ray: &Ray) -> f64 {
    let mut closest = f64::INFINITY;
    for offset in cube_face_offsets(half_extent) {
        let face_point = center + offset;
        let dist = plane_intersect(face_point, offset, ray);
        if dist > 0.0 && dist < closest {
            let diff = ray.at(dist) - center;
            if (-half_extent..=half_extent).contains(&diff.x)
                && (-half_extent..=half_extent).contains(&diff.y)
                && (-half_extent..=half_extent).contains(&diff.z)
            {
                closest = dist;
            }
        }
    }
    closest
}

fn cube_normal(center: Point3, half_extent: f64, point: Point3) -> Vec3 {
    let diff = point - center;
    let mut best = Vec3::zero();
    let mut max_dot = f64::MIN;
    for offset in cube_face_offsets(half_extent) {
        let dot = offset.dot(diff);
        if dot > max_dot {
            max_dot = dot;
            best = offset;
        }
    }
    best
}

/// Finds the shape of minimum intersection parameter `t > `[`T_EPSILON`],
/// mirroring the shared closest-hit query used by both the photon tracer
/// and the radiance estimator.
pub fn closest_intersection<'a>(shapes: &'a [Shape], ray: &Ray) -> Option<(&'a Shape, f64)> {
    let mut best: Option<(&Shape, f64)> = None;
    for shape in shapes {
        let t = shape.intersect(ray);
        if t > T_EPSILON && best.map_or(true, |(_, best_t)| t < best_t) {
            best = Some((shape, t));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diffuse_sphere(center: Point3, radius: f64) -> Shape {
        Shape::Sphere {
            center,
            radius,
            albedo: Color::ones(),
            emission: Color::zero(),
            material: Material::Diffuse,
        }
    }

    #[test]
    fn sphere_intersect_matches_distance_to_center_minus_radius() {
        let sphere = diffuse_sphere(Point3::new(0.0, 0.0, 5.0), 1.0);
        let ray = Ray::new(Point3::zero(), Vec3::unit_z());
        let t = sphere.intersect(&ray);
        assert!((t - 4.0).abs() < 1e-9);
    }

    #[test]
    fn intersect_is_infinite_or_strictly_positive() {
        let sphere = diffuse_sphere(Point3::new(0.0, 0.0, 5.0), 1.0);
        let miss = Ray::new(Point3::zero(), Vec3::unit_x());
        let t = sphere.intersect(&miss);
        assert!(t.is_infinite() || t > 1e-15);

        let hit = Ray::new(Point3::zero(), Vec3::unit_z());
        let t = sphere.intersect(&hit);
        assert!(t.is_infinite() || t > 1e-15);
    }

    #[test]
    fn plane_orthogonal_direction_misses() {
        let plane = Shape::Plane {
            point: Point3::zero(),
            normal: Vec3::unit_y(),
            albedo: Color::ones(),
            emission: Color::zero(),
            material: Material::Diffuse,
        };
        let ray = Ray::new(Point3::new(0.0, 1.0, 0.0), Vec3::unit_x());
        assert!(plane.intersect(&ray).is_infinite());
    }

    #[test]
    fn cube_face_normal_points_outward() {
        let cube = Shape::Cube {
            center: Point3::zero(),
            half_extent: 1.0,
            albedo: Color::ones(),
            emission: Color::zero(),
            material: Material::Diffuse,
        };
        let point = Point3::new(1.0, 0.2, -0.3);
        let n = cube.normal(point).normalized();
        assert!((n - Vec3::unit_x()).length() < 1e-9);
    }

    #[test]
    fn closest_intersection_picks_nearest_shape() {
        let shapes = vec![
            diffuse_sphere(Point3::new(0.0, 0.0, 10.0), 1.0),
            diffuse_sphere(Point3::new(0.0, 0.0, 3.0), 1.0),
        ];
        let ray = Ray::new(Point3::zero(), Vec3::unit_z());
        let (_, t) = closest_intersection(&shapes, &ray).unwrap();
        assert!((t - 2.0).abs() < 1e-9);
    }

    #[test]
    fn sphere_emission_point_lies_on_its_own_surface() {
        let sphere = diffuse_sphere(Point3::new(1.0, 2.0, 3.0), 0.5);
        let direction = Vec3::new(0.3, -0.6, 0.74).normalized();
        let p = sphere.emission_point(direction);
        let Shape::Sphere { center, radius, .. } = sphere else {
            unreachable!()
        };
        assert!(((p - center).length() - radius).abs() < 1e-9);
    }

    #[test]
    fn cube_emission_point_lies_on_its_own_boundary() {
        let cube = Shape::Cube {
            center: Point3::zero(),
            half_extent: 2.0,
            albedo: Color::ones(),
            emission: Color::ones(),
            material: Material::Diffuse,
        };
        let direction = Vec3::new(0.2, 0.9, -0.4).normalized();
        let p = cube.emission_point(direction);
        assert!(p.x.abs() <= 2.0 + 1e-9 && p.y.abs() <= 2.0 + 1e-9 && p.z.abs() <= 2.0 + 1e-9);
        let on_boundary =
            (p.x.abs() - 2.0).abs() < 1e-9 || (p.y.abs() - 2.0).abs() < 1e-9 || (p.z.abs() - 2.0).abs() < 1e-9;
        assert!(on_boundary);
    }
}
