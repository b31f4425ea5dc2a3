use rand::Rng;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, Mul, MulAssign, Neg, Sub};

/// A 3-component vector used for positions, directions, and colors throughout
/// the renderer. Implements standard arithmetic via operator overloading plus
/// the geometric utilities (dot, cross, reflection, refraction) needed by the
/// intersection routines and the Monte Carlo estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

pub type Point3 = Vec3;
pub type Color = Vec3;

impl Vec3 {
    #[inline(always)]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline(always)]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline(always)]
    pub const fn ones() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    #[inline(always)]
    pub const fn unit_x() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    #[inline(always)]
    pub const fn unit_y() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    #[inline(always)]
    pub const fn unit_z() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    #[inline(always)]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline(always)]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    #[inline(always)]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Unit vector in the same direction. Uses the platform reciprocal
    /// sqrt (`1/len.sqrt()`) rather than a bit-cast Newton approximation —
    /// see [`Vec3::fast_normalized`] if bit-level parity with the original
    /// fast-inverse-square-root implementation is ever required.
    #[inline(always)]
    pub fn normalized(self) -> Self {
        self / self.length()
    }

    /// Quake-style fast inverse square root normalize: bit-cast Newton
    /// iteration against the magic constant `0x5fe6eb50c7b537a9`, three
    /// refinement steps. Kept only for parity testing against
    /// [`Vec3::normalized`] (see `tests::fast_normalize_matches_reference`);
    /// the renderer itself always calls `normalized`.
    pub fn fast_normalized(self) -> Self {
        const MAGIC: u64 = 0x5fe6eb50c7b537a9;
        const ITERATIONS: u32 = 3;

        let mut y = self.length_squared();
        let x2 = y / 2.0;
        let i = MAGIC - (y.to_bits() >> 1);
        y = f64::from_bits(i);
        for _ in 0..ITERATIONS {
            y *= 1.5 - (x2 * y * y);
        }
        self * y
    }

    #[inline(always)]
    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline(always)]
    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Specular reflection of `self` about the surface normal `n`.
    #[inline(always)]
    pub fn reflect(self, normal: Self) -> Self {
        self - normal * 2.0 * self.dot(normal)
    }

    /// Snell's law refraction across an interface with relative index
    /// `eta_ratio = n_incident / n_transmitted`. Returns `None` on total
    /// internal reflection (negative discriminant).
    #[inline]
    pub fn refract(self, normal: Self, eta_ratio: f64) -> Option<Self> {
        let cos_theta = (-self).dot(normal).min(1.0);
        let r_perp = (self + normal * cos_theta) * eta_ratio;
        let discriminant = 1.0 - r_perp.length_squared();
        if discriminant < 0.0 {
            return None;
        }
        let r_parallel = normal * -(discriminant.sqrt());
        Some(r_perp + r_parallel)
    }

    /// Component-wise (Hadamard) product, used to attenuate radiance by
    /// surface albedo at every bounce.
    #[inline(always)]
    pub fn hadamard(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }

    #[inline(always)]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self * (1.0 - t) + other * t
    }

    /// Clamps each component to [0, 1] for the direct-light framebuffer.
    #[inline(always)]
    pub fn clamp01(self) -> Self {
        Self::new(
            self.x.clamp(0.0, 1.0),
            self.y.clamp(0.0, 1.0),
            self.z.clamp(0.0, 1.0),
        )
    }

    /// Clamps each component to [0, 255] after gamma correction.
    #[inline(always)]
    pub fn clamp255(self) -> Self {
        Self::new(
            self.x.clamp(0.0, 255.0),
            self.y.clamp(0.0, 255.0),
            self.z.clamp(0.0, 255.0),
        )
    }

    /// Per-component `max(0, v - k)` — separates the high-intensity
    /// "peaks" residual fed into the bloom filter.
    #[inline(always)]
    pub fn peaks(self, k: f64) -> Self {
        Self::new(
            (self.x - k).max(0.0),
            (self.y - k).max(0.0),
            (self.z - k).max(0.0),
        )
    }

    /// Snaps components within `epsilon` of zero to exactly zero, avoiding
    /// long tails of near-imperceptible floating point noise.
    #[inline(always)]
    pub fn quantize_epsilon(self, epsilon: f64) -> Self {
        fn adjust(epsilon: f64, v: f64) -> f64 {
            if v.abs() < epsilon {
                0.0
            } else {
                v
            }
        }
        Self::new(
            adjust(epsilon, self.x),
            adjust(epsilon, self.y),
            adjust(epsilon, self.z),
        )
    }

    /// Uniformly distributed random direction on the unit sphere, used to
    /// emit photons in all directions from a light-emitting surface.
    pub fn random_unit_sphere(rng: &mut dyn rand::RngCore) -> Self {
        loop {
            let v = Self::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            let len_sq = v.length_squared();
            if len_sq > 1e-12 && len_sq < 1.0 {
                return v.normalized();
            }
        }
    }

    /// Cosine-weighted direction in the hemisphere about unit normal `n` —
    /// the importance-sampling distribution for a Lambertian indirect
    /// bounce in the radiance estimator.
    pub fn random_cosine_hemisphere(n: Self, rng: &mut dyn rand::RngCore) -> Self {
        let u1: f64 = rng.gen();
        let u2: f64 = rng.gen();
        let r = u1.sqrt();
        let theta = 2.0 * std::f64::consts::PI * u2;
        let x = r * theta.cos();
        let y = r * theta.sin();
        let z = (1.0 - u1).max(0.0).sqrt();

        let (t, b) = n.orthonormal_basis();
        (t * x + b * y + n * z).normalized()
    }

    /// Builds an arbitrary orthonormal basis (tangent, bitangent) around
    /// `self`, which must already be a unit vector.
    pub fn orthonormal_basis(self) -> (Self, Self) {
        let a = if self.x.abs() > 0.9 {
            Self::unit_y()
        } else {
            Self::unit_x()
        };
        let t = a.cross(self).normalized();
        let b = self.cross(t);
        (t, b)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, t: f64) -> Self {
        Self::new(self.x * t, self.y * t, self.z * t)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;
    #[inline(always)]
    fn mul(self, v: Vec3) -> Vec3 {
        v * self
    }
}

impl MulAssign<f64> for Vec3 {
    #[inline(always)]
    fn mul_assign(&mut self, t: f64) {
        self.x *= t;
        self.y *= t;
        self.z *= t;
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn div(self, t: f64) -> Self {
        let inv = 1.0 / t;
        Self::new(self.x * inv, self.y * inv, self.z * inv)
    }
}

impl DivAssign<f64> for Vec3 {
    #[inline(always)]
    fn div_assign(&mut self, t: f64) {
        let inv = 1.0 / t;
        self.x *= inv;
        self.y *= inv;
        self.z *= inv;
    }
}

impl Index<usize> for Vec3 {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index out of bounds: {i}"),
        }
    }
}

// ─── Ray ────────────────────────────────────────────────────────────────────

/// A parametric ray R(t) = origin + t * direction. Direction is unit length
/// by construction at every call site that builds a `Ray`.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vec3,
}

impl Ray {
    #[inline(always)]
    pub const fn new(origin: Point3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    #[inline(always)]
    pub fn at(self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }
}

/// Rodrigues' rotation formula: rotates `vec` by `angle` radians about
/// `axis` (assumed unit length).
pub fn rotate_vector(angle: f64, axis: Vec3, vec: Vec3) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    let cross = axis.cross(vec);
    let dot = axis.dot(vec);
    vec * cos + cross * sin + axis * dot * (1.0 - cos)
}

/// Applies roll (about Z), then pitch (about X), then yaw (about Y) — the
/// fixed rotation order the sampling driver uses to orient primary rays.
pub fn rotate_roll_pitch_yaw(vec: Vec3, roll: f64, pitch: f64, yaw: f64) -> Vec3 {
    let v = rotate_vector(roll, Vec3::unit_z(), vec);
    let v = rotate_vector(pitch, Vec3::unit_x(), v);
    rotate_vector(yaw, Vec3::unit_y(), v)
}
