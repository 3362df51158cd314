//! # Core Types
//!
//! Vectors and the particle record the smearing kernels operate on.

use std::fmt;

// ============================================================================
// VECTOR TYPES (3D)
// ============================================================================

/// 3D vector for positions and directions
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Create new vector
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Unit vectors
    pub const fn unit_x() -> Self { Self::new(1.0, 0.0, 0.0) }
    pub const fn unit_y() -> Self { Self::new(0.0, 1.0, 0.0) }
    pub const fn unit_z() -> Self { Self::new(0.0, 0.0, 1.0) }

    /// Build from a `[x, y, z]` array
    pub const fn from_array(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Magnitude squared
    pub fn mag_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Magnitude
    pub fn mag(&self) -> f64 {
        self.mag_squared().sqrt()
    }

    /// Normalize to unit vector
    pub fn normalize(&self) -> Self {
        let m = self.mag();
        if m > 1e-15 {
            Self::new(self.x / m, self.y / m, self.z / m)
        } else {
            Self::zero()
        }
    }

    /// Dot product
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Scale by scalar
    pub fn scale(&self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Rotate by a rotation vector (axis × angle in radians)
    ///
    /// Rodrigues' formula. `inverse` rotates by the opposite angle.
    pub fn rotated(&self, rotvec: &Vec3, inverse: bool) -> Self {
        let angle = rotvec.mag();
        if angle == 0.0 {
            return *self;
        }
        let k = rotvec.scale(1.0 / angle);
        let angle = if inverse { -angle } else { angle };
        let (sin, cos) = angle.sin_cos();

        self.scale(cos) + k.cross(self).scale(sin) + k.scale(k.dot(self) * (1.0 - cos))
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl std::ops::SubAssign for Vec3 {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
        self.z -= other.z;
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Self::from_array(v)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6e}, {:.6e}, {:.6e})", self.x, self.y, self.z)
    }
}

// ============================================================================
// PARTICLE RECORD
// ============================================================================

/// Phase-space record of a single particle from a particle list
///
/// Only the three fields the kernels read and write are carried here;
/// the surrounding list format owns everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Position (cm)
    pub position: Vec3,
    /// Unit direction of flight
    pub direction: Vec3,
    /// Kinetic energy (MeV)
    pub ekin: f64,
}

impl Particle {
    /// Create new particle; the direction is stored as given
    pub fn new(position: Vec3, direction: Vec3, ekin: f64) -> Self {
        Self {
            position,
            direction,
            ekin,
        }
    }
}

impl fmt::Display for Particle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E={:.6e} MeV pos={} dir={}", self.ekin, self.position, self.direction)
    }
}
