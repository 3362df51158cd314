//! # Neutron Guide Kernel
//!
//! Smears particles sitting on the walls of a rectangular neutron guide,
//! optionally curved in the xz plane.
//!
//! ## Guide Coordinates
//!
//! ```text
//!              +y mirror
//!          ┌───────────────┐        t runs counter-clockwise along the
//!          │╲             ╱│        unrolled perimeter, 2·(w + h) long:
//!  -x      │  ╲    ·    ╱  │  +x      +x : [0,      h]
//!  mirror  │  ╱         ╲  │  mirror  +y : [h,      h + w]
//!          │╱             ╲│          -x : [h + w,  2h + w]
//!          └───────────────┘          -y : [2h + w, 2h + 2w]
//!              -y mirror
//! ```
//!
//! A particle is described by `(z, t, θ, φ)`: arc length along the guide,
//! position on the perimeter, polar angle to the mirror normal and
//! azimuth around it. A curved guide of radius `rcurv` is first unrolled
//! into a straight one.
//!
//! ## Mirror Assignment
//!
//! With `u = y/h` and `v = x/w`, mirrors are tested in the order +x, +y,
//! -x, -y over closed quadrants:
//!
//! ```text
//! +x : -v ≤ u ≤ v
//! +y :  u ≥ v and u ≥ -v
//! -x :  v ≤ u ≤ -v
//! -y :  otherwise
//! ```
//!
//! so a point on a diagonal (or the axis) goes to the first mirror of that
//! order whose quadrant contains it.

use crate::constants::DEG_TO_RAD;
use crate::error::{Result, SmearError};
use crate::stochastic::Deviates;
use crate::types::{Particle, Vec3};

use super::kernels::{resample_polar, sigma};

/// One of the four walls of the guide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mirror {
    PosX,
    PosY,
    NegX,
    NegY,
}

impl Mirror {
    /// Sub-range of the unrolled perimeter covered by this mirror
    pub fn t_range(&self, shape: &GuideShape) -> (f64, f64) {
        let (w, h) = (shape.xwidth, shape.yheight);
        match self {
            Mirror::PosX => (0.0, h),
            Mirror::PosY => (h, h + w),
            Mirror::NegX => (h + w, 2.0 * h + w),
            Mirror::NegY => (2.0 * h + w, 2.0 * h + 2.0 * w),
        }
    }
}

/// Position and direction of a particle in guide coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideCoords {
    pub mirror: Mirror,
    /// Arc length along the guide axis (cm)
    pub z: f64,
    /// Position along the unrolled perimeter (cm)
    pub t: f64,
    /// Angle to the mirror normal (rad)
    pub theta: f64,
    /// Azimuth around the mirror normal (rad)
    pub phi: f64,
}

/// Cross-section, length and curvature of a rectangular guide
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideShape {
    /// Width along x (cm)
    pub xwidth: f64,
    /// Height along y (cm)
    pub yheight: f64,
    /// Length along the guide axis (cm)
    pub zmax: f64,
    /// Curvature radius (cm); zero for a straight guide, sign sets the bend side
    pub rcurv: f64,
}

impl GuideShape {
    pub fn new(xwidth: f64, yheight: f64, zmax: f64, rcurv: f64) -> Result<Self> {
        let shape = Self {
            xwidth,
            yheight,
            zmax,
            rcurv,
        };
        shape.validate()?;
        Ok(shape)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.xwidth > 0.0 && self.yheight > 0.0) || !self.xwidth.is_finite() || !self.yheight.is_finite() {
            return Err(SmearError::InvalidMetric(format!(
                "guide cross-section {} x {} must be positive",
                self.xwidth, self.yheight
            )));
        }
        if !(self.zmax >= 0.0) {
            return Err(SmearError::InvalidMetric(format!("guide length {} must be non-negative", self.zmax)));
        }
        if !self.rcurv.is_finite() {
            return Err(SmearError::InvalidMetric("guide curvature radius must be finite".into()));
        }
        Ok(())
    }

    /// Length of the unrolled perimeter
    pub fn perimeter(&self) -> f64 {
        2.0 * (self.xwidth + self.yheight)
    }

    pub fn is_curved(&self) -> bool {
        self.rcurv != 0.0
    }

    /// Mirror owning the transverse point `(x, y)` of a straight guide
    pub fn mirror_of(&self, x: f64, y: f64) -> Mirror {
        let u = y / self.yheight;
        let v = x / self.xwidth;
        if u >= -v && u <= v {
            Mirror::PosX
        } else if u >= v && u >= -v {
            Mirror::PosY
        } else if u <= -v && u >= v {
            Mirror::NegX
        } else {
            Mirror::NegY
        }
    }

    /// Unroll a curved guide into a straight one
    fn straighten(&self, pos: Vec3, dir: Vec3) -> (Vec3, Vec3) {
        let rc = self.rcurv;
        let r = ((rc + pos.x).powi(2) + pos.z * pos.z).sqrt();
        let x = 1f64.copysign(rc) * r - rc;
        let z = rc.abs() * (pos.z / r).asin();
        let (sin, cos) = (z / rc).sin_cos();
        let dx = dir.x * cos + dir.z * sin;
        let dz = -dir.x * sin + dir.z * cos;
        (Vec3::new(x, pos.y, z), Vec3::new(dx, dir.y, dz))
    }

    /// Inverse of [`GuideShape::straighten`]
    fn bend(&self, pos: Vec3, dir: Vec3) -> (Vec3, Vec3) {
        let rc = self.rcurv;
        let r = (rc + pos.x) * 1f64.copysign(rc);
        let ang = pos.z / rc;
        let (sin, cos) = ang.sin_cos();
        let x = 1f64.copysign(rc) * r * cos - rc;
        let z = r * ang.abs().sin();
        let dx = dir.x * cos - dir.z * sin;
        let dz = dir.x * sin + dir.z * cos;
        (Vec3::new(x, pos.y, z), Vec3::new(dx, dir.y, dz))
    }

    /// Express a particle in guide coordinates
    pub fn locate(&self, part: &Particle) -> GuideCoords {
        let (pos, dir) = if self.is_curved() {
            self.straighten(part.position, part.direction)
        } else {
            (part.position, part.direction)
        };
        let (w, h) = (self.xwidth, self.yheight);
        let acos = |c: f64| c.clamp(-1.0, 1.0).acos();

        let mirror = self.mirror_of(pos.x, pos.y);
        let (t, theta, phi) = match mirror {
            Mirror::PosX => (0.5 * h + pos.y, acos(dir.x), (-dir.y).atan2(dir.z)),
            Mirror::PosY => (h + 0.5 * w - pos.x, acos(dir.y), dir.x.atan2(dir.z)),
            Mirror::NegX => (1.5 * h + w - pos.y, acos(-dir.x), dir.y.atan2(dir.z)),
            Mirror::NegY => (2.0 * h + 1.5 * w + pos.x, acos(-dir.y), (-dir.x).atan2(dir.z)),
        };
        GuideCoords {
            mirror,
            z: pos.z,
            t,
            theta,
            phi,
        }
    }

    /// Keep `z` inside the guide and `t` on the particle's mirror
    pub fn constrain(&self, c: &mut GuideCoords) {
        if c.z < 0.0 {
            c.z = 0.0;
        } else if c.z > self.zmax {
            c.z = self.zmax;
        }
        let perimeter = self.perimeter();
        if c.t < 0.0 || c.t > perimeter {
            c.t = c.t.rem_euclid(perimeter);
        }
        let (lo, hi) = c.mirror.t_range(self);
        if c.t < lo {
            c.t = lo;
        } else if c.t > hi {
            c.t = hi;
        }
    }

    /// Position and direction of guide coordinates, in the guide frame
    pub fn place(&self, c: &GuideCoords) -> (Vec3, Vec3) {
        let (w, h) = (self.xwidth, self.yheight);
        let (sin_t, cos_t) = c.theta.sin_cos();
        let (sin_p, cos_p) = c.phi.sin_cos();
        let along = sin_t * cos_p;
        let across = sin_t * sin_p;

        let (pos, dir) = match c.mirror {
            Mirror::PosX => (
                Vec3::new(0.5 * w, c.t - 0.5 * h, c.z),
                Vec3::new(cos_t, -across, along),
            ),
            Mirror::PosY => (
                Vec3::new(-c.t + h + 0.5 * w, 0.5 * h, c.z),
                Vec3::new(across, cos_t, along),
            ),
            Mirror::NegX => (
                Vec3::new(-0.5 * w, -c.t + 1.5 * h + w, c.z),
                Vec3::new(-cos_t, across, along),
            ),
            Mirror::NegY => (
                Vec3::new(c.t - 2.0 * h - 1.5 * w, -0.5 * h, c.z),
                Vec3::new(-across, -cos_t, along),
            ),
        };
        if self.is_curved() {
            self.bend(pos, dir)
        } else {
            (pos, dir)
        }
    }
}

/// Smear `(z, t, θ, φ)` of a particle on the guide walls
///
/// `scaling` holds the kicks for z and t (cm) and for θ and φ (deg).
pub(crate) fn perturb<D: Deviates + ?Sized>(
    shape: &GuideShape,
    scaling: &[f32],
    part: &mut Particle,
    bw: f64,
    rng: &mut D,
) -> usize {
    let mut c = shape.locate(part);

    c.z += sigma(scaling, 0, bw) * rng.normal();
    c.t += sigma(scaling, 1, bw) * rng.normal();
    // Direction must stay on the same side of the mirror
    c.theta = resample_polar(c.theta, sigma(scaling, 2, bw) * DEG_TO_RAD, rng).theta;
    c.phi += sigma(scaling, 3, bw) * DEG_TO_RAD * rng.normal();

    shape.constrain(&mut c);
    let (position, direction) = shape.place(&c);
    part.position = position;
    part.direction = direction;
    0
}
