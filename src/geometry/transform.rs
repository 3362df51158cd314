//! Rigid placement of a source frame in the global frame.

use crate::types::{Particle, Vec3};

/// Translation and rotation locating a local frame in the global one
///
/// The rotation is a rotation vector (axis × angle in radians). A global
/// position maps to the local frame by removing the translation and then
/// undoing the rotation; directions only undo the rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RigidTransform {
    pub translation: Option<Vec3>,
    pub rotation: Option<Vec3>,
}

impl RigidTransform {
    pub fn new(translation: Option<Vec3>, rotation: Option<Vec3>) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Global → local, in place
    pub fn to_local(&self, part: &mut Particle) {
        if let Some(t) = self.translation {
            part.position -= t;
        }
        if let Some(r) = self.rotation {
            part.position = part.position.rotated(&r, true);
            part.direction = part.direction.rotated(&r, true);
        }
    }

    /// Local → global, in place; exact inverse of [`RigidTransform::to_local`]
    pub fn to_global(&self, part: &mut Particle) {
        if let Some(r) = self.rotation {
            part.position = part.position.rotated(&r, false);
            part.direction = part.direction.rotated(&r, false);
        }
        if let Some(t) = self.translation {
            part.position += t;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_local_global_roundtrip() {
        let tr = RigidTransform::new(Some(Vec3::new(1.0, -2.0, 3.0)), Some(Vec3::new(0.3, 0.2, -0.5)));
        let orig = Particle::new(Vec3::new(4.0, 5.0, 6.0), Vec3::new(0.0, 0.6, 0.8), 1.0);
        let mut p = orig;
        tr.to_local(&mut p);
        tr.to_global(&mut p);
        assert!((p.position - orig.position).mag() < 1e-12);
        assert!((p.direction - orig.direction).mag() < 1e-12);
    }

    #[test]
    fn test_local_frame() {
        // Source frame shifted along x and turned a quarter around z
        let tr = RigidTransform::new(Some(Vec3::unit_x()), Some(Vec3::new(0.0, 0.0, PI / 2.0)));
        let mut p = Particle::new(Vec3::new(1.0, 1.0, 0.0), Vec3::unit_y(), 1.0);
        tr.to_local(&mut p);
        assert!((p.position - Vec3::unit_x()).mag() < 1e-12);
        assert!((p.direction - Vec3::unit_x()).mag() < 1e-12);
    }
}
