//! Orientation and position helpers
//!
//! Samples carry orientation as a plain `{w, x, y, z}` record so the wire format
//! stays independent of the math library. Computation happens on
//! [`nalgebra::UnitQuaternion`] through the SO(3) log map.

use nalgebra::{Quaternion as NaQuaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Position in metres, device frame
pub type Vec3 = [f64; 3];

/// Smallest quaternion norm accepted as a rotation
const MIN_QUATERNION_NORM: f64 = 1e-9;

/// Head orientation quaternion as produced by the sample extractor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Build an orientation from yaw/pitch/roll in degrees (Z-Y-X convention)
    pub fn from_euler_deg(yaw: f64, pitch: f64, roll: f64) -> Self {
        let q = UnitQuaternion::from_euler_angles(
            roll.to_radians(),
            pitch.to_radians(),
            yaw.to_radians(),
        );
        Self::from(q)
    }

    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Normalize into a unit quaternion.
    ///
    /// Returns `None` for non-finite components or a (near) zero norm, which the
    /// session builder treats as a malformed sample.
    pub fn to_unit(&self) -> Option<UnitQuaternion<f64>> {
        if !self.is_finite() {
            return None;
        }
        UnitQuaternion::try_new(
            NaQuaternion::new(self.w, self.x, self.y, self.z),
            MIN_QUATERNION_NORM,
        )
    }
}

impl From<UnitQuaternion<f64>> for Quaternion {
    fn from(q: UnitQuaternion<f64>) -> Self {
        Self {
            w: q.w,
            x: q.i,
            y: q.j,
            z: q.k,
        }
    }
}

/// Rotation vector (axis * angle, radians) taking `from` onto `to`.
///
/// The log map picks the shortest rotation, so `q` and `-q` are treated as the
/// same orientation.
pub fn relative_rotation(from: &UnitQuaternion<f64>, to: &UnitQuaternion<f64>) -> Vector3<f64> {
    (from.inverse() * to).scaled_axis()
}

pub fn is_finite_vec3(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Euclidean distance between two positions
pub fn distance(a: &Vec3, b: &Vec3) -> f64 {
    (Vector3::from(*b) - Vector3::from(*a)).norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_relative_rotation_is_zero() {
        let q = Quaternion::IDENTITY.to_unit().unwrap();
        assert!(relative_rotation(&q, &q).norm() < 1e-12);
    }

    #[test]
    fn test_yaw_step_angle() {
        let a = Quaternion::from_euler_deg(0.0, 0.0, 0.0).to_unit().unwrap();
        let b = Quaternion::from_euler_deg(10.0, 0.0, 0.0).to_unit().unwrap();
        let r = relative_rotation(&a, &b);
        assert!((r.norm().to_degrees() - 10.0).abs() < 1e-9);
        assert!((r.z.to_degrees() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_double_cover_is_same_orientation() {
        let a = Quaternion::new(0.9, 0.1, 0.2, 0.3).to_unit().unwrap();
        let b = Quaternion::new(-0.9, -0.1, -0.2, -0.3).to_unit().unwrap();
        assert!(relative_rotation(&a, &b).norm() < 1e-9);
    }

    #[test]
    fn test_malformed_quaternions_rejected() {
        assert!(Quaternion::new(0.0, 0.0, 0.0, 0.0).to_unit().is_none());
        assert!(Quaternion::new(f64::NAN, 0.0, 0.0, 1.0).to_unit().is_none());
        assert!(Quaternion::new(2.0, 0.0, 0.0, 0.0).to_unit().is_some());
    }

    #[test]
    fn test_distance() {
        assert!((distance(&[0.0, 0.0, 0.0], &[3.0, 4.0, 0.0]) - 5.0).abs() < 1e-12);
    }
}
