//! Rotation about the vertical axis
//!
//! Structures are pasted at a yaw: a single angle in the XZ plane.
//! Positive angles follow the right-hand rule about +Y, taking +X towards -Z.

use serde::{Deserialize, Serialize};

/// A rotation about the Y axis, stored in radians
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Yaw {
    radians: f64,
}

impl Yaw {
    /// No rotation
    pub const IDENTITY: Self = Self { radians: 0.0 };

    /// Create a yaw from radians
    #[inline]
    pub const fn from_radians(radians: f64) -> Self {
        Self { radians }
    }

    /// Create a yaw from degrees
    #[inline]
    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_radians(degrees.to_radians())
    }

    /// Angle in radians
    #[inline]
    pub fn radians(self) -> f64 {
        self.radians
    }

    /// Angle in degrees
    #[inline]
    pub fn degrees(self) -> f64 {
        self.radians.to_degrees()
    }

    /// The rotation that undoes this one
    #[inline]
    pub fn reverse(self) -> Self {
        Self::from_radians(-self.radians)
    }

    /// Rotate a vector about the Y axis
    ///
    /// The vertical component is left untouched.
    pub fn rotate(self, v: crate::Vec3) -> crate::Vec3 {
        let (sin, cos) = self.radians.sin_cos();
        crate::Vec3::new(cos * v.x + sin * v.z, v.y, -sin * v.x + cos * v.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec3;
    use std::f64::consts::PI;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_identity_rotation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Yaw::IDENTITY.rotate(v), v);
    }

    #[test]
    fn test_quarter_turn() {
        // +X goes to -Z under a quarter turn about +Y
        let rotated = Yaw::from_radians(PI / 2.0).rotate(Vec3::X);
        assert!(rotated.approx_eq(-Vec3::Z, EPSILON), "got {:?}", rotated);

        let rotated = Yaw::from_radians(PI / 2.0).rotate(Vec3::Z);
        assert!(rotated.approx_eq(Vec3::X, EPSILON), "got {:?}", rotated);
    }

    #[test]
    fn test_vertical_component_preserved() {
        let v = Vec3::new(4.0, 9.0, -2.0);
        let rotated = Yaw::from_degrees(37.0).rotate(v);
        assert_eq!(rotated.y, 9.0);
        let horizontal = |p: Vec3| (p.x * p.x + p.z * p.z).sqrt();
        assert!((horizontal(rotated) - horizontal(v)).abs() < EPSILON);
    }

    #[test]
    fn test_reverse_undoes_rotation() {
        let yaw = Yaw::from_degrees(123.0);
        let v = Vec3::new(1.0, 2.0, 3.0);
        let back = yaw.reverse().rotate(yaw.rotate(v));
        assert!(back.approx_eq(v, EPSILON), "got {:?}", back);
    }

    #[test]
    fn test_degrees_conversion() {
        let yaw = Yaw::from_degrees(180.0);
        assert!((yaw.radians() - PI).abs() < EPSILON);
        assert!((yaw.degrees() - 180.0).abs() < EPSILON);
    }
}
