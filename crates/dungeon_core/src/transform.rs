//! Package placement transform
//!
//! A package is pasted at an anchor point and a yaw. Content offsets are
//! stored in the unrotated template frame and moved into world space here.

use dungeon_math::{Vec3, Yaw};

/// Rotate `offset` by `rotation`, then translate by `anchor`
#[inline]
pub fn to_absolute(anchor: Vec3, rotation: Yaw, offset: Vec3) -> Vec3 {
    rotation.rotate(offset) + anchor
}

/// Undo [`to_absolute`]: subtract `anchor`, then rotate by `-rotation`
#[inline]
pub fn to_relative(anchor: Vec3, rotation: Yaw, world: Vec3) -> Vec3 {
    rotation.reverse().rotate(world - anchor)
}

/// Where and at what yaw a package sits in the world
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PackageTransform {
    /// World-space origin of the template
    pub anchor: Vec3,
    /// Yaw applied when the structure was pasted
    pub rotation: Yaw,
}

impl PackageTransform {
    pub fn new(anchor: Vec3, rotation: Yaw) -> Self {
        Self { anchor, rotation }
    }

    /// Anchor only, no rotation
    pub fn from_anchor(anchor: Vec3) -> Self {
        Self::new(anchor, Yaw::IDENTITY)
    }

    /// Template offset to world location
    pub fn to_absolute(&self, offset: Vec3) -> Vec3 {
        to_absolute(self.anchor, self.rotation, offset)
    }

    /// World location to template offset
    pub fn to_relative(&self, world: Vec3) -> Vec3 {
        to_relative(self.anchor, self.rotation, world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_anchor_only() {
        let t = PackageTransform::from_anchor(Vec3::new(100.0, 64.0, -20.0));
        assert_eq!(t.to_absolute(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(101.0, 66.0, -17.0));
        assert_eq!(t.to_relative(Vec3::new(101.0, 66.0, -17.0)), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_rotation_applied_before_translation() {
        // +X offset, quarter turn, then anchor: (0, 0, -1) + (10, 0, 0)
        let t = PackageTransform::new(Vec3::new(10.0, 0.0, 0.0), Yaw::from_degrees(90.0));
        let world = t.to_absolute(Vec3::X);
        assert!(world.approx_eq(Vec3::new(10.0, 0.0, -1.0), EPSILON), "got {:?}", world);
    }

    #[test]
    fn test_inverse_law() {
        let anchors = [
            Vec3::ZERO,
            Vec3::new(100.0, 64.0, -250.0),
            Vec3::new(-3.5, 12.25, 7.75),
        ];
        let points = [
            Vec3::ZERO,
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-1000.0, 5.0, 999.5),
        ];

        for anchor in anchors {
            for degrees in (-360..=360).step_by(15) {
                let rotation = Yaw::from_degrees(degrees as f64);
                for p in points {
                    let relative = to_relative(anchor, rotation, p);
                    let back = to_absolute(anchor, rotation, relative);
                    assert!(
                        back.approx_eq(p, 1e-6),
                        "anchor {:?} angle {} point {:?} came back as {:?}",
                        anchor, degrees, p, back
                    );
                }
            }
        }
    }

    #[test]
    fn test_relative_then_absolute_matches_offset() {
        let t = PackageTransform::new(Vec3::new(5.0, 70.0, 5.0), Yaw::from_degrees(-135.0));
        let offset = Vec3::new(4.0, -1.0, 9.0);
        let back = t.to_relative(t.to_absolute(offset));
        assert!(back.approx_eq(offset, 1e-9), "got {:?}", back);
    }

    #[test]
    fn test_default_is_identity() {
        let t = PackageTransform::default();
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(t.to_absolute(p), p);
        assert_eq!(t.to_relative(p), p);
    }
}
