//! 3D Vector type and its `"x,y,z"` text codec

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 3D Vector with x, y, z components
/// The y component is the vertical axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const X: Self = Self { x: 1.0, y: 0.0, z: 0.0 };
    pub const Y: Self = Self { x: 0.0, y: 1.0, z: 0.0 };
    pub const Z: Self = Self { x: 0.0, y: 0.0, z: 1.0 };

    /// Create a new Vec3
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create from an `[x, y, z]` array
    #[inline]
    pub const fn from_array(a: [f64; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    /// True if every component differs from `other` by at most `tolerance`
    #[inline]
    pub fn approx_eq(self, other: Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }
}

// Operator overloads

impl std::ops::Add for Vec3 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
        self.z -= other.z;
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// Text codec

/// Error decoding a vector from its `"x,y,z"` text form
#[derive(Debug, Clone, PartialEq)]
pub enum VectorParseError {
    /// Token did not split into exactly three comma-separated fields
    FieldCount(usize),
    /// A field was not a valid real number
    InvalidNumber(String),
}

impl fmt::Display for VectorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorParseError::FieldCount(n) => {
                write!(f, "expected 3 comma-separated fields, found {}", n)
            }
            VectorParseError::InvalidNumber(field) => {
                write!(f, "'{}' is not a number", field)
            }
        }
    }
}

impl std::error::Error for VectorParseError {}

impl FromStr for Vec3 {
    type Err = VectorParseError;

    /// Parse `"x,y,z"`; whitespace around each field is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').collect();
        if fields.len() != 3 {
            return Err(VectorParseError::FieldCount(fields.len()));
        }

        let mut values = [0.0f64; 3];
        for (value, field) in values.iter_mut().zip(&fields) {
            let field = field.trim();
            *value = field
                .parse::<f64>()
                .map_err(|_| VectorParseError::InvalidNumber(field.to_string()))?;
            if !value.is_finite() {
                return Err(VectorParseError::InvalidNumber(field.to_string()));
            }
        }

        Ok(Self::from_array(values))
    }
}

impl fmt::Display for Vec3 {
    /// Writes `"x,y,z"` using the shortest representation that parses back exactly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_add_sub() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(5.0, 6.0, 7.0);
        assert_eq!(a + b, Vec3::new(6.0, 8.0, 10.0));
        assert_eq!(b - a, Vec3::new(4.0, 4.0, 4.0));
    }

    #[test]
    fn test_neg_and_scale() {
        let v = Vec3::new(1.0, -2.0, 3.0);
        assert_eq!(-v, Vec3::new(-1.0, 2.0, -3.0));
        assert_eq!(v * 2.0, Vec3::new(2.0, -4.0, 6.0));
    }

    #[test]
    fn test_parse_well_formed() {
        let v: Vec3 = "1.5,-2,30.25".parse().unwrap();
        assert_eq!(v, Vec3::new(1.5, -2.0, 30.25));
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let v: Vec3 = " 1 , 2 ,3 ".parse().unwrap();
        assert_eq!(v, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_parse_wrong_field_count() {
        assert_eq!("1,2".parse::<Vec3>(), Err(VectorParseError::FieldCount(2)));
        assert_eq!("1,2,3,4".parse::<Vec3>(), Err(VectorParseError::FieldCount(4)));
        assert_eq!("".parse::<Vec3>(), Err(VectorParseError::FieldCount(1)));
        assert_eq!("1,,3".parse::<Vec3>(), Err(VectorParseError::InvalidNumber(String::new())));
    }

    #[test]
    fn test_parse_non_numeric() {
        let err = "1,two,3".parse::<Vec3>().unwrap_err();
        assert_eq!(err, VectorParseError::InvalidNumber("two".to_string()));
        assert!(err.to_string().contains("two"));
    }

    #[test]
    fn test_parse_rejects_non_finite() {
        assert!("NaN,0,0".parse::<Vec3>().is_err());
        assert!("0,inf,0".parse::<Vec3>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        let v = Vec3::new(0.1, -1234.5678, 1e-7);
        let back: Vec3 = v.to_string().parse().unwrap();
        assert_eq!(v, back);
    }

    #[test]
    fn test_display_integers() {
        assert_eq!(Vec3::new(1.0, 2.0, -3.0).to_string(), "1,2,-3");
    }
}
