//! Placement mathematics for dungeon packages
//!
//! This crate provides the small amount of linear algebra needed to move
//! content between a package's template frame and world space.
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector with x, y, z components (y is vertical)
//! - [`Yaw`] - Rotation about the vertical axis
//! - [`VectorParseError`] - Failure decoding an `"x,y,z"` token

mod vec3;
mod yaw;

pub use vec3::{Vec3, VectorParseError};
pub use yaw::Yaw;
