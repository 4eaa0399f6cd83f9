//! Math aliases used by the loaders
//!
//! Thin re-exports over nalgebra; colors and texture repeat/offset pairs are
//! plain vectors.

pub use nalgebra::{Vector2, Vector3};

/// 2D vector type (texture repeat and offset)
pub type Vec2 = Vector2<f32>;

/// 3D vector type (RGB color channels)
pub type Vec3 = Vector3<f32>;
