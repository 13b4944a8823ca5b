//! Brush shapes for sculpting
//!
//! Primitives are centered at the origin; `VoxelWorld::apply_sdf` places
//! them with a position and rotation.

pub mod custom;
pub mod primitive;

// Re-exports
pub use custom::{CsgOp, CustomBrush};
pub use primitive::BrushPrimitive;
