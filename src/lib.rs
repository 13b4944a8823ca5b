//! Sculptr - chunked voxel field with SDF sculpting and undo/redo

pub mod core;
pub mod math;
pub mod voxel;
