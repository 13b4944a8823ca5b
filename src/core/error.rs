//! Error types for voxel sculpting

use glam::{IVec3, UVec3};
use thiserror::Error;

use crate::voxel::chunk::ChunkPos;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// Padding can only be pulled from a chunk at a +X/+Y/+Z offset of the target
    #[error("chunk {neighbor:?} is not a -X/-Y/-Z neighbor of chunk {target:?}")]
    InvalidNeighbor {
        target: ChunkPos,
        neighbor: ChunkPos,
    },

    #[error("grid size mismatch: expected {expected}, got {actual}")]
    GridSize {
        expected: UVec3,
        actual: UVec3,
    },

    #[error("empty grid applied at {0}")]
    EmptyGrid(IVec3),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
