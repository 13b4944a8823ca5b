//! Snapshot-based undo/redo.
//!
//! Before a world mutation, the affected chunks are copied into a
//! [`VoxelEdit`] and handed to an [`EditConsumer`]. Restoring an edit writes
//! those copies back; [`VoxelEditManager`] keeps them in bounded undo and
//! redo stacks and can coalesce a burst of edits into one.

pub mod consumer;
pub mod manager;
pub mod voxel_edit;

pub use consumer::EditConsumer;
pub use manager::VoxelEditManager;
pub use voxel_edit::{ChunkSnapshot, VoxelEdit};
