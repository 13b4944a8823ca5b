use std::collections::HashSet;

use crate::core::Result;
use crate::voxel::chunk::{ChunkPos, VoxelChunk};
use crate::voxel::indexer::Indexer;
use crate::voxel::world::VoxelWorld;

use super::EditConsumer;

/// State of one chunk position before an edit
#[derive(Debug)]
pub enum ChunkSnapshot<I: Indexer> {
    /// Full copy of an existing chunk
    Chunk(VoxelChunk<I>),
    /// No chunk existed here yet; restoring empties it
    Vacant(ChunkPos),
}

impl<I: Indexer> ChunkSnapshot<I> {
    pub fn pos(&self) -> ChunkPos {
        match self {
            ChunkSnapshot::Chunk(chunk) => chunk.pos(),
            ChunkSnapshot::Vacant(pos) => *pos,
        }
    }

    /// Heap bytes held by the copy
    pub fn byte_size(&self) -> usize {
        match self {
            ChunkSnapshot::Chunk(chunk) => chunk.voxels().as_bytes().len(),
            ChunkSnapshot::Vacant(_) => 0,
        }
    }
}

/// Chunk snapshots taken right before one mutation (or a merged burst).
///
/// Snapshots are owned exclusively and freed on drop. Merging consumes the
/// source edits, so a snapshot can never be restored or freed twice.
#[derive(Debug)]
pub struct VoxelEdit<I: Indexer> {
    snapshots: Vec<ChunkSnapshot<I>>,
}

impl<I: Indexer> VoxelEdit<I> {
    pub fn new(snapshots: Vec<ChunkSnapshot<I>>) -> Self {
        Self { snapshots }
    }

    /// Concatenate edits, oldest first. Where positions repeat, the oldest
    /// snapshot wins on restore.
    pub fn merge(edits: impl IntoIterator<Item = VoxelEdit<I>>) -> Self {
        Self {
            snapshots: edits.into_iter().flat_map(|edit| edit.snapshots).collect(),
        }
    }

    pub fn snapshots(&self) -> &[ChunkSnapshot<I>] {
        &self.snapshots
    }

    /// Positions covered, in snapshot order, without repeats
    pub fn positions(&self) -> Vec<ChunkPos> {
        let mut seen = HashSet::new();
        self.snapshots
            .iter()
            .map(ChunkSnapshot::pos)
            .filter(|pos| seen.insert(*pos))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn byte_size(&self) -> usize {
        self.snapshots.iter().map(ChunkSnapshot::byte_size).sum()
    }

    /// Add every covered position to `set`
    pub fn ignore_chunks(&self, set: &mut HashSet<ChunkPos>) {
        set.extend(self.snapshots.iter().map(ChunkSnapshot::pos));
    }

    /// Write the snapshots back into `world`. With a consumer, the state
    /// about to be overwritten is captured into it first.
    pub fn restore(&self, world: &mut VoxelWorld<I>, consumer: Option<&mut dyn EditConsumer<I>>) -> Result<()> {
        if let Some(consumer) = consumer {
            world.capture(&self.positions(), consumer);
        }
        world.restore_snapshots(&self.snapshots)
    }
}
