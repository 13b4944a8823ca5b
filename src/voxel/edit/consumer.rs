use crate::voxel::chunk::ChunkPos;
use crate::voxel::indexer::Indexer;

use super::VoxelEdit;

/// Receives the "before" edits captured by world mutations
pub trait EditConsumer<I: Indexer> {
    fn consume(&mut self, edit: VoxelEdit<I>);

    /// Chunks for which a snapshot is already held and must not be retaken
    fn ignore_chunk(&self, _pos: ChunkPos) -> bool {
        false
    }
}

/// Collects every captured edit in order
impl<I: Indexer> EditConsumer<I> for Vec<VoxelEdit<I>> {
    fn consume(&mut self, edit: VoxelEdit<I>) {
        self.push(edit);
    }
}
