//! Bounded undo/redo journal

use std::collections::{HashSet, VecDeque};

use crate::core::Result;
use crate::voxel::chunk::ChunkPos;
use crate::voxel::config::WorldConfig;
use crate::voxel::indexer::{Indexer, MortonIndexer};
use crate::voxel::world::VoxelWorld;

use super::{EditConsumer, VoxelEdit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastOp {
    Edit,
    Undo,
    Redo,
}

/// Undo/redo stacks of [`VoxelEdit`]s.
///
/// `edits` holds at most `queue_size` entries; the oldest is dropped first.
/// Any new edit clears `undone`. While merging, consumed edits are buffered
/// and chunks they already cover are not snapshotted again, so the flushed
/// edit restores the state from before the whole burst.
///
/// After an undo, the top of `undone` mirrors the state the undo just left,
/// and after a redo the top of `edits` mirrors the live state. The first
/// redo (or undo) following the opposite operation moves that entry across
/// without restoring it.
#[derive(Debug)]
pub struct VoxelEditManager<I: Indexer = MortonIndexer> {
    queue_size: usize,
    edits: VecDeque<VoxelEdit<I>>,
    undone: Vec<VoxelEdit<I>>,
    last_op: LastOp,
    merge: bool,
    merge_edits: Vec<VoxelEdit<I>>,
    merge_queued_chunks: HashSet<ChunkPos>,
}

impl<I: Indexer> VoxelEditManager<I> {
    pub fn new(queue_size: usize) -> Self {
        Self {
            queue_size,
            edits: VecDeque::with_capacity(queue_size),
            undone: Vec::new(),
            last_op: LastOp::Edit,
            merge: false,
            merge_edits: Vec::new(),
            merge_queued_chunks: HashSet::new(),
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.undo_queue_size)
    }

    /// The consumer to pass to world mutations
    pub fn consumer(&mut self) -> &mut dyn EditConsumer<I> {
        self
    }

    pub fn queue_size(&self) -> usize {
        self.queue_size
    }

    /// Change the history bound, dropping the oldest edits if needed
    pub fn set_queue_size(&mut self, queue_size: usize) {
        self.queue_size = queue_size;
        while self.edits.len() > queue_size {
            self.edits.pop_front();
        }
    }

    pub fn undo_len(&self) -> usize {
        self.edits.len()
    }

    pub fn redo_len(&self) -> usize {
        self.undone.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.edits.is_empty() || !self.merge_edits.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn merge(&self) -> bool {
        self.merge
    }

    /// Start or end a merge session. Ending one queues everything buffered
    /// since it started as a single edit.
    pub fn set_merge(&mut self, merge: bool) {
        if self.merge && !merge {
            self.flush_merge();
        }
        self.merge = merge;
    }

    /// Drop all history
    pub fn clear(&mut self) {
        self.edits.clear();
        self.undone.clear();
        self.merge_edits.clear();
        self.merge_queued_chunks.clear();
        self.last_op = LastOp::Edit;
    }

    /// Revert the most recent edit. Returns false if there is none.
    ///
    /// An open merge session is ended first, so its buffered edits become
    /// the edit being undone.
    pub fn undo(&mut self, world: &mut VoxelWorld<I>) -> Result<bool> {
        self.set_merge(false);

        if self.last_op == LastOp::Redo && !self.undone.is_empty() && self.edits.len() >= 2 {
            if let Some(live) = self.edits.pop_back() {
                self.undone.push(live);
            }
        }

        let Some(edit) = self.edits.pop_back() else {
            return Ok(false);
        };

        // The first undo also records where a redo has to return to
        let first = self.undone.is_empty();
        let restored = if first {
            edit.restore(world, Some(&mut self.undone))
        } else {
            edit.restore(world, None)
        };
        if let Err(e) = restored {
            if first {
                self.undone.clear();
            }
            self.edits.push_back(edit);
            return Err(e);
        }

        self.undone.push(edit);
        self.last_op = LastOp::Undo;
        log::debug!("Undo: {} undoable, {} redoable", self.edits.len(), self.undone.len());
        Ok(true)
    }

    /// Re-apply the most recently undone edit. Returns false if there is none.
    ///
    /// An open merge session is ended first; if it buffered any edits they
    /// invalidate the redo history.
    pub fn redo(&mut self, world: &mut VoxelWorld<I>) -> Result<bool> {
        self.set_merge(false);
        if self.undone.is_empty() {
            return Ok(false);
        }

        if self.last_op == LastOp::Undo && self.undone.len() >= 2 {
            if let Some(current) = self.undone.pop() {
                self.edits.push_back(current);
            }
        }

        let Some(edit) = self.undone.pop() else {
            return Ok(false);
        };
        if let Err(e) = edit.restore(world, None) {
            self.undone.push(edit);
            return Err(e);
        }

        // The last entry is the state before the first undo; nothing returns to it
        if !self.undone.is_empty() {
            self.edits.push_back(edit);
        }
        self.last_op = LastOp::Redo;
        log::debug!("Redo: {} undoable, {} redoable", self.edits.len(), self.undone.len());
        Ok(true)
    }

    fn queue_edit(&mut self, edit: VoxelEdit<I>) {
        if self.queue_size == 0 {
            return;
        }
        while self.edits.len() >= self.queue_size {
            self.edits.pop_front();
        }
        self.edits.push_back(edit);
        self.undone.clear();
        self.last_op = LastOp::Edit;
    }

    fn flush_merge(&mut self) {
        self.merge_queued_chunks.clear();
        if self.merge_edits.is_empty() {
            log::trace!("Merge flush with no buffered edits");
            return;
        }
        let count = self.merge_edits.len();
        let merged = VoxelEdit::merge(std::mem::take(&mut self.merge_edits));
        log::debug!("Merged {} edits into one ({} snapshots)", count, merged.len());
        self.queue_edit(merged);
    }
}

impl<I: Indexer> EditConsumer<I> for VoxelEditManager<I> {
    fn consume(&mut self, edit: VoxelEdit<I>) {
        if self.merge {
            edit.ignore_chunks(&mut self.merge_queued_chunks);
            self.merge_edits.push(edit);
        } else {
            self.queue_edit(edit);
        }
    }

    fn ignore_chunk(&self, pos: ChunkPos) -> bool {
        self.merge && self.merge_queued_chunks.contains(&pos)
    }
}
