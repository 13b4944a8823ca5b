//! Sparse chunk map and the batched mutation protocol.
//!
//! Every mutating entry point runs the same strictly ordered phases:
//! snapshot (when an edit consumer is given), mutate, finalize, then padding
//! propagation. Each phase's jobs are completed as one batch before the next
//! phase starts, so no job ever reads a chunk that another job of the same
//! batch is writing.

use std::collections::{HashMap, HashSet};
use std::fmt;

use glam::{IVec3, Mat4, Quat, UVec3, Vec3};

use crate::core::{Error, Result};
use crate::math::Ray;
use crate::voxel::chunk::{Change, ChunkPos, ChunkUpdate, PADDING_NEIGHBORS, VoxelChunk};
use crate::voxel::config::WorldConfig;
use crate::voxel::edit::{ChunkSnapshot, EditConsumer, VoxelEdit};
use crate::voxel::grid::VoxelGrid;
use crate::voxel::indexer::{Indexer, MortonIndexer};
use crate::voxel::job::JobBatch;
use crate::voxel::mesh::{ChunkMesh, Mesher};
use crate::voxel::sdf::{Sdf, TransformSdf};
use crate::voxel::voxel::{EMPTY_MATERIAL, Voxel};

/// Flags for [`VoxelWorld::apply_grid`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridWrite {
    /// Mirror changed borders into -X/-Y/-Z neighbors afterwards
    pub propagate_padding: bool,
    /// Also write grid voxels that land in a chunk's padding layer
    pub include_padding: bool,
    /// Let empty grid voxels overwrite; false gives a sparse merge
    pub write_unset_voxels: bool,
}

impl Default for GridWrite {
    fn default() -> Self {
        Self {
            propagate_padding: true,
            include_padding: false,
            write_unset_voxels: true,
        }
    }
}

/// First solid cell found by [`VoxelWorld::ray_cast`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastResult {
    /// Cell whose 2x2x2 corner voxels contain material
    pub cell: IVec3,
    /// Last empty cell before `cell`, or `cell` if the ray started inside
    pub prev_cell: IVec3,
    /// Chunk owning `cell`
    pub chunk: ChunkPos,
    /// World-space distance travelled
    pub distance: f32,
}

/// Chunked voxel field.
///
/// Chunks are created the first time a mutation touches their position and
/// are never removed. All coordinates handed to mutations are world space;
/// the world transform maps them into voxel units.
pub struct VoxelWorld<I: Indexer = MortonIndexer> {
    config: WorldConfig,
    chunks: HashMap<ChunkPos, VoxelChunk<I>>,
    transform: Mat4,
    inverse_transform: Mat4,
    mesher: Box<dyn Mesher<I>>,
}

impl<I: Indexer> VoxelWorld<I> {
    pub fn new(config: WorldConfig, mesher: impl Mesher<I> + 'static) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            chunks: HashMap::new(),
            transform: Mat4::IDENTITY,
            inverse_transform: Mat4::IDENTITY,
            mesher: Box::new(mesher),
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn chunk_size(&self) -> u32 {
        self.config.chunk_size
    }

    /// Local (voxel) to world transform
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.inverse_transform = transform.inverse();
    }

    pub fn get_chunk(&self, pos: ChunkPos) -> Option<&VoxelChunk<I>> {
        self.chunks.get(&pos)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &VoxelChunk<I>> {
        self.chunks.values()
    }

    /// Voxel at a local voxel coordinate, `None` if its chunk does not exist
    pub fn voxel_at(&self, voxel: IVec3) -> Option<Voxel> {
        let cs = self.chunk_size();
        let pos = ChunkPos::from_voxel(voxel, cs);
        let local = (voxel - pos.origin(cs)).as_uvec3();
        self.chunks.get(&pos).map(|chunk| chunk.voxel(local.x, local.y, local.z))
    }

    /// Material at a local voxel coordinate, empty where no chunk exists
    pub fn material_at(&self, voxel: IVec3) -> u32 {
        self.voxel_at(voxel).map_or(EMPTY_MATERIAL, |v| v.material)
    }

    /// Chunks owning any voxel of the inclusive box `[min, max]`
    fn positions_in(&self, min: IVec3, max: IVec3) -> Vec<ChunkPos> {
        let cs = self.chunk_size();
        let lo = ChunkPos::from_voxel(min, cs).as_ivec3();
        let hi = ChunkPos::from_voxel(max, cs).as_ivec3();
        let mut positions = Vec::new();
        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    positions.push(ChunkPos::new(x, y, z));
                }
            }
        }
        positions
    }

    /// Copy `grid` into the world with its minimum corner at voxel `origin`.
    ///
    /// With a consumer, the chunks covering the box grown by one voxel are
    /// snapshotted and handed over first. With `write_to_chunks` false
    /// nothing is written.
    pub fn apply_grid<J: Indexer>(
        &mut self,
        origin: IVec3,
        grid: &VoxelGrid<J>,
        write: GridWrite,
        consumer: Option<&mut dyn EditConsumer<I>>,
        write_to_chunks: bool,
    ) -> Result<()> {
        if grid.is_empty() {
            return Err(Error::EmptyGrid(origin));
        }
        let start = std::time::Instant::now();
        let max = origin + grid.dims().as_ivec3() - IVec3::ONE;

        if let Some(consumer) = consumer {
            let region = self.positions_in(origin - IVec3::ONE, max + IVec3::ONE);
            self.capture(&region, consumer);
        }
        if !write_to_chunks {
            return Ok(());
        }

        let positions = self.positions_in(origin, max);
        self.create_chunks(&positions)?;

        let cs = self.chunk_size();
        let updates = self.run_mutations(&positions, move |chunk| {
            let chunk_origin = chunk.pos().origin(cs);
            let overlap = chunk_origin.max(origin);
            chunk.schedule_grid(
                overlap - chunk_origin,
                overlap - origin,
                grid,
                write.propagate_padding,
                write.include_padding,
                write.write_unset_voxels,
            )
        });
        let changed = self.finalize_mutations(updates)?;

        log::debug!(
            "Applied {} grid to {} chunks ({} changed) in {:.2}ms",
            grid.dims(),
            positions.len(),
            changed,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    /// CSG-apply `sdf` placed at a world position and rotation.
    ///
    /// `material == 0` carves; otherwise empty voxels inside are filled and
    /// `replace` also repaints solid ones. SDF distances are in voxel units.
    pub fn apply_sdf<S: Sdf + ?Sized>(
        &mut self,
        position: Vec3,
        rotation: Quat,
        sdf: &S,
        material: u32,
        replace: bool,
        consumer: Option<&mut dyn EditConsumer<I>>,
    ) -> Result<()> {
        let start = std::time::Instant::now();

        let (_, world_rotation, _) = self.transform.to_scale_rotation_translation();
        let local_sdf = TransformSdf::new(
            sdf,
            self.inverse_transform.transform_point3(position),
            world_rotation.inverse() * rotation,
        );
        let bounds = local_sdf.bounds();
        // Edges owned by the voxel just below the bound can change too
        let min = bounds.min.floor().as_ivec3() - IVec3::ONE;
        let max = bounds.max.ceil().as_ivec3();

        if let Some(consumer) = consumer {
            let region = self.positions_in(min - IVec3::ONE, max + IVec3::ONE);
            self.capture(&region, consumer);
        }

        let positions = self.positions_in(min, max);
        self.create_chunks(&positions)?;

        let eps = self.config.gradient_epsilon;
        let local_sdf = &local_sdf;
        let updates = self.run_mutations(&positions, move |chunk| {
            chunk.schedule_sdf(chunk.local_origin(), local_sdf, material, replace, eps)
        });
        let changed = self.finalize_mutations(updates)?;

        log::debug!(
            "Applied SDF (material {}, replace {}) to {} chunks ({} changed) in {:.2}ms",
            material,
            replace,
            positions.len(),
            changed,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    /// Snapshot the given chunk positions into one edit and hand it to
    /// `consumer`. Positions the consumer ignores are skipped; positions
    /// without a chunk are recorded as vacant.
    pub fn capture(&self, positions: &[ChunkPos], consumer: &mut dyn EditConsumer<I>) {
        let start = std::time::Instant::now();
        let mut seen = HashSet::new();
        let mut batch = JobBatch::with_capacity(positions.len());
        let mut vacant = Vec::new();
        for &pos in positions {
            if !seen.insert(pos) || consumer.ignore_chunk(pos) {
                continue;
            }
            match self.chunks.get(&pos) {
                Some(chunk) => batch.schedule(chunk.schedule_snapshot()),
                None => vacant.push(ChunkSnapshot::Vacant(pos)),
            }
        }

        let snapshots: Vec<_> = batch
            .complete()
            .into_iter()
            .map(ChunkSnapshot::Chunk)
            .chain(vacant)
            .collect();
        log::debug!(
            "Captured {} snapshots in {:.2}ms",
            snapshots.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        consumer.consume(VoxelEdit::new(snapshots));
    }

    /// Overwrite chunks with snapshots, padding included. The first snapshot
    /// of a position wins. Vacant snapshots empty their chunk if it exists.
    pub fn restore_snapshots(&mut self, snapshots: &[ChunkSnapshot<I>]) -> Result<()> {
        let start = std::time::Instant::now();
        let cs = self.chunk_size();

        let mut seen = HashSet::new();
        let mut sources: HashMap<ChunkPos, &VoxelGrid<I>> = HashMap::new();
        let mut positions = Vec::new();
        let empty = VoxelGrid::<I>::cube(cs + 1);
        for snapshot in snapshots {
            let pos = snapshot.pos();
            if !seen.insert(pos) {
                continue;
            }
            match snapshot {
                ChunkSnapshot::Chunk(chunk) => {
                    if chunk.chunk_size() != cs {
                        return Err(Error::GridSize {
                            expected: UVec3::splat(cs + 1),
                            actual: chunk.voxels().dims(),
                        });
                    }
                    sources.insert(pos, chunk.voxels());
                }
                ChunkSnapshot::Vacant(_) => {
                    if !self.chunks.contains_key(&pos) {
                        continue;
                    }
                    sources.insert(pos, &empty);
                }
            }
            positions.push(pos);
        }

        self.create_chunks(&positions)?;
        let empty = &empty;
        let updates = self.run_mutations(&positions, move |chunk| {
            let source = sources.get(&chunk.pos()).copied().unwrap_or(empty);
            chunk.schedule_grid(IVec3::ZERO, IVec3::ZERO, source, false, true, true)
        });
        let changed = self.finalize_mutations(updates)?;

        // Neighbors on both sides may hold padding from the overwritten state
        for &pos in &positions {
            self.propagate_padding(pos)?;
            self.backfill_padding(pos)?;
        }

        log::debug!(
            "Restored {} chunks ({} changed) in {:.2}ms",
            positions.len(),
            changed,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    /// Approximate ray cast: march in fixed steps through local space and
    /// stop at the first cell with any solid corner voxel. A non-finite or
    /// non-positive `max_distance` casts nothing.
    pub fn ray_cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayCastResult> {
        let ray = Ray::new(origin, direction);
        if ray.direction == Vec3::ZERO || !max_distance.is_finite() || max_distance <= 0.0 {
            return None;
        }
        let local = ray.transform(&self.inverse_transform);
        let local_end = self.inverse_transform.transform_point3(ray.at(max_distance));
        let local_max = (local_end - local.origin).length();
        let steps = (local_max / self.config.ray_step).floor() as u32;

        let mut prev: Option<IVec3> = None;
        for i in 0..=steps {
            let point = local.at(i as f32 * self.config.ray_step);
            let cell = point.floor().as_ivec3();
            if prev == Some(cell) {
                continue;
            }
            if self.cell_is_solid(cell) {
                return Some(RayCastResult {
                    cell,
                    prev_cell: prev.unwrap_or(cell),
                    chunk: ChunkPos::from_voxel(cell, self.chunk_size()),
                    distance: (self.transform.transform_point3(point) - origin).length(),
                });
            }
            prev = Some(cell);
        }
        None
    }

    fn cell_is_solid(&self, cell: IVec3) -> bool {
        (0..8).any(|corner| {
            let offset = IVec3::new(corner & 1, (corner >> 1) & 1, corner >> 2);
            self.material_at(cell + offset) != EMPTY_MATERIAL
        })
    }

    /// Rebuild the mesh of every dirty or never-built chunk.
    /// Returns the number of chunks rebuilt.
    pub fn update(&mut self) -> usize {
        let start = std::time::Instant::now();
        let meshes: Vec<(ChunkPos, ChunkMesh)> = {
            let mesher = self.mesher.as_ref();
            let mut order = Vec::new();
            let mut batch = JobBatch::new();
            for chunk in self.chunks.values() {
                if chunk.needs_rebuild() || chunk.mesh().is_none() {
                    order.push(chunk.pos());
                    batch.schedule(chunk.schedule_build(mesher));
                }
            }
            order.into_iter().zip(batch.complete()).collect()
        };

        let rebuilt = meshes.len();
        for (pos, mesh) in meshes {
            if let Some(chunk) = self.chunks.get_mut(&pos) {
                chunk.finalize_build(mesh);
            }
        }
        if rebuilt > 0 {
            log::debug!(
                "Rebuilt {} chunk meshes in {:.2}ms",
                rebuilt,
                start.elapsed().as_secs_f64() * 1000.0
            );
        }
        rebuilt
    }

    /// Insert empty chunks for missing positions and backfill their padding
    /// from existing +X/+Y/+Z neighbors
    fn create_chunks(&mut self, positions: &[ChunkPos]) -> Result<()> {
        let cs = self.chunk_size();
        let mut created = Vec::new();
        for &pos in positions {
            if !self.chunks.contains_key(&pos) {
                self.chunks.insert(pos, VoxelChunk::new(pos, cs));
                created.push(pos);
            }
        }
        for pos in &created {
            self.backfill_padding(*pos)?;
        }
        if !created.is_empty() {
            log::trace!("Created {} chunks", created.len());
        }
        Ok(())
    }

    /// Schedule one job per position and complete them as one batch
    fn run_mutations<'a>(
        &'a self,
        positions: &[ChunkPos],
        schedule: impl Fn(&'a VoxelChunk<I>) -> Change<'a, I>,
    ) -> Vec<(ChunkPos, ChunkUpdate<I>)> {
        let mut order = Vec::with_capacity(positions.len());
        let mut batch = JobBatch::with_capacity(positions.len());
        for pos in positions {
            if let Some(chunk) = self.chunks.get(pos) {
                order.push(*pos);
                batch.schedule(schedule(chunk));
            }
        }
        order.into_iter().zip(batch.complete()).collect()
    }

    /// Swap in every update, then propagate padding where requested.
    /// Returns how many chunks changed.
    fn finalize_mutations(&mut self, updates: Vec<(ChunkPos, ChunkUpdate<I>)>) -> Result<usize> {
        let mut changed = 0;
        let mut propagate = Vec::new();
        for (pos, update) in updates {
            if let Some(chunk) = self.chunks.get_mut(&pos) {
                changed += update.changed as usize;
                if chunk.finalize(update) {
                    propagate.push(pos);
                }
            }
        }
        for pos in propagate {
            self.propagate_padding(pos)?;
        }
        Ok(changed)
    }

    /// Mirror `pos`'s low borders into the padding of its -X/-Y/-Z neighbors
    fn propagate_padding(&mut self, pos: ChunkPos) -> Result<usize> {
        let pairs: Vec<_> = PADDING_NEIGHBORS
            .iter()
            .map(|&offset| (pos.offset(-offset), pos))
            .collect();
        self.update_padding(&pairs)
    }

    /// Pull `pos`'s padding from its +X/+Y/+Z neighbors
    fn backfill_padding(&mut self, pos: ChunkPos) -> Result<usize> {
        let pairs: Vec<_> = PADDING_NEIGHBORS
            .iter()
            .map(|&offset| (pos, pos.offset(offset)))
            .collect();
        self.update_padding(&pairs)
    }

    /// Complete padding updates for `(target, source)` pairs where both
    /// chunks exist. Returns how many targets changed.
    fn update_padding(&mut self, pairs: &[(ChunkPos, ChunkPos)]) -> Result<usize> {
        let patches = {
            let mut batch = JobBatch::with_capacity(pairs.len());
            for (target, source) in pairs {
                if let (Some(target), Some(source)) = (self.chunks.get(target), self.chunks.get(source)) {
                    batch.schedule(target.schedule_update_padding(source)?);
                }
            }
            batch.complete()
        };

        let mut changed = 0;
        for patch in patches {
            if let Some(chunk) = self.chunks.get_mut(&patch.target) {
                changed += chunk.apply_padding(patch) as usize;
            }
        }
        Ok(changed)
    }
}

impl<I: Indexer> fmt::Debug for VoxelWorld<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoxelWorld")
            .field("config", &self.config)
            .field("chunks", &self.chunks.len())
            .field("transform", &self.transform)
            .finish_non_exhaustive()
    }
}
