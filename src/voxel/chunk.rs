//! Padded voxel chunks and their job-scheduled mutations.
//!
//! A chunk of size `cs` stores `(cs + 1)^3` voxels. The extra layer on the
//! +X/+Y/+Z sides mirrors the lowest voxels of the seven +X/+Y/+Z neighbors,
//! so a mesher can polygonize one chunk without touching any other.
//!
//! Mutations never write in place. A scheduled job reads the current buffer
//! and returns a [`ChunkUpdate`] carrying a fresh one; the owner swaps it in
//! with [`VoxelChunk::finalize`] once every job of the batch has completed.

use std::sync::atomic::{AtomicBool, Ordering};

use glam::{IVec3, UVec3, Vec3};

use crate::core::{Error, Result};
use crate::voxel::grid::VoxelGrid;
use crate::voxel::indexer::Indexer;
use crate::voxel::job::Job;
use crate::voxel::mesh::{ChunkMesh, Mesher};
use crate::voxel::sdf::{Sdf, gradient};
use crate::voxel::voxel::{Axis, EMPTY_MATERIAL, Voxel, voxel_count_delta};

/// Integer coordinate identifying a chunk in the world grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkPos {
    /// Create a new chunk coordinate
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn from_ivec3(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// Chunk containing a voxel coordinate (floor division)
    pub fn from_voxel(voxel: IVec3, chunk_size: u32) -> Self {
        Self::from_ivec3(voxel.div_euclid(IVec3::splat(chunk_size as i32)))
    }

    /// Voxel coordinate of this chunk's minimum corner
    pub fn origin(self, chunk_size: u32) -> IVec3 {
        self.as_ivec3() * chunk_size as i32
    }

    pub fn offset(self, delta: IVec3) -> Self {
        Self::from_ivec3(self.as_ivec3() + delta)
    }
}

/// Offsets of the neighbors whose lowest voxels a chunk mirrors as padding
pub const PADDING_NEIGHBORS: [IVec3; 7] = [
    IVec3::new(1, 0, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(1, 1, 0),
    IVec3::new(1, 0, 1),
    IVec3::new(0, 1, 1),
    IVec3::new(1, 1, 1),
];

/// Result of a mutation job, applied by [`VoxelChunk::finalize`]
#[derive(Debug)]
pub struct ChunkUpdate<I: Indexer> {
    pub voxels: VoxelGrid<I>,
    pub voxel_count: usize,
    /// Whether any voxel differs from the buffer the job read
    pub changed: bool,
    pub mark_dirty: bool,
    pub propagate_padding: bool,
}

/// Deferred chunk mutation
pub type Change<'a, I> = Job<'a, ChunkUpdate<I>>;

/// Padding cells of one chunk that differ from its neighbor's border
#[derive(Debug, Default)]
pub struct PaddingPatch {
    pub target: ChunkPos,
    pub cells: Vec<(usize, Voxel)>,
}

/// One chunk of the voxel field
#[derive(Debug)]
pub struct VoxelChunk<I: Indexer> {
    pos: ChunkPos,
    chunk_size: u32,
    voxels: VoxelGrid<I>,
    /// Set voxels outside the padding
    voxel_count: usize,
    needs_rebuild: AtomicBool,
    mesh: Option<ChunkMesh>,
}

impl<I: Indexer> VoxelChunk<I> {
    /// Create an empty chunk
    pub fn new(pos: ChunkPos, chunk_size: u32) -> Self {
        Self {
            pos,
            chunk_size,
            voxels: VoxelGrid::cube(chunk_size + 1),
            voxel_count: 0,
            needs_rebuild: AtomicBool::new(false),
            mesh: None,
        }
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Padded voxel buffer
    pub fn voxels(&self) -> &VoxelGrid<I> {
        &self.voxels
    }

    pub fn voxel_count(&self) -> usize {
        self.voxel_count
    }

    pub fn is_empty(&self) -> bool {
        self.voxel_count == 0
    }

    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild.load(Ordering::Acquire)
    }

    pub fn mark_dirty(&self) {
        self.needs_rebuild.store(true, Ordering::Release);
    }

    /// Most recently finalized mesh, `None` until the first build
    pub fn mesh(&self) -> Option<&ChunkMesh> {
        self.mesh.as_ref()
    }

    /// Voxel at a local (padded) coordinate
    pub fn voxel(&self, x: u32, y: u32, z: u32) -> Voxel {
        self.voxels.get(x, y, z)
    }

    /// Material at a local (padded) coordinate
    pub fn material(&self, x: u32, y: u32, z: u32) -> u32 {
        self.voxels.get(x, y, z).material
    }

    /// This chunk's minimum corner in the world's local space
    pub fn local_origin(&self) -> Vec3 {
        self.pos.origin(self.chunk_size).as_vec3()
    }

    fn is_interior(&self, p: UVec3) -> bool {
        p.cmplt(UVec3::splat(self.chunk_size)).all()
    }

    /// Copy voxels from `source` into this chunk: local voxel
    /// `target_offset + i` receives source voxel `source_offset + i`, for every
    /// `i` where both lie inside their grids. The padding layer is only
    /// written when `include_padding` is set. With `write_unset_voxels`
    /// false, empty source voxels are skipped.
    pub fn schedule_grid<'a, J: Indexer>(
        &'a self,
        target_offset: IVec3,
        source_offset: IVec3,
        source: &'a VoxelGrid<J>,
        propagate_padding: bool,
        include_padding: bool,
        write_unset_voxels: bool,
    ) -> Change<'a, I> {
        Job::new(move || {
            let limit = if include_padding {
                self.chunk_size + 1
            } else {
                self.chunk_size
            };
            let start = IVec3::ZERO.max(-target_offset).max(-source_offset);
            let end = (IVec3::splat(limit as i32) - target_offset)
                .min(source.dims().as_ivec3() - source_offset);

            let mut voxels = self.voxels.clone();
            let mut count = self.voxel_count as i64;
            let mut changed = false;
            for z in start.z..end.z {
                for y in start.y..end.y {
                    for x in start.x..end.x {
                        let i = IVec3::new(x, y, z);
                        let s = (source_offset + i).as_uvec3();
                        let voxel = source.get(s.x, s.y, s.z);
                        if !write_unset_voxels && !voxel.is_set() {
                            continue;
                        }

                        let t = (target_offset + i).as_uvec3();
                        let index = voxels.index(t.x, t.y, t.z);
                        let current = voxels.at(index);
                        if current == voxel {
                            continue;
                        }
                        if self.is_interior(t) {
                            count += voxel_count_delta(current.material, voxel.material);
                        }
                        voxels.set_at(index, voxel);
                        changed = true;
                    }
                }
            }

            ChunkUpdate {
                voxels,
                voxel_count: count.max(0) as usize,
                changed,
                mark_dirty: changed,
                propagate_padding,
            }
        })
    }

    /// CSG-combine an SDF with this chunk. Voxel `p` is sampled at
    /// `local_origin + p`. `material == 0` carves; otherwise empty voxels
    /// inside the SDF are filled, and set ones too when `replace` is true.
    pub fn schedule_sdf<'a, S: Sdf + ?Sized>(
        &'a self,
        local_origin: Vec3,
        sdf: &'a S,
        material: u32,
        replace: bool,
        gradient_epsilon: f32,
    ) -> Change<'a, I> {
        Job::new(move || self.sdf_update(local_origin, sdf, material, replace, gradient_epsilon))
    }

    fn sdf_update<S: Sdf + ?Sized>(
        &self,
        local_origin: Vec3,
        sdf: &S,
        material: u32,
        replace: bool,
        gradient_epsilon: f32,
    ) -> ChunkUpdate<I> {
        let n = self.chunk_size + 1;
        // Scratch arrays are row-major, matching iter_positions order
        let stride = [1, n as usize, (n * n) as usize];
        let total = (n * n * n) as usize;

        let mut distances = Vec::with_capacity(total);
        let mut materials = Vec::with_capacity(total);
        let mut count = self.voxel_count as i64;
        for p in self.voxels.iter_positions() {
            let d = sdf.eval(local_origin + p.as_vec3());
            let current = self.voxels.get(p.x, p.y, p.z).material;
            let next = combine_material(current, d, material, replace);
            if self.is_interior(p) {
                count += voxel_count_delta(current, next);
            }
            distances.push(d);
            materials.push(next);
        }

        let mut voxels = self.voxels.clone();
        let mut changed = false;
        for (i, p) in self.voxels.iter_positions().enumerate() {
            let old = self.voxels.get(p.x, p.y, p.z);
            let mut voxel = old;
            voxel.material = materials[i];

            for axis in Axis::ALL {
                let a = axis.index();
                // Edges leaving the buffer are owned by padding; keep them
                if p[a] + 1 >= n {
                    continue;
                }
                let j = i + stride[a];
                let (ma, mb) = (materials[i], materials[j]);
                if ma == mb {
                    voxel.clear_edge(axis);
                    continue;
                }

                let q = p + axis.to_uvec3();
                let old_b = self.voxels.get(q.x, q.y, q.z).material;
                let endpoint_changed = old.material != ma || old_b != mb;
                let (da, db) = (distances[i], distances[j]);
                let crosses = (da < 0.0) != (db < 0.0);
                let old_edge = old.edge(axis);

                let sdf_edge = || {
                    let t = (da / (da - db)).clamp(0.0, 1.0);
                    let at = local_origin + p.as_vec3() + axis.to_vec3() * t;
                    let normal = gradient(sdf, at, gradient_epsilon);
                    if material == EMPTY_MATERIAL {
                        (t, -normal)
                    } else {
                        (t, normal)
                    }
                };

                let (t, normal) = if endpoint_changed {
                    if crosses {
                        sdf_edge()
                    } else if old.material != old_b {
                        old_edge
                    } else {
                        (0.5, Vec3::ZERO)
                    }
                } else if crosses && refines(ma, mb, da < 0.0, material) {
                    // The side inside the SDF grows towards the other endpoint
                    let (sdf_t, sdf_normal) = sdf_edge();
                    let grows = if da < 0.0 {
                        sdf_t > old_edge.0
                    } else {
                        sdf_t < old_edge.0
                    };
                    if grows { (sdf_t, sdf_normal) } else { old_edge }
                } else {
                    old_edge
                };
                voxel.set_edge(axis, t, normal);
            }

            if voxel != old {
                voxels.set_at(voxels.index(p.x, p.y, p.z), voxel);
                changed = true;
            }
        }

        ChunkUpdate {
            voxels,
            voxel_count: count.max(0) as usize,
            changed,
            mark_dirty: changed,
            propagate_padding: true,
        }
    }

    /// Swap in a completed update. Returns whether padding should propagate.
    pub fn finalize(&mut self, update: ChunkUpdate<I>) -> bool {
        self.voxels = update.voxels;
        self.voxel_count = update.voxel_count;
        if update.mark_dirty {
            self.mark_dirty();
        }
        update.propagate_padding
    }

    /// Compute the padding cells this chunk mirrors from `neighbor`, which
    /// must sit at a +X/+Y/+Z offset in `{0, 1}^3` other than zero.
    pub fn schedule_update_padding<'a>(
        &'a self,
        neighbor: &'a VoxelChunk<I>,
    ) -> Result<Job<'a, PaddingPatch>> {
        let offset = neighbor.pos.as_ivec3() - self.pos.as_ivec3();
        if !PADDING_NEIGHBORS.contains(&offset) || neighbor.chunk_size != self.chunk_size {
            return Err(Error::InvalidNeighbor {
                target: self.pos,
                neighbor: neighbor.pos,
            });
        }

        Ok(Job::new(move || {
            let cs = self.chunk_size;
            let offset = offset.as_uvec3();
            // Offset axes pin the padding layer; the others span the interior
            let range = |o: u32| if o == 1 { cs..cs + 1 } else { 0..cs };
            let mut cells = Vec::new();
            for z in range(offset.z) {
                for y in range(offset.y) {
                    for x in range(offset.x) {
                        let t = UVec3::new(x, y, z);
                        let s = t - offset * cs;
                        let voxel = neighbor.voxels.get(s.x, s.y, s.z);
                        let index = self.voxels.index(x, y, z);
                        if self.voxels.at(index) != voxel {
                            cells.push((index, voxel));
                        }
                    }
                }
            }
            PaddingPatch {
                target: self.pos,
                cells,
            }
        }))
    }

    /// Write a padding patch. Returns whether anything changed.
    pub fn apply_padding(&mut self, patch: PaddingPatch) -> bool {
        debug_assert_eq!(patch.target, self.pos);
        if patch.cells.is_empty() {
            return false;
        }
        for (index, voxel) in patch.cells {
            self.voxels.set_at(index, voxel);
        }
        self.mark_dirty();
        true
    }

    /// Schedule mesh extraction. The rebuild flag is cleared right away so a
    /// mutation landing while the job runs re-dirties the chunk.
    pub fn schedule_build<'a, M: Mesher<I> + ?Sized>(&'a self, mesher: &'a M) -> Job<'a, ChunkMesh> {
        self.needs_rebuild.store(false, Ordering::Release);
        Job::new(move || mesher.polygonize(&self.voxels, self.chunk_size))
    }

    pub fn finalize_build(&mut self, mesh: ChunkMesh) {
        self.mesh = Some(mesh);
    }

    /// Deep copy of the voxel state at the same position
    pub fn schedule_snapshot(&self) -> Job<'_, VoxelChunk<I>> {
        Job::new(move || VoxelChunk {
            pos: self.pos,
            chunk_size: self.chunk_size,
            voxels: self.voxels.clone(),
            voxel_count: self.voxel_count,
            needs_rebuild: AtomicBool::new(false),
            mesh: None,
        })
    }
}

/// Material after combining `current` with an SDF sample
#[inline]
fn combine_material(current: u32, distance: f32, material: u32, replace: bool) -> u32 {
    if distance >= 0.0 {
        current
    } else if material == EMPTY_MATERIAL {
        EMPTY_MATERIAL
    } else if current == EMPTY_MATERIAL || replace {
        material
    } else {
        current
    }
}

/// Whether an untouched surface edge crossed by the SDF moves: a union pushes
/// solid into air, a difference pushes air into solid.
#[inline]
fn refines(ma: u32, mb: u32, a_inside: bool, material: u32) -> bool {
    let (inside, outside) = if a_inside { (ma, mb) } else { (mb, ma) };
    if material == EMPTY_MATERIAL {
        inside == EMPTY_MATERIAL && outside != EMPTY_MATERIAL
    } else {
        inside != EMPTY_MATERIAL && outside == EMPTY_MATERIAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::brush::BrushPrimitive;
    use crate::voxel::indexer::{LinearIndexer, MortonIndexer};
    use crate::voxel::mesh::FaceMesher;
    use crate::voxel::sdf::OffsetSdf;

    const CS: u32 = 8;

    fn chunk() -> VoxelChunk<MortonIndexer> {
        VoxelChunk::new(ChunkPos::new(0, 0, 0), CS)
    }

    fn sphere(center: Vec3, radius: f32) -> OffsetSdf<BrushPrimitive> {
        OffsetSdf::new(BrushPrimitive::Sphere { radius }, center)
    }

    fn apply_sdf<S: Sdf>(chunk: &mut VoxelChunk<MortonIndexer>, sdf: &S, material: u32, replace: bool) -> bool {
        let update = chunk
            .schedule_sdf(chunk.local_origin(), sdf, material, replace, 0.01)
            .complete();
        let changed = update.changed;
        chunk.finalize(update);
        changed
    }

    #[test]
    fn test_chunk_pos_from_voxel() {
        assert_eq!(ChunkPos::from_voxel(IVec3::new(0, 15, 16), 16), ChunkPos::new(0, 0, 1));
        assert_eq!(ChunkPos::from_voxel(IVec3::new(-1, -16, -17), 16), ChunkPos::new(-1, -1, -2));
        assert_eq!(ChunkPos::new(-1, 2, 0).origin(16), IVec3::new(-16, 32, 0));
        assert_eq!(ChunkPos::new(1, 1, 1).offset(IVec3::NEG_ONE), ChunkPos::default());
    }

    #[test]
    fn test_new_chunk() {
        let chunk = chunk();
        assert_eq!(chunk.voxels().dims(), UVec3::splat(CS + 1));
        assert!(chunk.is_empty());
        assert!(!chunk.needs_rebuild());
        assert!(chunk.mesh().is_none());
    }

    #[test]
    fn test_grid_offsets() {
        let mut chunk = chunk();
        let source = VoxelGrid::<LinearIndexer>::from_fn(4, 4, 4, |p| Voxel::new(1 + p.x));

        let update = chunk
            .schedule_grid(IVec3::new(2, 0, 0), IVec3::new(1, 0, 0), &source, false, false, true)
            .complete();
        assert!(update.changed);
        assert!(!chunk.finalize(update));

        // Local x=2 receives source x=1
        assert_eq!(chunk.material(2, 0, 0), 2);
        assert_eq!(chunk.material(4, 3, 3), 4);
        assert_eq!(chunk.material(5, 0, 0), 0);
        assert_eq!(chunk.material(1, 0, 0), 0);
        assert_eq!(chunk.voxel_count(), 3 * 4 * 4);
        assert!(chunk.needs_rebuild());
    }

    #[test]
    fn test_grid_negative_offset_clips() {
        let mut chunk = chunk();
        let source = VoxelGrid::<LinearIndexer>::filled(4, 1, 1, Voxel::new(3));
        let update = chunk
            .schedule_grid(IVec3::new(-2, 0, 0), IVec3::ZERO, &source, false, false, true)
            .complete();
        chunk.finalize(update);
        assert_eq!(chunk.material(0, 0, 0), 3);
        assert_eq!(chunk.material(1, 0, 0), 3);
        assert_eq!(chunk.material(2, 0, 0), 0);
        assert_eq!(chunk.voxel_count(), 2);
    }

    #[test]
    fn test_grid_padding_not_counted() {
        let mut chunk = chunk();
        let source = VoxelGrid::<MortonIndexer>::filled(CS + 1, CS + 1, CS + 1, Voxel::new(1));

        let update = chunk
            .schedule_grid(IVec3::ZERO, IVec3::ZERO, &source, true, false, true)
            .complete();
        assert!(chunk.finalize(update));
        assert_eq!(chunk.material(CS, 0, 0), 0);
        assert_eq!(chunk.voxel_count(), (CS * CS * CS) as usize);

        let update = chunk
            .schedule_grid(IVec3::ZERO, IVec3::ZERO, &source, true, true, true)
            .complete();
        chunk.finalize(update);
        assert_eq!(chunk.material(CS, CS, CS), 1);
        assert_eq!(chunk.voxel_count(), (CS * CS * CS) as usize);
    }

    #[test]
    fn test_grid_sparse_write() {
        let mut chunk = chunk();
        let full = VoxelGrid::<LinearIndexer>::filled(2, 2, 2, Voxel::new(5));
        let update = chunk
            .schedule_grid(IVec3::ZERO, IVec3::ZERO, &full, false, false, true)
            .complete();
        chunk.finalize(update);

        let mut sparse = VoxelGrid::<LinearIndexer>::new(2, 2, 2);
        sparse.set(0, 0, 0, Voxel::new(7));
        let update = chunk
            .schedule_grid(IVec3::ZERO, IVec3::ZERO, &sparse, false, false, false)
            .complete();
        chunk.finalize(update);
        assert_eq!(chunk.material(0, 0, 0), 7);
        assert_eq!(chunk.material(1, 1, 1), 5);
        assert_eq!(chunk.voxel_count(), 8);

        let update = chunk
            .schedule_grid(IVec3::ZERO, IVec3::ZERO, &sparse, false, false, true)
            .complete();
        chunk.finalize(update);
        assert_eq!(chunk.material(1, 1, 1), 0);
        assert_eq!(chunk.voxel_count(), 1);
    }

    #[test]
    fn test_jobs_do_not_write_in_place() {
        let chunk = chunk();
        let sdf = sphere(Vec3::splat(4.0), 3.0);
        let update = chunk.schedule_sdf(Vec3::ZERO, &sdf, 1, false, 0.01).complete();
        assert!(update.changed);
        assert_eq!(update.voxels.get(4, 4, 4).material, 1);
        assert_eq!(chunk.material(4, 4, 4), 0);
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_sdf_union() {
        let mut chunk = chunk();
        let sdf = sphere(Vec3::splat(4.0), 2.5);
        assert!(apply_sdf(&mut chunk, &sdf, 1, false));

        assert_eq!(chunk.material(4, 4, 4), 1);
        assert_eq!(chunk.material(6, 4, 4), 1);
        assert_eq!(chunk.material(7, 4, 4), 0);
        assert_eq!(chunk.material(0, 0, 0), 0);
        assert!(chunk.needs_rebuild());

        let expected = chunk
            .voxels()
            .iter_positions()
            .filter(|p| p.cmplt(UVec3::splat(CS)).all())
            .filter(|p| sdf.eval(p.as_vec3()) < 0.0)
            .count();
        assert_eq!(chunk.voxel_count(), expected);

        // Surface crossing between (6,4,4) and (7,4,4) at x = 6.5
        let (t, normal) = chunk.voxel(6, 4, 4).edge(Axis::X);
        assert!((t - 0.5).abs() < 1e-3);
        assert!((normal - Vec3::X).length() < 1e-2);

        // Interior edges carry no data
        assert_eq!(chunk.voxel(4, 4, 4).edge(Axis::X), (0.0, Vec3::ZERO));
    }

    #[test]
    fn test_sdf_difference() {
        let mut chunk = chunk();
        apply_sdf(&mut chunk, &sphere(Vec3::splat(4.0), 3.5), 1, false);
        let before = chunk.voxel_count();

        apply_sdf(&mut chunk, &sphere(Vec3::splat(4.0), 1.5), 0, false);
        assert_eq!(chunk.material(4, 4, 4), 0);
        assert_eq!(chunk.material(6, 4, 4), 1);
        assert!(chunk.voxel_count() < before);

        // Carved surface faces into the cavity
        let (t, normal) = chunk.voxel(5, 4, 4).edge(Axis::X);
        assert!((t - 0.5).abs() < 1e-3);
        assert!((normal + Vec3::X).length() < 1e-2);
    }

    #[test]
    fn test_sdf_replace() {
        let mut chunk = chunk();
        let sdf = sphere(Vec3::splat(4.0), 2.0);
        apply_sdf(&mut chunk, &sdf, 1, false);

        apply_sdf(&mut chunk, &sdf, 2, false);
        assert_eq!(chunk.material(4, 4, 4), 1);

        apply_sdf(&mut chunk, &sdf, 2, true);
        assert_eq!(chunk.material(4, 4, 4), 2);
    }

    #[test]
    fn test_sdf_union_extends_surface() {
        let mut chunk = chunk();
        apply_sdf(&mut chunk, &sphere(Vec3::splat(4.0), 2.3), 1, false);
        let (t_before, _) = chunk.voxel(6, 4, 4).edge(Axis::X);
        assert!((t_before - 0.3).abs() < 1e-3);

        // Larger sphere that still leaves (7,4,4) outside pushes the crossing out
        apply_sdf(&mut chunk, &sphere(Vec3::splat(4.0), 2.8), 1, false);
        assert_eq!(chunk.material(7, 4, 4), 0);
        let (t_after, _) = chunk.voxel(6, 4, 4).edge(Axis::X);
        assert!((t_after - 0.8).abs() < 1e-3);

        // Smaller one leaves it alone
        apply_sdf(&mut chunk, &sphere(Vec3::splat(4.0), 2.5), 1, false);
        let (t_kept, _) = chunk.voxel(6, 4, 4).edge(Axis::X);
        assert_eq!(t_kept, t_after);
    }

    #[test]
    fn test_sdf_miss_is_noop() {
        let mut chunk = chunk();
        let far = sphere(Vec3::splat(100.0), 1.0);
        assert!(!apply_sdf(&mut chunk, &far, 1, false));
        assert!(!chunk.needs_rebuild());
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_update_padding_rejects_non_neighbors() {
        let chunk = chunk();
        for pos in [ChunkPos::new(0, 0, 0), ChunkPos::new(-1, 0, 0), ChunkPos::new(2, 0, 0)] {
            let other = VoxelChunk::<MortonIndexer>::new(pos, CS);
            assert!(matches!(
                chunk.schedule_update_padding(&other),
                Err(Error::InvalidNeighbor { .. })
            ));
        }
    }

    #[test]
    fn test_update_padding_face_and_corner() {
        let mut target = chunk();
        let mut neighbor = VoxelChunk::<MortonIndexer>::new(ChunkPos::new(1, 0, 0), CS);
        let source = VoxelGrid::<LinearIndexer>::filled(1, CS, CS, Voxel::new(4));
        let update = neighbor
            .schedule_grid(IVec3::ZERO, IVec3::ZERO, &source, true, false, true)
            .complete();
        neighbor.finalize(update);

        let patch = target.schedule_update_padding(&neighbor).unwrap().complete();
        assert_eq!(patch.cells.len(), (CS * CS) as usize);
        assert!(target.apply_padding(patch));
        assert!(target.needs_rebuild());
        assert_eq!(target.material(CS, 0, 0), 4);
        assert_eq!(target.material(CS, CS - 1, CS - 1), 4);
        // Edge cells along +Y belong to another neighbor
        assert_eq!(target.material(CS, CS, 0), 0);
        assert!(target.is_empty());

        // Repeating the update finds nothing to do
        let patch = target.schedule_update_padding(&neighbor).unwrap().complete();
        assert!(patch.cells.is_empty());

        let mut corner = VoxelChunk::<MortonIndexer>::new(ChunkPos::new(1, 1, 1), CS);
        let dot = VoxelGrid::<LinearIndexer>::filled(1, 1, 1, Voxel::new(9));
        let update = corner
            .schedule_grid(IVec3::ZERO, IVec3::ZERO, &dot, true, false, true)
            .complete();
        corner.finalize(update);
        let patch = target.schedule_update_padding(&corner).unwrap().complete();
        assert_eq!(patch.cells.len(), 1);
        target.apply_padding(patch);
        assert_eq!(target.material(CS, CS, CS), 9);
    }

    #[test]
    fn test_build_clears_flag_immediately() {
        let mut chunk = chunk();
        apply_sdf(&mut chunk, &sphere(Vec3::splat(4.0), 2.0), 1, false);
        assert!(chunk.needs_rebuild());

        let mesher = FaceMesher::default();
        let job = chunk.schedule_build(&mesher);
        assert!(!chunk.needs_rebuild());
        // A mutation during the build re-dirties
        chunk.mark_dirty();
        let mesh = job.complete();
        chunk.finalize_build(mesh);

        assert!(chunk.needs_rebuild());
        assert!(chunk.mesh().is_some_and(|m| !m.is_empty()));
    }

    #[test]
    fn test_snapshot_is_deep_copy() {
        let mut chunk = chunk();
        apply_sdf(&mut chunk, &sphere(Vec3::splat(4.0), 2.0), 1, false);
        let snapshot = chunk.schedule_snapshot().complete();
        assert_eq!(snapshot.pos(), chunk.pos());
        assert_eq!(snapshot.voxels(), chunk.voxels());
        assert_eq!(snapshot.voxel_count(), chunk.voxel_count());

        apply_sdf(&mut chunk, &sphere(Vec3::splat(4.0), 3.0), 0, false);
        assert_eq!(snapshot.material(4, 4, 4), 1);
        assert_eq!(chunk.material(4, 4, 4), 0);
    }
}
