//! Dense 3D voxel array addressed through an [`Indexer`]

use glam::{IVec3, UVec3};

use crate::voxel::indexer::Indexer;
use crate::voxel::voxel::Voxel;

/// Dense `width x height x depth` voxel array.
///
/// Used both as a chunk's padded buffer and as the free-standing source grid
/// handed to `VoxelWorld::apply_grid`. The storage layout is chosen by `I`.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid<I: Indexer> {
    width: u32,
    height: u32,
    depth: u32,
    indexer: I,
    voxels: Vec<Voxel>,
}

impl<I: Indexer> VoxelGrid<I> {
    /// Create a grid filled with empty voxels
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        Self::filled(width, height, depth, Voxel::EMPTY)
    }

    /// Create a cubic grid filled with empty voxels
    pub fn cube(size: u32) -> Self {
        Self::new(size, size, size)
    }

    /// Create a grid with every voxel set to `voxel`
    pub fn filled(width: u32, height: u32, depth: u32, voxel: Voxel) -> Self {
        let indexer = I::new(width, height, depth);
        Self {
            width,
            height,
            depth,
            indexer,
            voxels: vec![voxel; indexer.storage_len()],
        }
    }

    /// Create a grid from a per-position generator
    pub fn from_fn(width: u32, height: u32, depth: u32, mut f: impl FnMut(UVec3) -> Voxel) -> Self {
        let mut grid = Self::new(width, height, depth);
        for p in grid.iter_positions() {
            grid.set(p.x, p.y, p.z, f(p));
        }
        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn dims(&self) -> UVec3 {
        UVec3::new(self.width, self.height, self.depth)
    }

    /// Number of addressable positions (not storage slots)
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether a signed coordinate lies inside the grid
    pub fn in_bounds(&self, p: IVec3) -> bool {
        p.cmpge(IVec3::ZERO).all() && p.as_uvec3().cmplt(self.dims()).all()
    }

    /// Storage slot of (x, y, z)
    #[inline]
    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        self.indexer.index(x, y, z)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32, z: u32) -> Voxel {
        self.voxels[self.index(x, y, z)]
    }

    #[inline]
    pub fn get_mut(&mut self, x: u32, y: u32, z: u32) -> &mut Voxel {
        let index = self.index(x, y, z);
        &mut self.voxels[index]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, z: u32, voxel: Voxel) {
        *self.get_mut(x, y, z) = voxel;
    }

    /// Voxel at a signed coordinate, `None` outside the grid
    pub fn try_get(&self, p: IVec3) -> Option<Voxel> {
        self.in_bounds(p)
            .then(|| self.get(p.x as u32, p.y as u32, p.z as u32))
    }

    /// Read a raw storage slot
    #[inline]
    pub fn at(&self, index: usize) -> Voxel {
        self.voxels[index]
    }

    /// Write a raw storage slot
    #[inline]
    pub fn set_at(&mut self, index: usize, voxel: Voxel) {
        self.voxels[index] = voxel;
    }

    /// All positions in x-fastest order
    pub fn iter_positions(&self) -> impl Iterator<Item = UVec3> + use<I> {
        let (w, h, d) = (self.width, self.height, self.depth);
        (0..d).flat_map(move |z| (0..h).flat_map(move |y| (0..w).map(move |x| UVec3::new(x, y, z))))
    }

    pub fn fill(&mut self, voxel: Voxel) {
        self.voxels.fill(voxel);
    }

    /// Number of positions holding material
    pub fn count_set(&self) -> usize {
        self.iter_positions()
            .filter(|p| self.get(p.x, p.y, p.z).is_set())
            .count()
    }

    /// Copy into a grid with a different storage layout
    pub fn convert<J: Indexer>(&self) -> VoxelGrid<J> {
        VoxelGrid::from_fn(self.width, self.height, self.depth, |p| self.get(p.x, p.y, p.z))
    }

    /// Raw storage in indexer order
    pub fn as_slice(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Raw storage viewed as bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.voxels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::indexer::{LinearIndexer, MortonIndexer};

    #[test]
    fn test_new_is_empty() {
        let grid = VoxelGrid::<LinearIndexer>::new(3, 4, 5);
        assert_eq!(grid.dims(), UVec3::new(3, 4, 5));
        assert_eq!(grid.len(), 60);
        assert_eq!(grid.count_set(), 0);
    }

    #[test]
    fn test_set_get() {
        let mut grid = VoxelGrid::<MortonIndexer>::cube(5);
        grid.set(4, 0, 2, Voxel::new(7));
        assert_eq!(grid.get(4, 0, 2).material, 7);
        assert_eq!(grid.count_set(), 1);
        assert_eq!(grid.try_get(IVec3::new(4, 0, 2)), Some(Voxel::new(7)));
    }

    #[test]
    fn test_bounds() {
        let grid = VoxelGrid::<LinearIndexer>::new(2, 3, 4);
        assert!(grid.in_bounds(IVec3::new(1, 2, 3)));
        assert!(!grid.in_bounds(IVec3::new(2, 0, 0)));
        assert!(!grid.in_bounds(IVec3::new(0, -1, 0)));
        assert_eq!(grid.try_get(IVec3::new(0, 0, 4)), None);
    }

    #[test]
    fn test_iter_positions_order() {
        let grid = VoxelGrid::<LinearIndexer>::new(2, 2, 2);
        let positions: Vec<_> = grid.iter_positions().collect();
        assert_eq!(positions.len(), 8);
        assert_eq!(positions[0], UVec3::ZERO);
        assert_eq!(positions[1], UVec3::new(1, 0, 0));
        assert_eq!(positions[7], UVec3::ONE);
    }

    #[test]
    fn test_convert_preserves_contents() {
        let linear = VoxelGrid::<LinearIndexer>::from_fn(4, 3, 2, |p| Voxel::new(p.x + p.y * 4 + p.z * 12));
        let morton: VoxelGrid<MortonIndexer> = linear.convert();
        for p in linear.iter_positions() {
            assert_eq!(linear.get(p.x, p.y, p.z), morton.get(p.x, p.y, p.z));
        }
        assert_eq!(morton.convert::<LinearIndexer>(), linear);
    }

    #[test]
    fn test_padded_morton_grid_has_no_spare_slots() {
        let grid = VoxelGrid::<MortonIndexer>::cube(17);
        assert_eq!(grid.as_slice().len(), grid.len());
        assert_eq!(grid.as_bytes().len(), 17 * 17 * 17 * std::mem::size_of::<Voxel>());
    }

    #[test]
    fn test_as_bytes() {
        let grid = VoxelGrid::<LinearIndexer>::cube(2);
        assert_eq!(grid.as_bytes().len(), 8 * std::mem::size_of::<Voxel>());
    }
}
