//! Addressing strategies mapping chunk-local coordinates to storage slots.
//!
//! Indexers are plain `Copy` values carrying only their cached dimensions,
//! and grids are generic over them so that addressing is resolved at
//! compile time on the hot path.

use crate::math::morton::encode_morton_3d_u32;

/// Maps a 3D coordinate inside a `width x height x depth` box to a unique
/// storage offset.
///
/// Coordinates outside the box are a caller contract violation; debug builds
/// assert on them.
pub trait Indexer: Copy + Send + Sync + std::fmt::Debug + 'static {
    /// Create an indexer for the given dimensions
    fn new(width: u32, height: u32, depth: u32) -> Self;

    /// Storage offset of (x, y, z)
    fn index(&self, x: u32, y: u32, z: u32) -> usize;

    /// Number of storage slots a grid of these dimensions needs
    fn storage_len(&self) -> usize;
}

/// Row-major addressing: x varies fastest, then y, then z
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinearIndexer {
    width: u32,
    height: u32,
    depth: u32,
}

impl Indexer for LinearIndexer {
    fn new(width: u32, height: u32, depth: u32) -> Self {
        Self { width, height, depth }
    }

    #[inline]
    fn index(&self, x: u32, y: u32, z: u32) -> usize {
        debug_assert!(x < self.width && y < self.height && z < self.depth);
        x as usize + self.width as usize * (y as usize + self.height as usize * z as usize)
    }

    fn storage_len(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }
}

/// Z-order addressing. Neighboring voxels tend to share cache lines, which
/// suits the 2x2x2 cell reads done during meshing.
///
/// Storage is dense for any dimensions: a coordinate's offset is the number
/// of in-box coordinates with a smaller Morton code, so offsets keep Z-order
/// and fill exactly `[0, width * height * depth)`. Power-of-two cubes use
/// the Morton code directly since every code is then in the box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MortonIndexer {
    dims: [u32; 3],
    /// Octree levels covering the largest axis
    levels: u32,
    pow2_cube: bool,
}

impl Indexer for MortonIndexer {
    fn new(width: u32, height: u32, depth: u32) -> Self {
        let max = width.max(height).max(depth);
        Self {
            dims: [width, height, depth],
            levels: u32::BITS - max.saturating_sub(1).leading_zeros(),
            pow2_cube: width == height && height == depth && max.is_power_of_two(),
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32, z: u32) -> usize {
        let [w, h, d] = self.dims;
        debug_assert!(x < w && y < h && z < d);
        if self.pow2_cube {
            return encode_morton_3d_u32(x, y, z) as usize;
        }

        // Descend the implicit octree, counting in-box cells of every
        // earlier sibling in Z-order
        let p = [x, y, z];
        let mut origin = [0u32; 3];
        let mut rank = 0usize;
        for level in (0..self.levels).rev() {
            let half = 1u32 << level;
            let child = ((x >> level) & 1) | (((y >> level) & 1) << 1) | (((z >> level) & 1) << 2);
            for sibling in 0..child {
                let mut count = 1usize;
                for axis in 0..3 {
                    let lo = origin[axis] + ((sibling >> axis) & 1) * half;
                    count *= self.dims[axis].saturating_sub(lo).min(half) as usize;
                }
                rank += count;
            }
            for axis in 0..3 {
                origin[axis] += p[axis] & half;
            }
        }
        rank
    }

    fn storage_len(&self) -> usize {
        self.dims.iter().map(|&n| n as usize).product()
    }
}
