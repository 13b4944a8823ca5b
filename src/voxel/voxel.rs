//! Voxel data type

use bytemuck::{Pod, Zeroable};
use glam::{UVec3, Vec3};

/// Material id of air
pub const EMPTY_MATERIAL: u32 = 0;

/// Grid axis. Each voxel owns the edge leading from it to its +axis neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Slot of this axis in per-edge arrays
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Get unit vector for this axis
    pub fn to_vec3(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// Integer unit step along this axis
    pub fn to_uvec3(self) -> UVec3 {
        match self {
            Axis::X => UVec3::X,
            Axis::Y => UVec3::Y,
            Axis::Z => UVec3::Z,
        }
    }
}

/// Single grid sample consumed by the mesher.
///
/// Besides the material, a voxel stores Hermite data for the three edges it
/// owns (towards +X, +Y and +Z): where along the edge the surface crosses,
/// as a fraction in `[0, 1]` measured from this voxel, and the surface normal
/// at that crossing. Edge data is only meaningful when the two endpoint
/// materials differ; otherwise it is zeroed.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Voxel {
    /// Material ID, 0 = empty
    pub material: u32,
    /// Surface crossing per owned edge
    pub intersections: [f32; 3],
    /// Surface normal per owned edge
    pub normals: [Vec3; 3],
}

impl Voxel {
    /// Empty/air voxel
    pub const EMPTY: Voxel = Voxel {
        material: EMPTY_MATERIAL,
        intersections: [0.0; 3],
        normals: [Vec3::ZERO; 3],
    };

    /// Create a voxel of the given material with no edge data
    pub fn new(material: u32) -> Self {
        Self {
            material,
            ..Self::EMPTY
        }
    }

    /// Check if voxel is empty (air)
    pub fn is_empty(&self) -> bool {
        self.material == EMPTY_MATERIAL
    }

    /// Whether this voxel carries material. Sparse grid writes only copy set voxels.
    pub fn is_set(&self) -> bool {
        !self.is_empty()
    }

    /// Crossing and normal of the edge along `axis`
    pub fn edge(&self, axis: Axis) -> (f32, Vec3) {
        let i = axis.index();
        (self.intersections[i], self.normals[i])
    }

    /// Set the crossing and normal of the edge along `axis`
    pub fn set_edge(&mut self, axis: Axis, intersection: f32, normal: Vec3) {
        let i = axis.index();
        self.intersections[i] = intersection;
        self.normals[i] = normal;
    }

    /// Copy with the edge along `axis` replaced
    pub fn with_edge(mut self, axis: Axis, intersection: f32, normal: Vec3) -> Self {
        self.set_edge(axis, intersection, normal);
        self
    }

    /// Zero the edge along `axis`
    pub fn clear_edge(&mut self, axis: Axis) {
        self.set_edge(axis, 0.0, Vec3::ZERO);
    }
}

/// +1 if a voxel goes from empty to set, -1 for the reverse, else 0.
/// Keeps a chunk's live voxel count in step with its writes.
#[inline]
pub fn voxel_count_delta(current_material: u32, new_material: u32) -> i64 {
    match (current_material == EMPTY_MATERIAL, new_material == EMPTY_MATERIAL) {
        (true, false) => 1,
        (false, true) => -1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size() {
        assert_eq!(std::mem::size_of::<Voxel>(), 52);
    }

    #[test]
    fn test_empty() {
        assert!(Voxel::EMPTY.is_empty());
        assert_eq!(Voxel::default(), Voxel::EMPTY);
        assert!(Voxel::new(3).is_set());
    }

    #[test]
    fn test_edges() {
        let voxel = Voxel::new(1).with_edge(Axis::Y, 0.25, Vec3::Y);
        assert_eq!(voxel.edge(Axis::Y), (0.25, Vec3::Y));
        assert_eq!(voxel.edge(Axis::X), (0.0, Vec3::ZERO));

        let mut cleared = voxel;
        cleared.clear_edge(Axis::Y);
        assert_eq!(cleared, Voxel::new(1));
    }

    #[test]
    fn test_count_delta() {
        assert_eq!(voxel_count_delta(0, 2), 1);
        assert_eq!(voxel_count_delta(2, 0), -1);
        assert_eq!(voxel_count_delta(2, 5), 0);
        assert_eq!(voxel_count_delta(0, 0), 0);
    }
}
