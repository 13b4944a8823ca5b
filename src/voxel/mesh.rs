//! Mesh extraction seam.
//!
//! Polygonization is an external concern: a chunk hands its padded buffer to
//! a [`Mesher`] and stores whatever [`ChunkMesh`] comes back. [`FaceMesher`]
//! is a simple reference implementation that emits one quad per surface edge.

use std::collections::HashMap;

use glam::Vec3;

use crate::voxel::grid::VoxelGrid;
use crate::voxel::indexer::Indexer;
use crate::voxel::voxel::Axis;

/// Struct-of-arrays triangle mesh in chunk-local coordinates
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub colors: Vec<[u8; 4]>,
    pub materials: Vec<u32>,
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append a quad given counter-clockwise corners
    pub fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3, color: [u8; 4], material: u32) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&corners);
        self.normals.extend(std::iter::repeat_n(normal, 4));
        self.colors.extend(std::iter::repeat_n(color, 4));
        self.materials.extend(std::iter::repeat_n(material, 4));
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Polygonizer contract.
///
/// `voxels` is a chunk's padded buffer of `chunk_size + 1` voxels per side.
/// Implementations may be called repeatedly on the same chunk and from
/// several threads at once.
pub trait Mesher<I: Indexer>: Send + Sync {
    fn polygonize(&self, voxels: &VoxelGrid<I>, chunk_size: u32) -> ChunkMesh;
}

/// Per-material vertex colors
#[derive(Clone, Debug, Default)]
pub struct MaterialColors {
    colors: HashMap<u32, [u8; 4]>,
}

impl MaterialColors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, material: u32, color: [u8; 4]) {
        self.colors.insert(material, color);
    }

    /// Registered color, or a stable hashed color for unknown materials
    pub fn color(&self, material: u32) -> [u8; 4] {
        self.colors
            .get(&material)
            .copied()
            .unwrap_or_else(|| hashed_color(material))
    }
}

fn hashed_color(material: u32) -> [u8; 4] {
    let mut h = material.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    h = h.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    // Keep colors away from black
    let [r, g, b, _] = h.to_le_bytes();
    [r | 0x40, g | 0x40, b | 0x40, 255]
}

/// Emits one unit quad per owned edge whose endpoint materials differ,
/// placed at the stored crossing and facing away from the solid side.
#[derive(Clone, Debug, Default)]
pub struct FaceMesher {
    pub colors: MaterialColors,
}

impl FaceMesher {
    pub fn new(colors: MaterialColors) -> Self {
        Self { colors }
    }
}

impl<I: Indexer> Mesher<I> for FaceMesher {
    fn polygonize(&self, voxels: &VoxelGrid<I>, chunk_size: u32) -> ChunkMesh {
        let mut mesh = ChunkMesh::default();
        let cs = chunk_size;
        if voxels.dims().min_element() < cs + 1 {
            return mesh;
        }

        for z in 0..cs {
            for y in 0..cs {
                for x in 0..cs {
                    let voxel = voxels.get(x, y, z);
                    for axis in Axis::ALL {
                        let step = axis.to_uvec3();
                        let other = voxels.get(x + step.x, y + step.y, z + step.z);
                        if voxel.material == other.material {
                            continue;
                        }

                        // Solid side decides facing, material and color
                        let (facing, material) = if voxel.is_set() {
                            (1.0, voxel.material)
                        } else {
                            (-1.0, other.material)
                        };
                        // Edges without Hermite data get a midpoint axis-aligned face
                        let (mut t, mut normal) = voxel.edge(axis);
                        if normal == Vec3::ZERO {
                            t = 0.5;
                            normal = axis.to_vec3() * facing;
                        }
                        let center = Vec3::new(x as f32, y as f32, z as f32) + axis.to_vec3() * t;
                        mesh.push_quad(
                            quad_corners(center, axis, facing),
                            normal,
                            self.colors.color(material),
                            material,
                        );
                    }
                }
            }
        }
        mesh
    }
}

/// Unit quad perpendicular to `axis`, wound counter-clockwise seen from
/// `axis * facing`
fn quad_corners(center: Vec3, axis: Axis, facing: f32) -> [Vec3; 4] {
    let (u, v) = match axis {
        Axis::X => (Vec3::Y, Vec3::Z),
        Axis::Y => (Vec3::Z, Vec3::X),
        Axis::Z => (Vec3::X, Vec3::Y),
    };
    let (u, v) = (u * 0.5, v * 0.5);
    let corners = [center - u - v, center + u - v, center + u + v, center - u + v];
    if facing > 0.0 {
        corners
    } else {
        [corners[0], corners[3], corners[2], corners[1]]
    }
}
