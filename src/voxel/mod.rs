//! Voxel data structures and operations

pub mod voxel;
pub mod indexer;
pub mod grid;
pub mod job;
pub mod chunk;
pub mod sdf;
pub mod brush;
pub mod mesh;
pub mod config;
pub mod world;
pub mod edit;

pub use voxel::{Axis, EMPTY_MATERIAL, Voxel};
pub use indexer::{Indexer, LinearIndexer, MortonIndexer};
pub use grid::VoxelGrid;
pub use job::{Job, JobBatch};
pub use chunk::{ChunkPos, ChunkUpdate, VoxelChunk};
pub use sdf::{Sdf, TransformSdf};
pub use brush::{BrushPrimitive, CsgOp, CustomBrush};
pub use mesh::{ChunkMesh, FaceMesher, MaterialColors, Mesher};
pub use config::WorldConfig;
pub use world::{GridWrite, RayCastResult, VoxelWorld};
pub use edit::{ChunkSnapshot, EditConsumer, VoxelEdit, VoxelEditManager};
