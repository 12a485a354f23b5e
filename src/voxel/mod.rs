//! Block-compressed voxel grid: storage, injection and serialization

pub mod block;
pub mod grid;
pub mod inject;
pub mod pack;
pub mod sample;
pub(crate) mod store;
pub mod surface;

pub use block::{BLOCK_EXTENT, BLOCK_VOLUME};
pub use grid::{DEFAULT_MATERIAL, Grid};
pub use inject::{BLEND_STEP, InjectionType};
pub use pack::PackedGrid;
pub use sample::VoxelSample;
pub use surface::{BoxSurface, SphereSurface, VoxelSurface};
