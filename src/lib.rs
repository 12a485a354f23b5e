//! voxelgrid - block-compressed signed-distance voxel grids with CSG-style editing

pub mod core;
pub mod math;
pub mod voxel;

pub use crate::core::error::GridError;
pub use crate::math::Aabb;
pub use crate::voxel::{
    BoxSurface, Grid, InjectionType, PackedGrid, SphereSurface, VoxelSample, VoxelSurface,
};
