//! Core type aliases and re-exports

pub use glam::{IVec3, UVec3, Vec3};

/// Material identifier stored per voxel
pub type MaterialId = u8;

/// Blend factor between a voxel's dominant material and the secondary
/// material implied by its edit history
pub type BlendFactor = u8;

/// Standard Result type for the crate
pub type Result<T> = std::result::Result<T, crate::core::error::GridError>;
