//! Error types for the voxel grid

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("invalid dimensions {width}x{depth}x{height}: each must be a positive multiple of {extent}")]
    InvalidDimensions {
        width: u32,
        depth: u32,
        height: u32,
        extent: u32,
    },

    #[error("invalid sampling step {0}: must be positive and finite")]
    InvalidStep(f32),

    #[error("heightmap supplies {actual} values, {expected} required")]
    HeightmapTooSmall { expected: usize, actual: usize },

    #[error("packed grid rejected: {0}")]
    MalformedPack(&'static str),

    #[error("corrupt block payload: {0}")]
    CorruptBlock(String),

    #[error("coordinates ({x}, {y}, {z}) outside grid bounds")]
    OutOfBounds { x: i32, y: i32, z: i32 },

    #[error("buffer holds {actual} elements, block data requires {expected}")]
    BufferSize { expected: usize, actual: usize },
}
