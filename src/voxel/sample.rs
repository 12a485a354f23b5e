//! Voxel sample data type and distance quantization

use crate::core::types::{BlendFactor, MaterialId};
use bytemuck::{Pod, Zeroable};

/// Half-width of the quantized narrow band, in voxel steps.
/// Distances beyond the band saturate to the extreme stored values.
pub const NARROW_BAND: f32 = 4.0;

/// Single voxel sample - exactly 3 bytes
///
/// `distance` follows the usual signed-distance convention: negative inside
/// solid matter, positive outside, zero on the boundary surface. `blend` is
/// only meaningful near a boundary between two materials.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct VoxelSample {
    /// Quantized signed distance, [-127, 127] over the narrow band
    pub distance: i8,
    /// Dominant material ID
    pub material: MaterialId,
    /// Mixing factor toward the secondary material
    pub blend: BlendFactor,
}

impl VoxelSample {
    /// Fully outside, no material - the default fill of an empty grid
    pub const EMPTY: VoxelSample = VoxelSample {
        distance: i8::MAX,
        material: 0,
        blend: 0,
    };

    pub fn new(distance: i8, material: MaterialId, blend: BlendFactor) -> Self {
        Self {
            distance,
            material,
            blend,
        }
    }

    /// Check if the sample lies inside solid matter
    pub fn is_solid(&self) -> bool {
        self.distance < 0
    }
}

/// Quantize a continuous signed distance (in voxel steps) for storage.
#[inline]
pub fn quantize_distance(d: f32) -> i8 {
    ((d / NARROW_BAND).clamp(-1.0, 1.0) * 127.0).round() as i8
}

/// Recover the approximate continuous distance (in voxel steps).
#[inline]
pub fn dequantize_distance(q: i8) -> f32 {
    q as f32 / 127.0 * NARROW_BAND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size() {
        assert_eq!(std::mem::size_of::<VoxelSample>(), 3);
    }

    #[test]
    fn test_empty() {
        assert!(!VoxelSample::EMPTY.is_solid());
        assert_eq!(VoxelSample::EMPTY.distance, i8::MAX);
        assert_eq!(VoxelSample::EMPTY.material, 0);
        assert_eq!(VoxelSample::EMPTY.blend, 0);
    }

    #[test]
    fn test_quantize_signs() {
        assert!(quantize_distance(-1.0) < 0);
        assert!(quantize_distance(1.0) > 0);
        assert_eq!(quantize_distance(0.0), 0);
    }

    #[test]
    fn test_quantize_saturates() {
        assert_eq!(quantize_distance(100.0), 127);
        assert_eq!(quantize_distance(-100.0), -127);
    }

    #[test]
    fn test_quantize_roundtrip() {
        for d in [-3.5f32, -1.0, -0.25, 0.0, 0.5, 2.0, 3.9] {
            let restored = dequantize_distance(quantize_distance(d));
            // One quantum is NARROW_BAND / 127
            assert!((restored - d).abs() < NARROW_BAND / 127.0);
        }
    }
}
