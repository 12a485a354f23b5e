//! Surface abstraction that produces voxel samples at continuous coordinates

use super::sample::VoxelSample;
use crate::core::types::{MaterialId, Vec3};

/// A surface sampled during grid construction and surface injection.
///
/// Implementations must be deterministic for a fixed coordinate within one
/// call sequence; the grid calls `sample` once per affected voxel, possibly
/// from multiple threads.
pub trait VoxelSurface: Sync {
    /// Produce the voxel sample at a continuous surface-space coordinate
    fn sample(&self, position: Vec3) -> VoxelSample;
}

/// Quantize an analytic signed distance against a narrow band half-width
/// expressed in surface units.
#[inline]
fn quantize_banded(d: f32, band: f32) -> i8 {
    ((d / band).clamp(-1.0, 1.0) * 127.0).round() as i8
}

fn sdf_to_sample(d: f32, band: f32, material: MaterialId) -> VoxelSample {
    if d < 0.0 {
        VoxelSample::new(quantize_banded(d, band), material, 255)
    } else {
        VoxelSample::new(quantize_banded(d, band), 0, 0)
    }
}

/// Solid sphere
#[derive(Debug, Clone, Copy)]
pub struct SphereSurface {
    pub center: Vec3,
    pub radius: f32,
    pub material: MaterialId,
    /// Narrow band half-width in surface units
    pub band: f32,
}

impl SphereSurface {
    pub fn new(center: Vec3, radius: f32, material: MaterialId) -> Self {
        Self {
            center,
            radius,
            material,
            band: 1.0,
        }
    }

    pub fn with_band(mut self, band: f32) -> Self {
        self.band = band;
        self
    }
}

impl VoxelSurface for SphereSurface {
    fn sample(&self, position: Vec3) -> VoxelSample {
        let d = (position - self.center).length() - self.radius;
        sdf_to_sample(d, self.band, self.material)
    }
}

/// Solid axis-aligned box
#[derive(Debug, Clone, Copy)]
pub struct BoxSurface {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub material: MaterialId,
    /// Narrow band half-width in surface units
    pub band: f32,
}

impl BoxSurface {
    pub fn new(center: Vec3, half_extents: Vec3, material: MaterialId) -> Self {
        Self {
            center,
            half_extents,
            material,
            band: 1.0,
        }
    }

    pub fn with_band(mut self, band: f32) -> Self {
        self.band = band;
        self
    }
}

impl VoxelSurface for BoxSurface {
    fn sample(&self, position: Vec3) -> VoxelSample {
        let q = (position - self.center).abs() - self.half_extents;
        let d = q.max(Vec3::ZERO).length() + q.x.max(q.y.max(q.z)).min(0.0);
        sdf_to_sample(d, self.band, self.material)
    }
}
