//! Injection engine: clips edit regions and merges new samples into blocks

use super::block::{BLOCK_EXTENT, Block, block_index};
use super::sample::VoxelSample;
use super::store::BlockStore;
use super::surface::VoxelSurface;
use crate::core::types::{BlendFactor, MaterialId, Result, UVec3, Vec3};
use crate::math::Aabb;
use rayon::prelude::*;

/// How far one material injection call moves a voxel's blend factor
pub const BLEND_STEP: BlendFactor = 32;

/// Kind of boolean-style merge applied by a surface injection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionType {
    /// Union: keep the more solid of stored and incoming
    Add,
    /// Replace the interior with the incoming surface, carve elsewhere
    SubtractAddInner,
    /// Carve: remove the incoming surface's interior
    Subtract,
}

/// Construction-time mapping between continuous surface space and voxel space
#[derive(Debug, Clone, Copy)]
pub(crate) struct GridMapping {
    pub origin: Vec3,
    pub step: f32,
}

impl GridMapping {
    /// Identity mapping for grids not built from a continuous surface
    pub fn voxel_units() -> Self {
        Self {
            origin: Vec3::ZERO,
            step: 1.0,
        }
    }

    /// Surface-space coordinate sampled for a voxel
    pub fn voxel_position(&self, voxel: UVec3) -> Vec3 {
        self.origin + voxel.as_vec3() * self.step
    }

    fn to_voxel(&self, p: Vec3) -> Vec3 {
        (p - self.origin) / self.step
    }

    /// Grid bounds in surface space
    fn surface_bounds(&self, dims: UVec3) -> Aabb {
        Aabb::new(self.origin, self.origin + dims.as_vec3() * self.step)
    }
}

/// Half-open box of voxel coordinates touched by an edit
struct VoxelBox {
    min: UVec3,
    max: UVec3,
}

/// Clip a requested edit box against the grid. Returns the touched voxel
/// box (None when the edit misses the grid entirely) and the real affected
/// region in continuous surface-space coordinates.
fn clip_region(
    mapping: &GridMapping,
    dims: UVec3,
    position: Vec3,
    extents: Vec3,
) -> (Option<VoxelBox>, Aabb) {
    let bounds = mapping.surface_bounds(dims);
    let request = Aabb::new(position, position + extents);

    match request.intersection(&bounds) {
        None => {
            let clamped = position.clamp(bounds.min, bounds.max);
            (None, Aabb::point(clamped))
        }
        Some(region) => {
            let min = mapping
                .to_voxel(region.min)
                .floor()
                .max(Vec3::ZERO)
                .as_uvec3();
            let max = mapping
                .to_voxel(region.max)
                .ceil()
                .min(dims.as_vec3())
                .as_uvec3();
            (Some(VoxelBox { min, max }), region)
        }
    }
}

/// Per-voxel merge of a stored sample with an incoming candidate
pub(crate) fn merge_samples(
    stored: VoxelSample,
    incoming: VoxelSample,
    ty: InjectionType,
) -> VoxelSample {
    match ty {
        InjectionType::Add => {
            if incoming.distance < stored.distance {
                incoming
            } else {
                stored
            }
        }
        InjectionType::Subtract => carve(stored, incoming),
        InjectionType::SubtractAddInner => {
            if incoming.is_solid() {
                incoming
            } else {
                carve(stored, incoming)
            }
        }
    }
}

/// Subtract rule: the stored sample becomes the less solid of itself and
/// the inverted incoming distance. Material is untouched outside the carve.
fn carve(stored: VoxelSample, incoming: VoxelSample) -> VoxelSample {
    let inverted = incoming.distance.saturating_neg();
    if inverted > stored.distance {
        VoxelSample {
            distance: inverted,
            ..stored
        }
    } else {
        stored
    }
}

/// Merge a surface into the store over the clipped request box
pub(crate) fn inject_surface(
    store: &mut BlockStore,
    mapping: &GridMapping,
    dims: UVec3,
    position: Vec3,
    extents: Vec3,
    surface: &dyn VoxelSurface,
    ty: InjectionType,
) -> Result<Aabb> {
    let (voxels, region) = clip_region(mapping, dims, position, extents);
    let Some(voxels) = voxels else {
        return Ok(region);
    };

    log::debug!(
        "inject_surface {:?} over voxels {}..{}",
        ty,
        voxels.min,
        voxels.max
    );

    apply_to_blocks(store, &voxels, |voxel, stored| {
        let incoming = surface.sample(mapping.voxel_position(voxel));
        *stored = merge_samples(*stored, incoming, ty);
    })?;
    Ok(region)
}

/// Overwrite the material channel over the clipped request box, nudging the
/// blend factor up or down
pub(crate) fn inject_material(
    store: &mut BlockStore,
    mapping: &GridMapping,
    dims: UVec3,
    position: Vec3,
    extents: Vec3,
    material: MaterialId,
    add_blend: bool,
) -> Result<Aabb> {
    let (voxels, region) = clip_region(mapping, dims, position, extents);
    let Some(voxels) = voxels else {
        return Ok(region);
    };

    log::debug!(
        "inject_material {} over voxels {}..{}",
        material,
        voxels.min,
        voxels.max
    );

    apply_to_blocks(store, &voxels, |_, stored| {
        stored.material = material;
        stored.blend = if add_blend {
            stored.blend.saturating_add(BLEND_STEP)
        } else {
            stored.blend.saturating_sub(BLEND_STEP)
        };
    })?;
    Ok(region)
}

/// Run a merge over every voxel of the box, one block at a time. Each
/// touched block expands once, merges its voxels and recompresses once;
/// blocks are independent so they are processed in parallel.
fn apply_to_blocks<F>(store: &mut BlockStore, region: &VoxelBox, merge: F) -> Result<()>
where
    F: Fn(UVec3, &mut VoxelSample) + Sync,
{
    let bmin = region.min / BLOCK_EXTENT;
    let bmax = (region.max - UVec3::ONE) / BLOCK_EXTENT;
    let block_dims = store.block_dims();
    let (vmin, vmax) = (region.min, region.max);

    store
        .blocks_mut()
        .par_iter_mut()
        .enumerate()
        .try_for_each(|(slot, block)| {
            let slot = slot as u32;
            let coords = UVec3::new(
                slot % block_dims.x,
                (slot / block_dims.x) % block_dims.y,
                slot / (block_dims.x * block_dims.y),
            );
            if coords.cmplt(bmin).any() || coords.cmpgt(bmax).any() {
                return Ok(());
            }

            let base = coords * BLOCK_EXTENT;
            let lo = vmin.max(base);
            let hi = vmax.min(base + UVec3::splat(BLOCK_EXTENT));

            let mut samples = block.expand()?;
            for z in lo.z..hi.z {
                for y in lo.y..hi.y {
                    for x in lo.x..hi.x {
                        let idx = block_index(x - base.x, y - base.y, z - base.z);
                        merge(UVec3::new(x, y, z), &mut samples[idx]);
                    }
                }
            }
            *block = Block::compress(&samples);
            Ok(())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keeps_more_solid() {
        let stored = VoxelSample::new(10, 1, 0);
        let incoming = VoxelSample::new(-20, 5, 255);
        let merged = merge_samples(stored, incoming, InjectionType::Add);
        assert_eq!(merged, incoming);

        // Stored already more solid: untouched
        let merged = merge_samples(incoming, stored, InjectionType::Add);
        assert_eq!(merged, incoming);
    }

    #[test]
    fn test_add_is_idempotent() {
        let stored = VoxelSample::new(-5, 2, 100);
        let incoming = VoxelSample::new(-20, 5, 255);
        let once = merge_samples(stored, incoming, InjectionType::Add);
        let twice = merge_samples(once, incoming, InjectionType::Add);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_subtract_carves_interior() {
        let stored = VoxelSample::new(-50, 3, 200);
        let incoming = VoxelSample::new(-30, 9, 255);
        let merged = merge_samples(stored, incoming, InjectionType::Subtract);
        // Inverted incoming (+30) wins over stored (-50), material stays
        assert_eq!(merged.distance, 30);
        assert_eq!(merged.material, 3);
        assert_eq!(merged.blend, 200);
    }

    #[test]
    fn test_subtract_leaves_exterior() {
        let stored = VoxelSample::new(-50, 3, 200);
        let incoming = VoxelSample::new(100, 0, 0);
        let merged = merge_samples(stored, incoming, InjectionType::Subtract);
        assert_eq!(merged, stored);
    }

    #[test]
    fn test_subtract_add_inner_replaces_interior() {
        let stored = VoxelSample::new(-50, 3, 200);
        let solid = VoxelSample::new(-10, 9, 255);
        let merged = merge_samples(stored, solid, InjectionType::SubtractAddInner);
        assert_eq!(merged, solid);

        // Exterior side behaves like a subtract
        let outside = VoxelSample::new(40, 9, 255);
        let merged = merge_samples(stored, outside, InjectionType::SubtractAddInner);
        assert_eq!(merged.distance, -40);
        assert_eq!(merged.material, 3);
    }

    #[test]
    fn test_clip_region_inside() {
        let mapping = GridMapping::voxel_units();
        let dims = UVec3::splat(32);
        let (voxels, region) =
            clip_region(&mapping, dims, Vec3::splat(4.5), Vec3::splat(10.0));
        let voxels = voxels.unwrap();
        assert_eq!(voxels.min, UVec3::splat(4));
        assert_eq!(voxels.max, UVec3::splat(15));
        assert_eq!(region, Aabb::new(Vec3::splat(4.5), Vec3::splat(14.5)));
    }

    #[test]
    fn test_clip_region_clips_to_bounds() {
        let mapping = GridMapping::voxel_units();
        let dims = UVec3::splat(16);
        let (voxels, region) =
            clip_region(&mapping, dims, Vec3::splat(-5.0), Vec3::splat(40.0));
        let voxels = voxels.unwrap();
        assert_eq!(voxels.min, UVec3::ZERO);
        assert_eq!(voxels.max, UVec3::splat(16));
        assert_eq!(region, Aabb::new(Vec3::ZERO, Vec3::splat(16.0)));
    }

    #[test]
    fn test_clip_region_outside_is_degenerate() {
        let mapping = GridMapping::voxel_units();
        let dims = UVec3::splat(16);
        let (voxels, region) =
            clip_region(&mapping, dims, Vec3::splat(100.0), Vec3::splat(5.0));
        assert!(voxels.is_none());
        assert!(region.is_degenerate());
        assert_eq!(region.min, region.max);
    }

    #[test]
    fn test_clip_region_respects_mapping() {
        let mapping = GridMapping {
            origin: Vec3::splat(10.0),
            step: 0.5,
        };
        let dims = UVec3::splat(16);
        let (voxels, region) =
            clip_region(&mapping, dims, Vec3::splat(11.0), Vec3::splat(2.0));
        let voxels = voxels.unwrap();
        // (11 - 10) / 0.5 = voxel 2, (13 - 10) / 0.5 = voxel 6
        assert_eq!(voxels.min, UVec3::splat(2));
        assert_eq!(voxels.max, UVec3::splat(6));
        assert_eq!(region, Aabb::new(Vec3::splat(11.0), Vec3::splat(13.0)));
    }
}
