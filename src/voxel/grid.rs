//! Voxel grid façade
//!
//! A `Grid` owns one block store and dispatches every public operation to
//! the injection engine, the packer or the store. Voxels inside are kept
//! compressed; Z is up. All channel buffers exchanged through the block
//! data calls hold `BLOCK_EXTENT`^3 elements in x-fastest scan order.

use super::block::{BLOCK_EXTENT, BLOCK_VOLUME, Block, block_index};
use super::inject::{self, GridMapping, InjectionType};
use super::pack::{self, PackedGrid};
use super::sample::{VoxelSample, quantize_distance};
use super::store::BlockStore;
use super::surface::VoxelSurface;
use crate::core::error::GridError;
use crate::core::types::{BlendFactor, IVec3, MaterialId, Result, UVec3, Vec3};
use crate::math::Aabb;
use rayon::prelude::*;

/// Material assigned to heightmap-generated voxels
pub const DEFAULT_MATERIAL: MaterialId = 1;

/// A block-compressed grid of signed-distance voxel samples
pub struct Grid {
    width: u32,
    depth: u32,
    height: u32,
    mapping: GridMapping,
    store: BlockStore,
}

impl Grid {
    /// Grid generated by sampling a surface at `start + (i,j,k) * step`
    pub fn from_surface(
        width: u32,
        depth: u32,
        height: u32,
        start: Vec3,
        step: f32,
        surface: &dyn VoxelSurface,
    ) -> Result<Self> {
        let dims = validate_dims(width, depth, height)?;
        if !step.is_finite() || step <= 0.0 {
            return Err(GridError::InvalidStep(step));
        }

        let mapping = GridMapping {
            origin: start,
            step,
        };
        let blocks = build_blocks(dims / BLOCK_EXTENT, |voxel| {
            surface.sample(mapping.voxel_position(voxel))
        });
        log::debug!(
            "built {}x{}x{} grid from surface, {} blocks",
            width,
            depth,
            height,
            blocks.len()
        );

        Ok(Self {
            width,
            depth,
            height,
            mapping,
            store: BlockStore::from_blocks(
                width / BLOCK_EXTENT,
                depth / BLOCK_EXTENT,
                height / BLOCK_EXTENT,
                blocks,
            ),
        })
    }

    /// Empty grid: every voxel fully outside with no material
    pub fn empty(width: u32, depth: u32, height: u32) -> Result<Self> {
        validate_dims(width, depth, height)?;
        Ok(Self {
            width,
            depth,
            height,
            mapping: GridMapping::voxel_units(),
            store: BlockStore::new_uniform(
                width / BLOCK_EXTENT,
                depth / BLOCK_EXTENT,
                height / BLOCK_EXTENT,
                VoxelSample::EMPTY,
            ),
        })
    }

    /// Cubic grid generated from one height value per (x, y) column.
    /// A voxel at height z gets distance `z - height(x, y)`.
    pub fn from_heightmap(width: u32, heightmap: &[u8]) -> Result<Self> {
        let dims = validate_dims(width, width, width)?;
        let expected = width as usize * width as usize;
        if heightmap.len() < expected {
            return Err(GridError::HeightmapTooSmall {
                expected,
                actual: heightmap.len(),
            });
        }

        let blocks = build_blocks(dims / BLOCK_EXTENT, |voxel| {
            let column = heightmap[voxel.x as usize + width as usize * voxel.y as usize] as f32;
            VoxelSample::new(
                quantize_distance(voxel.z as f32 - column),
                DEFAULT_MATERIAL,
                0,
            )
        });

        Ok(Self {
            width,
            depth: width,
            height: width,
            mapping: GridMapping::voxel_units(),
            store: BlockStore::from_blocks(
                width / BLOCK_EXTENT,
                width / BLOCK_EXTENT,
                width / BLOCK_EXTENT,
                blocks,
            ),
        })
    }

    /// Reconstruct a grid from a packed buffer. Fails cleanly on any
    /// structural mismatch; a loaded grid is addressed in voxel units.
    pub fn load(blob: &[u8]) -> Result<Self> {
        let unpacked = pack::unpack(blob)?;
        Ok(Self {
            width: unpacked.width,
            depth: unpacked.depth,
            height: unpacked.height,
            mapping: GridMapping::voxel_units(),
            store: unpacked.store,
        })
    }

    /// Serialize into a self-contained buffer without recompressing blocks
    pub fn pack_for_save(&self) -> PackedGrid {
        pack::pack(&self.store, self.width, self.depth, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The block extent in voxels. Blocks are always cubes.
    pub fn block_extent(&self) -> u32 {
        BLOCK_EXTENT
    }

    /// Total compressed size of all blocks in bytes. Forces no expansion.
    pub fn blocks_memory_size(&self) -> usize {
        self.store.memory_size()
    }

    /// Merge a surface into the grid over the given surface-space box.
    /// Returns the clipped region actually affected; a request entirely
    /// outside the grid touches nothing and yields a degenerate region.
    pub fn inject_surface(
        &mut self,
        position: Vec3,
        extents: Vec3,
        surface: &dyn VoxelSurface,
        ty: InjectionType,
    ) -> Result<Aabb> {
        let dims = self.dims();
        let mapping = self.mapping;
        inject::inject_surface(&mut self.store, &mapping, dims, position, extents, surface, ty)
    }

    /// Overwrite the material channel over the given surface-space box,
    /// moving blend factors up (`add_blend`) or down
    pub fn inject_material(
        &mut self,
        position: Vec3,
        extents: Vec3,
        material: MaterialId,
        add_blend: bool,
    ) -> Result<Aabb> {
        let dims = self.dims();
        let mapping = self.mapping;
        inject::inject_material(
            &mut self.store,
            &mapping,
            dims,
            position,
            extents,
            material,
            add_blend,
        )
    }

    /// Copy the distance channel of the block containing `coords` into
    /// `output` (`BLOCK_EXTENT`^3 elements, x-fastest)
    pub fn block_distance_data(&self, coords: Vec3, output: &mut [i8]) -> Result<()> {
        check_channel_len(output.len())?;
        let block = self.locate_block(coords)?;
        let samples = self.store.block(block.x, block.y, block.z).expand()?;
        for (out, sample) in output.iter_mut().zip(&samples) {
            *out = sample.distance;
        }
        Ok(())
    }

    /// Copy the material and blend channels of the block containing `coords`
    pub fn block_material_data(
        &self,
        coords: Vec3,
        materials: &mut [MaterialId],
        blends: &mut [BlendFactor],
    ) -> Result<()> {
        check_channel_len(materials.len())?;
        check_channel_len(blends.len())?;
        let block = self.locate_block(coords)?;
        let samples = self.store.block(block.x, block.y, block.z).expand()?;
        for (i, sample) in samples.iter().enumerate() {
            materials[i] = sample.material;
            blends[i] = sample.blend;
        }
        Ok(())
    }

    /// Overwrite the distance channel of the block containing `coords` and
    /// recompress it
    pub fn modify_block_distance_data(&mut self, coords: Vec3, distances: &[i8]) -> Result<()> {
        check_channel_len(distances.len())?;
        let block = self.locate_block(coords)?;
        let mut samples = self.store.block(block.x, block.y, block.z).expand()?;
        for (sample, d) in samples.iter_mut().zip(distances) {
            sample.distance = *d;
        }
        self.store
            .set_block(block.x, block.y, block.z, Block::compress(&samples));
        Ok(())
    }

    /// Overwrite the material and blend channels of the block containing
    /// `coords` and recompress it
    pub fn modify_block_material_data(
        &mut self,
        coords: Vec3,
        materials: &[MaterialId],
        blends: &[BlendFactor],
    ) -> Result<()> {
        check_channel_len(materials.len())?;
        check_channel_len(blends.len())?;
        let block = self.locate_block(coords)?;
        let mut samples = self.store.block(block.x, block.y, block.z).expand()?;
        for (i, sample) in samples.iter_mut().enumerate() {
            sample.material = materials[i];
            sample.blend = blends[i];
        }
        self.store
            .set_block(block.x, block.y, block.z, Block::compress(&samples));
        Ok(())
    }

    fn dims(&self) -> UVec3 {
        UVec3::new(self.width, self.depth, self.height)
    }

    /// Block coordinate of the block containing a voxel-space point
    fn locate_block(&self, coords: Vec3) -> Result<UVec3> {
        let voxel = coords.floor().as_ivec3();
        if voxel.cmplt(IVec3::ZERO).any() || voxel.cmpge(self.dims().as_ivec3()).any() {
            return Err(GridError::OutOfBounds {
                x: voxel.x,
                y: voxel.y,
                z: voxel.z,
            });
        }
        let (block, _) = BlockStore::split_voxel(voxel.x as u32, voxel.y as u32, voxel.z as u32);
        Ok(block)
    }
}

fn validate_dims(width: u32, depth: u32, height: u32) -> Result<UVec3> {
    let valid = |d: u32| d > 0 && d % BLOCK_EXTENT == 0;
    if valid(width) && valid(depth) && valid(height) {
        Ok(UVec3::new(width, depth, height))
    } else {
        Err(GridError::InvalidDimensions {
            width,
            depth,
            height,
            extent: BLOCK_EXTENT,
        })
    }
}

fn check_channel_len(len: usize) -> Result<()> {
    if len == BLOCK_VOLUME {
        Ok(())
    } else {
        Err(GridError::BufferSize {
            expected: BLOCK_VOLUME,
            actual: len,
        })
    }
}

/// Build every block of a fresh grid in parallel. Each block depends only
/// on the sampler and its own coordinates.
fn build_blocks<F>(block_dims: UVec3, sampler: F) -> Vec<Block>
where
    F: Fn(UVec3) -> VoxelSample + Sync,
{
    let count = (block_dims.x * block_dims.y * block_dims.z) as usize;
    (0..count)
        .into_par_iter()
        .map(|slot| {
            let slot = slot as u32;
            let coords = UVec3::new(
                slot % block_dims.x,
                (slot / block_dims.x) % block_dims.y,
                slot / (block_dims.x * block_dims.y),
            );
            let base = coords * BLOCK_EXTENT;

            let mut samples = vec![VoxelSample::EMPTY; BLOCK_VOLUME];
            for z in 0..BLOCK_EXTENT {
                for y in 0..BLOCK_EXTENT {
                    for x in 0..BLOCK_EXTENT {
                        samples[block_index(x, y, z)] = sampler(base + UVec3::new(x, y, z));
                    }
                }
            }
            Block::compress(&samples)
        })
        .collect()
}
