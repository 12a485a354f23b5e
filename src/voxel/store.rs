//! Block store: owns every block and maps voxel coordinates onto them

use super::block::{BLOCK_EXTENT, Block};
use super::sample::VoxelSample;
use crate::core::types::UVec3;

/// Ordered collection of blocks addressed by block coordinates.
/// Block order is row-major with x fastest, matching the pack directory.
pub(crate) struct BlockStore {
    blocks_x: u32,
    blocks_y: u32,
    blocks_z: u32,
    blocks: Vec<Block>,
}

impl BlockStore {
    /// Store filled with one uniform block per slot
    pub fn new_uniform(blocks_x: u32, blocks_y: u32, blocks_z: u32, sample: VoxelSample) -> Self {
        let count = (blocks_x * blocks_y * blocks_z) as usize;
        Self {
            blocks_x,
            blocks_y,
            blocks_z,
            blocks: vec![Block::uniform(sample); count],
        }
    }

    /// Store assembled from pre-built blocks in row-major order
    pub fn from_blocks(blocks_x: u32, blocks_y: u32, blocks_z: u32, blocks: Vec<Block>) -> Self {
        debug_assert_eq!(blocks.len(), (blocks_x * blocks_y * blocks_z) as usize);
        Self {
            blocks_x,
            blocks_y,
            blocks_z,
            blocks,
        }
    }

    pub fn block_dims(&self) -> UVec3 {
        UVec3::new(self.blocks_x, self.blocks_y, self.blocks_z)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Flat index of a block coordinate
    pub fn block_slot(&self, bx: u32, by: u32, bz: u32) -> usize {
        debug_assert!(bx < self.blocks_x && by < self.blocks_y && bz < self.blocks_z);
        (bx + self.blocks_x * (by + self.blocks_y * bz)) as usize
    }

    pub fn block(&self, bx: u32, by: u32, bz: u32) -> &Block {
        &self.blocks[self.block_slot(bx, by, bz)]
    }

    pub fn set_block(&mut self, bx: u32, by: u32, bz: u32, block: Block) {
        let slot = self.block_slot(bx, by, bz);
        self.blocks[slot] = block;
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Split a grid voxel coordinate into (block, local offset)
    pub fn split_voxel(x: u32, y: u32, z: u32) -> (UVec3, UVec3) {
        (
            UVec3::new(x / BLOCK_EXTENT, y / BLOCK_EXTENT, z / BLOCK_EXTENT),
            UVec3::new(x % BLOCK_EXTENT, y % BLOCK_EXTENT, z % BLOCK_EXTENT),
        )
    }

    /// Sum of every block's current compressed size. Never expands.
    pub fn memory_size(&self) -> usize {
        self.blocks.iter().map(|b| b.byte_size()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::block::UNIFORM_PAYLOAD_BYTES;

    #[test]
    fn test_slot_addressing() {
        let store = BlockStore::new_uniform(2, 3, 4, VoxelSample::EMPTY);
        assert_eq!(store.block_count(), 24);
        // Row-major with x fastest
        assert_eq!(store.block_slot(0, 0, 0), 0);
        assert_eq!(store.block_slot(1, 0, 0), 1);
        assert_eq!(store.block_slot(0, 1, 0), 2);
        assert_eq!(store.block_slot(0, 0, 1), 6);
        assert_eq!(store.block_slot(1, 2, 3), 23);
    }

    #[test]
    fn test_split_voxel() {
        let (block, local) = BlockStore::split_voxel(17, 0, 33);
        assert_eq!(block, UVec3::new(1, 0, 2));
        assert_eq!(local, UVec3::new(1, 0, 1));
    }

    #[test]
    fn test_uniform_memory_size() {
        let store = BlockStore::new_uniform(2, 2, 2, VoxelSample::EMPTY);
        assert_eq!(store.memory_size(), 8 * UNIFORM_PAYLOAD_BYTES);
    }
}
