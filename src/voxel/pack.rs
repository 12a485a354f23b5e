//! Grid serialization: versioned header, block directory, verbatim payloads
//!
//! Layout (little-endian):
//! - magic tag `b"VXGD"`, format version u32
//! - width, depth, height, block extent (u32 each)
//! - directory: one `(offset, byte_size)` u32 pair per block, row-major
//!   block order, offsets relative to the payload base
//! - every block's compressed payload, copied verbatim

use super::block::{BLOCK_EXTENT, Block};
use super::store::BlockStore;
use crate::core::error::GridError;
use crate::core::types::Result;

pub const PACK_MAGIC: [u8; 4] = *b"VXGD";
pub const PACK_VERSION: u32 = 1;

const HEADER_BYTES: usize = 4 + 4 + 4 * 4;
const DIR_ENTRY_BYTES: usize = 8;

/// A grid serialized into a single self-contained buffer
pub struct PackedGrid {
    bytes: Vec<u8>,
}

impl PackedGrid {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A block store reconstructed from a pack, plus its recorded dimensions
pub(crate) struct UnpackedGrid {
    pub width: u32,
    pub depth: u32,
    pub height: u32,
    pub store: BlockStore,
}

/// Serialize a store without recompressing any block
pub(crate) fn pack(store: &BlockStore, width: u32, depth: u32, height: u32) -> PackedGrid {
    let blocks = store.blocks();
    let payload_total: usize = blocks.iter().map(|b| b.byte_size()).sum();
    let mut bytes =
        Vec::with_capacity(HEADER_BYTES + blocks.len() * DIR_ENTRY_BYTES + payload_total);

    bytes.extend_from_slice(&PACK_MAGIC);
    bytes.extend_from_slice(&PACK_VERSION.to_le_bytes());
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&depth.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes.extend_from_slice(&BLOCK_EXTENT.to_le_bytes());

    let mut offset = 0u32;
    for block in blocks {
        bytes.extend_from_slice(&offset.to_le_bytes());
        bytes.extend_from_slice(&(block.byte_size() as u32).to_le_bytes());
        offset += block.byte_size() as u32;
    }
    for block in blocks {
        bytes.extend_from_slice(block.payload());
    }

    log::debug!(
        "packed {}x{}x{} grid: {} blocks, {} bytes",
        width,
        depth,
        height,
        blocks.len(),
        bytes.len()
    );
    PackedGrid { bytes }
}

fn read_u32(blob: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([blob[at], blob[at + 1], blob[at + 2], blob[at + 3]])
}

/// Validate a pack and reconstruct its block store. Payloads are attached
/// without expansion; any structural mismatch fails without partial state.
pub(crate) fn unpack(blob: &[u8]) -> Result<UnpackedGrid> {
    if blob.len() < HEADER_BYTES {
        return Err(GridError::MalformedPack("truncated header"));
    }
    if blob[0..4] != PACK_MAGIC {
        return Err(GridError::MalformedPack("bad magic tag"));
    }
    if read_u32(blob, 4) != PACK_VERSION {
        return Err(GridError::MalformedPack("unsupported format version"));
    }

    let width = read_u32(blob, 8);
    let depth = read_u32(blob, 12);
    let height = read_u32(blob, 16);
    let extent = read_u32(blob, 20);
    if extent != BLOCK_EXTENT {
        return Err(GridError::MalformedPack("unsupported block extent"));
    }
    if width == 0 || depth == 0 || height == 0 {
        return Err(GridError::MalformedPack("zero dimension"));
    }
    if width % extent != 0 || depth % extent != 0 || height % extent != 0 {
        return Err(GridError::MalformedPack(
            "dimensions not multiples of block extent",
        ));
    }

    let (bx, by, bz) = (width / extent, depth / extent, height / extent);
    // Claimed dimensions can put the block count far beyond what the
    // buffer could hold, so the directory math stays in checked usize.
    let count = (bx as usize)
        .checked_mul(by as usize)
        .and_then(|c| c.checked_mul(bz as usize))
        .ok_or(GridError::MalformedPack("block count overflows"))?;
    let payload_base = count
        .checked_mul(DIR_ENTRY_BYTES)
        .and_then(|d| d.checked_add(HEADER_BYTES))
        .ok_or(GridError::MalformedPack("block count overflows"))?;
    if blob.len() < payload_base {
        return Err(GridError::MalformedPack("truncated directory"));
    }

    let mut blocks = Vec::with_capacity(count);
    let mut expected_offset = 0usize;
    for i in 0..count {
        let entry = HEADER_BYTES + i * DIR_ENTRY_BYTES;
        let offset = read_u32(blob, entry) as usize;
        let size = read_u32(blob, entry + 4) as usize;
        if offset != expected_offset {
            return Err(GridError::MalformedPack("non-contiguous directory"));
        }
        let start = payload_base + offset;
        let end = start.checked_add(size).ok_or(GridError::MalformedPack(
            "directory entry overflows buffer",
        ))?;
        if end > blob.len() {
            return Err(GridError::MalformedPack("directory entry overflows buffer"));
        }
        blocks.push(Block::from_payload(&blob[start..end])?);
        expected_offset += size;
    }
    if payload_base + expected_offset != blob.len() {
        return Err(GridError::MalformedPack("trailing bytes after payloads"));
    }

    log::debug!("unpacked {}x{}x{} grid: {} blocks", width, depth, height, count);
    Ok(UnpackedGrid {
        width,
        depth,
        height,
        store: BlockStore::from_blocks(bx, by, bz, blocks),
    })
}
