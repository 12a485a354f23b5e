//! Block payload codec: compressed at rest, expanded transiently
//!
//! A block is a cube of `BLOCK_EXTENT`^3 samples. At rest it is held as a
//! small tagged payload; any access that needs individual samples expands it
//! into a transient `Vec<VoxelSample>` and mutating accesses recompress it
//! before returning. The payload bytes are also what the packer copies
//! verbatim, so decoding must depend on nothing but the bytes themselves.
//!
//! Payload framing:
//! - tag 0 (uniform): one sample, repeated across the whole block
//! - tag 1 (lz4): `lz4_flex` size-prepended compression of the sample bytes
//! - tag 2 (raw): the sample bytes as-is, picked when LZ4 would not shrink

use super::sample::VoxelSample;
use crate::core::error::GridError;
use crate::core::types::Result;
use bytemuck::cast_slice;

/// Edge length of a block in voxels. Blocks are always cubes.
pub const BLOCK_EXTENT: u32 = 16;

/// Number of samples in one block
pub const BLOCK_VOLUME: usize = (BLOCK_EXTENT * BLOCK_EXTENT * BLOCK_EXTENT) as usize;

/// Bytes per sample in expanded form
pub const SAMPLE_BYTES: usize = std::mem::size_of::<VoxelSample>();

/// Payload size of a uniform block, independent of the block extent
pub const UNIFORM_PAYLOAD_BYTES: usize = 1 + SAMPLE_BYTES;

const TAG_UNIFORM: u8 = 0;
const TAG_LZ4: u8 = 1;
const TAG_RAW: u8 = 2;

/// Scan-order index of a local voxel inside a block (x-fastest).
/// This order is part of the public contract for raw channel buffers.
#[inline]
pub fn block_index(x: u32, y: u32, z: u32) -> usize {
    debug_assert!(x < BLOCK_EXTENT && y < BLOCK_EXTENT && z < BLOCK_EXTENT);
    (x + BLOCK_EXTENT * (y + BLOCK_EXTENT * z)) as usize
}

/// A block of voxel samples held in compressed payload form
#[derive(Clone, Debug)]
pub struct Block {
    payload: Box<[u8]>,
}

impl Block {
    /// Block filled with a single repeated sample, O(1) bytes
    pub fn uniform(sample: VoxelSample) -> Self {
        Self {
            payload: Box::new([
                TAG_UNIFORM,
                sample.distance as u8,
                sample.material,
                sample.blend,
            ]),
        }
    }

    /// Compress an expanded sample array back into payload form
    pub fn compress(samples: &[VoxelSample]) -> Self {
        debug_assert_eq!(samples.len(), BLOCK_VOLUME);
        let first = samples[0];
        if samples.iter().all(|s| *s == first) {
            return Self::uniform(first);
        }

        let raw: &[u8] = cast_slice(samples);
        let packed = lz4_flex::compress_prepend_size(raw);
        let (tag, body) = if packed.len() < raw.len() {
            (TAG_LZ4, packed.as_slice())
        } else {
            (TAG_RAW, raw)
        };

        let mut payload = Vec::with_capacity(1 + body.len());
        payload.push(tag);
        payload.extend_from_slice(body);
        Self {
            payload: payload.into_boxed_slice(),
        }
    }

    /// Expand into a transient sample array in scan order
    pub fn expand(&self) -> Result<Vec<VoxelSample>> {
        match self.payload.first() {
            Some(&TAG_UNIFORM) => {
                let sample = VoxelSample {
                    distance: self.payload[1] as i8,
                    material: self.payload[2],
                    blend: self.payload[3],
                };
                Ok(vec![sample; BLOCK_VOLUME])
            }
            Some(&TAG_LZ4) => {
                let bytes = lz4_flex::decompress_size_prepended(&self.payload[1..])
                    .map_err(|e| GridError::CorruptBlock(e.to_string()))?;
                if bytes.len() != BLOCK_VOLUME * SAMPLE_BYTES {
                    return Err(GridError::CorruptBlock(format!(
                        "payload expands to {} bytes",
                        bytes.len()
                    )));
                }
                Ok(cast_slice(&bytes).to_vec())
            }
            Some(&TAG_RAW) => Ok(cast_slice(&self.payload[1..]).to_vec()),
            _ => Err(GridError::CorruptBlock("unknown payload tag".to_string())),
        }
    }

    /// Attach a payload produced earlier by this codec, e.g. out of a pack.
    /// Validates the framing without decompressing the body.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let framed = match payload.first() {
            Some(&TAG_UNIFORM) => payload.len() == UNIFORM_PAYLOAD_BYTES,
            Some(&TAG_LZ4) => payload.len() > 1,
            Some(&TAG_RAW) => payload.len() == 1 + BLOCK_VOLUME * SAMPLE_BYTES,
            _ => false,
        };
        if !framed {
            return Err(GridError::MalformedPack("bad block payload framing"));
        }
        Ok(Self {
            payload: payload.to_vec().into_boxed_slice(),
        })
    }

    /// Current compressed size in bytes
    pub fn byte_size(&self) -> usize {
        self.payload.len()
    }

    /// Payload bytes, copied verbatim into packs
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Whether the block is stored as a single repeated sample
    pub fn is_uniform(&self) -> bool {
        self.payload[0] == TAG_UNIFORM
    }
}
