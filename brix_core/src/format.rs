//! Wire-level constants and header math for the BRIX block container.
//!
//! Single-frame layout:
//! ```text
//! [MAGIC: 4 bytes LE, one value per registered codec]
//! [DESCRIPTOR: 1 byte, 0..=6; block size = 1 KB << descriptor]
//! [BLOCK]*            block := header (1-5 bytes) + payload
//! [TRAILER: 3 bytes]  22-bit checksum of the decoded stream
//! ```
//!
//! Block header, lead byte first:
//! bits 6-7 carry the block type, bit 5 the full-block flag. Non-full
//! blocks append the 2-byte big-endian original size; compressed blocks
//! additionally append the 2-byte big-endian compressed size.

use crate::error::{Error, Result};

/// Magic number for the LZ4 block codec.
pub const MAGIC_LZ4: u32 = 0x183E2309;
/// Magic number for the DEFLATE block codec.
pub const MAGIC_DEFLATE: u32 = 0x183E3309;
/// Magic number for the Zstandard block codec.
pub const MAGIC_ZSTD: u32 = 0x183E4309;

/// Frame header: 4-byte magic + 1-byte block size descriptor.
pub const FRAME_HEADER_SIZE: usize = 5;
/// Largest block header shape: lead + original size + compressed size.
pub const MAX_BLOCK_HEADER_SIZE: usize = 5;
/// Stream trailer: trailer-tagged lead byte + 2 checksum bytes.
pub const TRAILER_SIZE: usize = 3;

/// Highest accepted block size descriptor (64 KB blocks).
pub const MAX_BLOCK_SIZE_ID: u8 = 6;
/// Default descriptor: 32 KB blocks.
pub const DEFAULT_BLOCK_SIZE_ID: u8 = 5;

/// Seed for the stream checksum.
pub const CHECKSUM_SEED: u32 = 0;

/// Full-block flag in a block header lead byte.
pub const FLAG_FULL_BLOCK: u8 = 0x20;

// ── Block types ────────────────────────────────────────────────────────────

/// Block disposition tag stored in bits 6-7 of the header lead byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Compressed = 0,
    Raw = 1,
    Rle = 2,
    Trailer = 3,
}

impl BlockType {
    /// Extract the block type from a header lead byte.
    pub fn from_lead(lead: u8) -> Self {
        match lead >> 6 {
            0 => BlockType::Compressed,
            1 => BlockType::Raw,
            2 => BlockType::Rle,
            _ => BlockType::Trailer,
        }
    }

    /// Lead byte for a data block of this type.
    pub fn lead(self, full: bool) -> u8 {
        ((self as u8) << 6) | if full { FLAG_FULL_BLOCK } else { 0 }
    }
}

/// Translate a block size descriptor into a block size in bytes.
pub fn block_size_from_id(id: u8) -> Result<usize> {
    if id > MAX_BLOCK_SIZE_ID {
        return Err(Error::Format(format!(
            "block size descriptor {id} out of range (max {MAX_BLOCK_SIZE_ID})"
        )));
    }
    Ok(1024usize << id)
}

/// Pack the stream trailer: trailer tag in the top 2 bits, then the 22-bit
/// checksum big-endian across the remaining 6 + 16 bits.
pub fn pack_trailer(checksum22: u32) -> [u8; TRAILER_SIZE] {
    [
        ((BlockType::Trailer as u8) << 6) | ((checksum22 >> 16) as u8 & 0x3F),
        (checksum22 >> 8) as u8,
        checksum22 as u8,
    ]
}

/// Recover the 22-bit checksum from the trailer lead byte and its 2 tail bytes.
pub fn unpack_trailer(lead: u8, rest: [u8; 2]) -> u32 {
    (((lead & 0x3F) as u32) << 16) | ((rest[0] as u32) << 8) | rest[1] as u32
}
