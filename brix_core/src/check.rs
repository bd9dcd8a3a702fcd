use xxhash_rust::xxh32::Xxh32;

use crate::format::CHECKSUM_SEED;

/// Rolling checksum over every decoded payload byte of a frame.
///
/// Updated once per block with the block's fully reconstructed contents, in
/// stream order, identically on the encode and decode paths — that is what
/// makes the trailer comparable at all. The trailer stores the 32-bit
/// digest right-shifted by 5 and truncated to 22 bits.
#[derive(Clone)]
pub struct StreamCheck {
    state: Xxh32,
}

impl StreamCheck {
    pub fn new() -> Self {
        Self {
            state: Xxh32::new(CHECKSUM_SEED),
        }
    }

    /// Fold one fully reconstructed block into the checksum.
    pub fn update(&mut self, block: &[u8]) {
        self.state.update(block);
    }

    /// Final 22-bit trailer value.
    pub fn digest22(&self) -> u32 {
        (self.state.digest() >> 5) & 0x3F_FFFF
    }
}

impl Default for StreamCheck {
    fn default() -> Self {
        Self::new()
    }
}
