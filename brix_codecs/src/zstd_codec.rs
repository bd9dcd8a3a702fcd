use brix_core::codec::{run_byte, BlockCodec, Disposition};
use brix_core::error::{Error, Result};
use brix_core::format::MAGIC_ZSTD;

/// Zstandard block codec.
///
/// Each block is one independent zstd frame at the configured level
/// (default 3: fast with a solid ratio on mixed data).
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl BlockCodec for ZstdCodec {
    fn magic(&self) -> u32 {
        MAGIC_ZSTD
    }

    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress_bound(&self, src_len: usize) -> usize {
        zstd::zstd_safe::compress_bound(src_len)
    }

    fn compress(&self, dst: &mut [u8], src: &[u8]) -> Result<Disposition> {
        if run_byte(src).is_some() {
            return Ok(Disposition::RunLength);
        }
        match zstd::bulk::compress_to_buffer(src, dst, self.level) {
            Ok(n) if n >= 2 && n < src.len() => Ok(Disposition::Compressed(n)),
            Ok(_) => Ok(Disposition::Raw),
            Err(e) => Err(Error::codec("zstd", e.to_string())),
        }
    }

    fn decompress(&self, dst: &mut [u8], src: &[u8]) -> Result<usize> {
        zstd::bulk::decompress_to_buffer(src, dst).map_err(|e| Error::codec("zstd", e.to_string()))
    }
}
