use brix_core::codec::{run_byte, BlockCodec, Disposition};
use brix_core::error::{Error, Result};
use brix_core::format::MAGIC_LZ4;
use lz4_flex::block::{compress_into, decompress_into, get_maximum_output_size};

/// LZ4 block codec.
///
/// Fastest of the bundled codecs. Falls back to raw storage whenever the
/// LZ4 output would not shrink the block.
pub struct Lz4Codec;

impl BlockCodec for Lz4Codec {
    fn magic(&self) -> u32 {
        MAGIC_LZ4
    }

    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress_bound(&self, src_len: usize) -> usize {
        get_maximum_output_size(src_len)
    }

    fn compress(&self, dst: &mut [u8], src: &[u8]) -> Result<Disposition> {
        if run_byte(src).is_some() {
            return Ok(Disposition::RunLength);
        }
        match compress_into(src, dst) {
            Ok(n) if n >= 2 && n < src.len() => Ok(Disposition::Compressed(n)),
            // Output that does not shrink the block, or does not fit the
            // bound-sized buffer, means the block is stored verbatim.
            Ok(_) | Err(_) => Ok(Disposition::Raw),
        }
    }

    fn decompress(&self, dst: &mut [u8], src: &[u8]) -> Result<usize> {
        decompress_into(src, dst).map_err(|e| Error::codec("lz4", e.to_string()))
    }
}
