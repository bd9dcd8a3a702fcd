use brix_core::codec::{run_byte, BlockCodec, Disposition};
use brix_core::error::{Error, Result};
use brix_core::format::MAGIC_DEFLATE;
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

/// Raw-DEFLATE block codec.
///
/// Each block is one standalone deflate stream (no zlib wrapper), produced
/// and consumed in a single one-shot pass.
pub struct DeflateCodec {
    /// Compression level (0 = store, 9 = smallest).
    pub level: u32,
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl DeflateCodec {
    pub fn new(level: u32) -> Self {
        Self { level }
    }
}

impl BlockCodec for DeflateCodec {
    fn magic(&self) -> u32 {
        MAGIC_DEFLATE
    }

    fn name(&self) -> &'static str {
        "deflate"
    }

    fn compress_bound(&self, src_len: usize) -> usize {
        // Stored-block worst case: 5 framing bytes per 16 KB chunk plus a
        // small constant.
        src_len + (src_len >> 12) + 64
    }

    fn compress(&self, dst: &mut [u8], src: &[u8]) -> Result<Disposition> {
        if run_byte(src).is_some() {
            return Ok(Disposition::RunLength);
        }
        let mut deflate = Compress::new(Compression::new(self.level), false);
        match deflate.compress(src, dst, FlushCompress::Finish) {
            Ok(Status::StreamEnd) => {
                let n = deflate.total_out() as usize;
                if n >= 2 && n < src.len() {
                    Ok(Disposition::Compressed(n))
                } else {
                    Ok(Disposition::Raw)
                }
            }
            // Ran out of destination space: the block does not shrink.
            Ok(_) => Ok(Disposition::Raw),
            Err(e) => Err(Error::codec("deflate", e.to_string())),
        }
    }

    fn decompress(&self, dst: &mut [u8], src: &[u8]) -> Result<usize> {
        let mut inflate = Decompress::new(false);
        match inflate.decompress(src, dst, FlushDecompress::Finish) {
            Ok(Status::StreamEnd) => Ok(inflate.total_out() as usize),
            Ok(_) => Err(Error::codec("deflate", "deflate stream did not end cleanly")),
            Err(e) => Err(Error::codec("deflate", e.to_string())),
        }
    }
}
