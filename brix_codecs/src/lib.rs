mod deflate_codec;
mod lz4_codec;
mod zstd_codec;
mod zstd_stream;

pub use deflate_codec::DeflateCodec;
pub use lz4_codec::Lz4Codec;
pub use zstd_codec::ZstdCodec;
pub use zstd_stream::{ZstdStreamEngine, ZSTD_FRAME_MAGIC};

use brix_core::codec::{BlockCodec, CodecRegistry};
use brix_core::format::{MAGIC_DEFLATE, MAGIC_LZ4, MAGIC_ZSTD};

/// Resolve a codec from its frame magic number.
///
/// Called when opening an existing file, so the reader can be initialized
/// with the right codec automatically.
pub fn codec_by_magic(magic: u32) -> Option<Box<dyn BlockCodec>> {
    match magic {
        MAGIC_LZ4 => Some(Box::new(Lz4Codec)),
        MAGIC_DEFLATE => Some(Box::new(DeflateCodec::default())),
        MAGIC_ZSTD => Some(Box::new(ZstdCodec::default())),
        _ => None,
    }
}

/// Resolve a codec from a user-facing name.
pub fn codec_by_name(name: &str) -> Option<Box<dyn BlockCodec>> {
    match name {
        "lz4" | "l" => Some(Box::new(Lz4Codec)),
        "deflate" | "d" => Some(Box::new(DeflateCodec::default())),
        "zstd" | "z" => Some(Box::new(ZstdCodec::default())),
        _ => None,
    }
}

/// Registry over the bundled codecs.
pub struct DefaultRegistry;

impl CodecRegistry for DefaultRegistry {
    fn by_magic(&self, magic: u32) -> Option<Box<dyn BlockCodec>> {
        codec_by_magic(magic)
    }
}
