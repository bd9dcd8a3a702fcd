pub mod check;
pub mod codec;
pub mod engine;
pub mod error;
pub mod format;
pub mod reader;
pub mod stream;
pub mod writer;

pub use check::StreamCheck;
pub use codec::{BlockCodec, CodecRegistry, Disposition};
pub use engine::{DecodeStep, EncodeStep, FrameDecoder, FrameEncoder, StreamEngine};
pub use error::{Error, Result};
pub use reader::Reader;
pub use stream::{
    load_dictionary, BlockFormatHandler, CompressSession, DecompressSession, LegacyHandler,
};
pub use writer::Writer;
