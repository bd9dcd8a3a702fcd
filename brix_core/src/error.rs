use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Container error kinds.
///
/// Every error is terminal for the frame or file being processed: the
/// operation stops and the error is returned to the caller. Output already
/// flushed to the destination stays on disk; no rollback is attempted.
#[derive(Debug, Error)]
pub enum Error {
    /// Buffer or dictionary allocation refused.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// Open/permission failure at the file boundary.
    #[error("cannot access {path:?}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Short or failed read from the source stream.
    #[error("read error: {0}")]
    Read(#[source] io::Error),

    /// Short or failed write to the destination stream.
    #[error("write error: {0}")]
    Write(#[source] io::Error),

    /// Unknown magic number, bad block size descriptor, or malformed header.
    #[error("format error: {0}")]
    Format(String),

    /// Failure reported by a pluggable compressor or decompressor.
    #[error("{codec} error: {message}")]
    Codec {
        codec: &'static str,
        message: String,
    },

    /// Stream trailer checksum does not match the decoded data.
    #[error("checksum mismatch: stored 0x{stored:06x}, computed 0x{computed:06x}")]
    Integrity { stored: u32, computed: u32 },

    /// An engine or codec stepped outside its contract: partial consumption
    /// of an exactly-sized buffer, or an outcome value outside its domain.
    #[error("protocol invariant violated: {0}")]
    Protocol(String),
}

impl Error {
    /// Wrap a failure reported by a named codec or engine.
    pub fn codec(codec: &'static str, message: impl Into<String>) -> Self {
        Error::Codec {
            codec,
            message: message.into(),
        }
    }
}
