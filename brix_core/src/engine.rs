//! Contract for the incremental engine behind the multi-frame container.
//!
//! The engine is a stateful, bounded-memory compressor consumed in steps:
//! sessions allocate buffers at exactly the sizes the engine recommends,
//! which is what lets the container demand full consumption of every chunk
//! it offers.

use crate::error::Result;

/// Result of one incremental compression step.
#[derive(Debug, Clone, Copy)]
pub struct EncodeStep {
    /// Source bytes consumed by the call.
    pub consumed: usize,
    /// Bytes written to the destination buffer.
    pub produced: usize,
}

/// Result of one incremental decompression step.
#[derive(Debug, Clone, Copy)]
pub struct DecodeStep {
    /// Source bytes consumed by the call.
    pub consumed: usize,
    /// Bytes written to the destination buffer.
    pub produced: usize,
    /// Source bytes required before the next call; 0 once the frame is
    /// fully decoded.
    pub next_read: usize,
}

/// Stateful per-frame compressor, primed with the session dictionary at
/// creation.
pub trait FrameEncoder {
    /// Feed one chunk. With buffers at the engine's recommended sizes the
    /// engine is expected to consume `src` entirely in a single call.
    fn step(&mut self, src: &[u8], dst: &mut [u8]) -> Result<EncodeStep>;

    /// Write the end-of-frame epilogue. Returns bytes produced and whether
    /// the epilogue is complete; call again until it reports done.
    fn finish(&mut self, dst: &mut [u8]) -> Result<(usize, bool)>;
}

/// Stateful per-frame decompressor, primed with the session dictionary at
/// creation.
pub trait FrameDecoder {
    fn step(&mut self, src: &[u8], dst: &mut [u8]) -> Result<DecodeStep>;
}

/// Session-scoped engine factory.
///
/// Reports its own buffer size recommendations and creates primed
/// per-frame encoder/decoder instances. One factory serves a whole
/// session; one encoder/decoder serves exactly one frame.
pub trait StreamEngine {
    fn name(&self) -> &'static str;

    /// Magic number opening every frame this engine produces.
    fn frame_magic(&self) -> u32;

    /// Recommended source buffer size for compression.
    fn compress_in_size(&self) -> usize;
    /// Recommended destination buffer size for compression.
    fn compress_out_size(&self) -> usize;
    /// Recommended source buffer size for decompression.
    fn decompress_in_size(&self) -> usize;
    /// Recommended destination buffer size for decompression.
    fn decompress_out_size(&self) -> usize;

    /// New per-frame compressor, primed with `dict`. `content_size` is the
    /// caller's estimate of the frame's total input, folded into the
    /// engine's compression parameters when known.
    fn frame_encoder(
        &self,
        level: i32,
        content_size: Option<u64>,
        dict: &[u8],
    ) -> Result<Box<dyn FrameEncoder>>;

    /// New per-frame decompressor, primed with `dict`.
    fn frame_decoder(&self, dict: &[u8]) -> Result<Box<dyn FrameDecoder>>;
}
