//! Zstd-backed incremental engine for the multi-frame container.

use brix_core::engine::{DecodeStep, EncodeStep, FrameDecoder, FrameEncoder, StreamEngine};
use brix_core::error::{Error, Result};
use zstd::stream::raw::{self, InBuffer, Operation, OutBuffer};
use zstd::zstd_safe::{CCtx, DCtx};

/// Magic number opening every zstd frame.
pub const ZSTD_FRAME_MAGIC: u32 = 0xFD2F_B528;

/// Bounded-memory zstd streaming engine.
///
/// Buffer size recommendations come from the zstd library itself; sessions
/// allocate exactly those sizes, which is what makes the full-consumption
/// contract of the incremental step hold.
pub struct ZstdStreamEngine;

impl StreamEngine for ZstdStreamEngine {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn frame_magic(&self) -> u32 {
        ZSTD_FRAME_MAGIC
    }

    fn compress_in_size(&self) -> usize {
        CCtx::in_size()
    }

    fn compress_out_size(&self) -> usize {
        CCtx::out_size()
    }

    fn decompress_in_size(&self) -> usize {
        DCtx::in_size()
    }

    fn decompress_out_size(&self) -> usize {
        DCtx::out_size()
    }

    fn frame_encoder(
        &self,
        level: i32,
        content_size: Option<u64>,
        dict: &[u8],
    ) -> Result<Box<dyn FrameEncoder>> {
        let mut encoder = raw::Encoder::with_dictionary(level, dict)
            .map_err(|e| Error::codec("zstd", e.to_string()))?;
        if content_size.is_some() {
            encoder
                .set_pledged_src_size(content_size)
                .map_err(|e| Error::codec("zstd", e.to_string()))?;
        }
        Ok(Box::new(ZstdFrameEncoder { inner: encoder }))
    }

    fn frame_decoder(&self, dict: &[u8]) -> Result<Box<dyn FrameDecoder>> {
        let decoder = raw::Decoder::with_dictionary(dict)
            .map_err(|e| Error::codec("zstd", e.to_string()))?;
        Ok(Box::new(ZstdFrameDecoder { inner: decoder }))
    }
}

struct ZstdFrameEncoder {
    inner: raw::Encoder<'static>,
}

impl FrameEncoder for ZstdFrameEncoder {
    fn step(&mut self, src: &[u8], dst: &mut [u8]) -> Result<EncodeStep> {
        let mut input = InBuffer::around(src);
        let mut output = OutBuffer::around(dst);
        self.inner
            .run(&mut input, &mut output)
            .map_err(|e| Error::codec("zstd", e.to_string()))?;
        Ok(EncodeStep {
            consumed: input.pos,
            produced: output.pos(),
        })
    }

    fn finish(&mut self, dst: &mut [u8]) -> Result<(usize, bool)> {
        let mut output = OutBuffer::around(dst);
        let remaining = self
            .inner
            .finish(&mut output, true)
            .map_err(|e| Error::codec("zstd", e.to_string()))?;
        Ok((output.pos(), remaining == 0))
    }
}

struct ZstdFrameDecoder {
    inner: raw::Decoder<'static>,
}

impl FrameDecoder for ZstdFrameDecoder {
    fn step(&mut self, src: &[u8], dst: &mut [u8]) -> Result<DecodeStep> {
        let mut input = InBuffer::around(src);
        let mut output = OutBuffer::around(dst);
        let hint = self
            .inner
            .run(&mut input, &mut output)
            .map_err(|e| Error::codec("zstd", e.to_string()))?;
        Ok(DecodeStep {
            consumed: input.pos,
            produced: output.pos(),
            next_read: hint,
        })
    }
}
