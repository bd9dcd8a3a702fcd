//! Protocol-invariant tests driven by mock incremental engines.
//!
//! The sessions size their buffers to the engine's own recommendations and
//! in exchange demand exact consumption on every step; these mocks break
//! that contract on purpose.

use brix_core::engine::{DecodeStep, EncodeStep, FrameDecoder, FrameEncoder, StreamEngine};
use brix_core::stream::{CompressSession, DecompressSession};
use brix_core::{Error, Result};

const MOCK_MAGIC: u32 = 0x4B43_4F4D;
const MOCK_BUF_SIZE: usize = 64;
const ECHO_PAYLOAD: usize = 8;

#[derive(Clone, Copy)]
enum Mode {
    /// Well-behaved: copy input through, one payload read after the magic.
    Echo,
    /// Encoder leaves one source byte unconsumed.
    LazyEncode,
    /// Decoder leaves one source byte unconsumed while asking for more.
    ShortDecode,
    /// Decoder requests more than its own recommended buffer size.
    GreedyDecode,
}

struct MockEngine(Mode);

impl StreamEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn frame_magic(&self) -> u32 {
        MOCK_MAGIC
    }

    fn compress_in_size(&self) -> usize {
        MOCK_BUF_SIZE
    }

    fn compress_out_size(&self) -> usize {
        MOCK_BUF_SIZE
    }

    fn decompress_in_size(&self) -> usize {
        MOCK_BUF_SIZE
    }

    fn decompress_out_size(&self) -> usize {
        MOCK_BUF_SIZE
    }

    fn frame_encoder(
        &self,
        _level: i32,
        _content_size: Option<u64>,
        _dict: &[u8],
    ) -> Result<Box<dyn FrameEncoder>> {
        Ok(Box::new(MockEncoder(self.0)))
    }

    fn frame_decoder(&self, _dict: &[u8]) -> Result<Box<dyn FrameDecoder>> {
        Ok(Box::new(MockDecoder {
            mode: self.0,
            seen_magic: false,
        }))
    }
}

struct MockEncoder(Mode);

impl FrameEncoder for MockEncoder {
    fn step(&mut self, src: &[u8], dst: &mut [u8]) -> Result<EncodeStep> {
        match self.0 {
            Mode::LazyEncode => Ok(EncodeStep {
                consumed: src.len() - 1,
                produced: 0,
            }),
            _ => {
                dst[..src.len()].copy_from_slice(src);
                Ok(EncodeStep {
                    consumed: src.len(),
                    produced: src.len(),
                })
            }
        }
    }

    fn finish(&mut self, _dst: &mut [u8]) -> Result<(usize, bool)> {
        Ok((0, true))
    }
}

struct MockDecoder {
    mode: Mode,
    seen_magic: bool,
}

impl FrameDecoder for MockDecoder {
    fn step(&mut self, src: &[u8], dst: &mut [u8]) -> Result<DecodeStep> {
        match self.mode {
            Mode::ShortDecode => Ok(DecodeStep {
                consumed: src.len() - 1,
                produced: 0,
                next_read: ECHO_PAYLOAD,
            }),
            Mode::GreedyDecode => Ok(DecodeStep {
                consumed: src.len(),
                produced: 0,
                next_read: MOCK_BUF_SIZE + 1,
            }),
            _ => {
                if !self.seen_magic {
                    self.seen_magic = true;
                    return Ok(DecodeStep {
                        consumed: src.len(),
                        produced: 0,
                        next_read: ECHO_PAYLOAD,
                    });
                }
                dst[..src.len()].copy_from_slice(src);
                Ok(DecodeStep {
                    consumed: src.len(),
                    produced: src.len(),
                    next_read: 0,
                })
            }
        }
    }
}

fn mock_frame(payload: &[u8]) -> Vec<u8> {
    let mut bytes = MOCK_MAGIC.to_le_bytes().to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

#[test]
fn test_echo_engine_roundtrip() {
    let payload = *b"8 bytes!";
    let input = mock_frame(&payload);

    let mut decoded = Vec::new();
    let total = DecompressSession::new(Box::new(MockEngine(Mode::Echo)), Vec::new(), None)
        .decompress(&mut &input[..], &mut decoded)
        .unwrap();
    assert_eq!(total, ECHO_PAYLOAD as u64);
    assert_eq!(decoded, payload);
}

#[test]
fn test_encoder_partial_consume_is_protocol_error() {
    let data = vec![0x5Au8; 10];
    let mut packed = Vec::new();
    let result = CompressSession::new(Box::new(MockEngine(Mode::LazyEncode)), 1, Vec::new())
        .compress(&mut &data[..], &mut packed, None);
    match result {
        Err(Error::Protocol(_)) => {}
        other => panic!("expected protocol error, got {other:?}"),
    }
}

#[test]
fn test_decoder_partial_consume_is_protocol_error() {
    let input = mock_frame(b"trailing bytes the mock never takes");
    let mut decoded = Vec::new();
    let result = DecompressSession::new(Box::new(MockEngine(Mode::ShortDecode)), Vec::new(), None)
        .decompress(&mut &input[..], &mut decoded);
    match result {
        Err(Error::Protocol(_)) => {}
        other => panic!("expected protocol error, got {other:?}"),
    }
}

#[test]
fn test_decoder_overlong_request_is_protocol_error() {
    let input = mock_frame(b"payload");
    let mut decoded = Vec::new();
    let result = DecompressSession::new(Box::new(MockEngine(Mode::GreedyDecode)), Vec::new(), None)
        .decompress(&mut &input[..], &mut decoded);
    match result {
        Err(Error::Protocol(_)) => {}
        other => panic!("expected protocol error, got {other:?}"),
    }
}
