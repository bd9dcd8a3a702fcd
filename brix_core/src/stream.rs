//! Multi-frame streaming container driven by an incremental engine.
//!
//! A file is a sequence of self-delimited frames, each opening with a
//! magic number. Engine frames are opaque to the container; block-format
//! frames are recognized by magic and delegated to a [`LegacyHandler`].
//! Sessions own their buffers, engine, and dictionary for their whole
//! lifetime so that many files can be processed against one allocation —
//! no per-file state besides the buffers survives between files.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::codec::CodecRegistry;
use crate::engine::StreamEngine;
use crate::error::{Error, Result};
use crate::reader::Reader;

/// Largest dictionary kept in memory; larger source files are truncated to
/// their last `MAX_DICT_SIZE` bytes.
pub const MAX_DICT_SIZE: u64 = 512 * 1024;
/// Dictionary source files beyond this are refused outright.
pub const MAX_DICT_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Load a priming dictionary.
///
/// Keeps at most the last [`MAX_DICT_SIZE`] bytes of the file and refuses
/// files larger than [`MAX_DICT_FILE_SIZE`] before reading anything. The
/// returned bytes are shared read-only across every frame of a session.
pub fn load_dictionary(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let file_size = file
        .metadata()
        .map_err(|source| Error::FileAccess {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    if file_size > MAX_DICT_FILE_SIZE {
        return Err(Error::Allocation(format!(
            "dictionary file {} is too large ({file_size} bytes)",
            path.display()
        )));
    }

    let keep = file_size.min(MAX_DICT_SIZE);
    if keep < file_size {
        file.seek(SeekFrom::Start(file_size - keep))
            .map_err(Error::Read)?;
    }
    let mut dict = vec![0u8; keep as usize];
    file.read_exact(&mut dict).map_err(Error::Read)?;
    Ok(dict)
}

// ── Legacy frame dispatch ──────────────────────────────────────────────────

/// Decoder for frame formats recognized purely by magic number.
///
/// A handler receives the already-read magic and the remaining stream, and
/// must consume exactly one frame.
pub trait LegacyHandler {
    fn recognizes(&self, magic: u32) -> bool;

    /// Decode one frame, returning the decoded byte count.
    fn decode_frame(
        &self,
        magic: u32,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Result<u64>;
}

/// Bundled handler for the single-frame block container format.
pub struct BlockFormatHandler<C> {
    registry: C,
}

impl<C: CodecRegistry> BlockFormatHandler<C> {
    pub fn new(registry: C) -> Self {
        Self { registry }
    }
}

impl<C: CodecRegistry> LegacyHandler for BlockFormatHandler<C> {
    fn recognizes(&self, magic: u32) -> bool {
        self.registry.by_magic(magic).is_some()
    }

    fn decode_frame(
        &self,
        magic: u32,
        input: &mut dyn Read,
        mut output: &mut dyn Write,
    ) -> Result<u64> {
        let mut reader = Reader::open_after_magic(input, &self.registry, magic)?;
        reader.decode_to(&mut output)
    }
}

// ── Compression session ────────────────────────────────────────────────────

/// Session state for engine-based frame compression.
///
/// Engine, dictionary, and engine-recommended buffers are allocated once
/// and reused for every file compressed through the session.
pub struct CompressSession {
    engine: Box<dyn StreamEngine>,
    dict: Vec<u8>,
    level: i32,
    src_buf: Vec<u8>,
    dst_buf: Vec<u8>,
}

impl CompressSession {
    /// `dict` is an already-loaded priming dictionary (see
    /// [`load_dictionary`]); pass an empty vector for none.
    pub fn new(engine: Box<dyn StreamEngine>, level: i32, dict: Vec<u8>) -> Self {
        let src_buf = vec![0u8; engine.compress_in_size()];
        let dst_buf = vec![0u8; engine.compress_out_size()];
        Self {
            engine,
            dict,
            level,
            src_buf,
            dst_buf,
        }
    }

    /// Compress one complete frame from `input` to `output`.
    ///
    /// `size_hint` is the expected total input size when the caller knows
    /// it (a regular file's length); the engine folds it into its
    /// compression parameters. Returns (raw bytes read, compressed bytes
    /// written).
    pub fn compress<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
        size_hint: Option<u64>,
    ) -> Result<(u64, u64)> {
        let mut encoder = self
            .engine
            .frame_encoder(self.level, size_hint, &self.dict)?;
        let mut raw = 0u64;
        let mut compressed = 0u64;

        loop {
            let in_len = read_fill(input, &mut self.src_buf)?;
            if in_len == 0 {
                break;
            }
            raw += in_len as u64;

            let step = encoder.step(&self.src_buf[..in_len], &mut self.dst_buf)?;
            if step.consumed != in_len {
                // Buffers are the engine's own recommended sizes, so a
                // partial consume means the engine broke its contract.
                return Err(Error::Protocol(format!(
                    "engine consumed {} of {} offered bytes",
                    step.consumed, in_len
                )));
            }
            output
                .write_all(&self.dst_buf[..step.produced])
                .map_err(Error::Write)?;
            compressed += step.produced as u64;
        }

        loop {
            let (produced, done) = encoder.finish(&mut self.dst_buf)?;
            output
                .write_all(&self.dst_buf[..produced])
                .map_err(Error::Write)?;
            compressed += produced as u64;
            if done {
                break;
            }
        }

        Ok((raw, compressed))
    }
}

// ── Decompression session ──────────────────────────────────────────────────

/// Session state for decoding a stream of concatenated frames.
pub struct DecompressSession {
    engine: Box<dyn StreamEngine>,
    dict: Vec<u8>,
    legacy: Option<Box<dyn LegacyHandler>>,
    src_buf: Vec<u8>,
    dst_buf: Vec<u8>,
}

impl DecompressSession {
    pub fn new(
        engine: Box<dyn StreamEngine>,
        dict: Vec<u8>,
        legacy: Option<Box<dyn LegacyHandler>>,
    ) -> Self {
        let src_buf = vec![0u8; engine.decompress_in_size()];
        let dst_buf = vec![0u8; engine.decompress_out_size()];
        Self {
            engine,
            dict,
            legacy,
            src_buf,
            dst_buf,
        }
    }

    /// Decode every frame in `input`, in file order, until clean
    /// end-of-file. Returns the total decoded byte count.
    pub fn decompress<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<u64> {
        let mut total = 0u64;

        loop {
            // Peek the next frame's magic. Zero bytes at a frame boundary
            // is a clean end of file; a short read is a truncated stream.
            let got = read_fill(input, &mut self.src_buf[..4])?;
            if got == 0 {
                break;
            }
            if got < 4 {
                return Err(Error::Read(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "truncated frame magic",
                )));
            }
            let magic = u32::from_le_bytes([
                self.src_buf[0],
                self.src_buf[1],
                self.src_buf[2],
                self.src_buf[3],
            ]);

            if let Some(handler) = self.legacy.as_ref().filter(|h| h.recognizes(magic)) {
                total += handler.decode_frame(magic, input, output)?;
                continue;
            }
            if magic != self.engine.frame_magic() {
                return Err(Error::Format(format!(
                    "unknown magic number 0x{magic:08x}"
                )));
            }
            total += self.decode_engine_frame(input, output)?;
        }

        Ok(total)
    }

    /// Decode one engine frame whose 4 magic bytes already sit at the front
    /// of the source buffer; they belong to the frame and are fed through.
    fn decode_engine_frame<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<u64> {
        let mut decoder = self.engine.frame_decoder(&self.dict)?;
        let mut frame = 0u64;
        let mut have = 4usize;

        loop {
            let step = decoder.step(&self.src_buf[..have], &mut self.dst_buf)?;
            output
                .write_all(&self.dst_buf[..step.produced])
                .map_err(Error::Write)?;
            frame += step.produced as u64;

            if step.next_read == 0 {
                break;
            }
            if step.consumed != have {
                return Err(Error::Protocol(format!(
                    "engine consumed {} of {} offered bytes",
                    step.consumed, have
                )));
            }
            if step.next_read > self.src_buf.len() {
                return Err(Error::Protocol(format!(
                    "engine requested {} bytes, beyond its own {}-byte buffer",
                    step.next_read,
                    self.src_buf.len()
                )));
            }
            input
                .read_exact(&mut self.src_buf[..step.next_read])
                .map_err(Error::Read)?;
            have = step.next_read;
        }

        Ok(frame)
    }
}

/// Read until `buf` is full or the source is exhausted; returns the byte
/// count. Block-sized reads keep their semantics on pipes this way.
fn read_fill<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Read(e)),
        }
    }
    Ok(filled)
}
