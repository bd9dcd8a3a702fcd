use std::io::Write;

use crate::check::StreamCheck;
use crate::codec::{BlockCodec, Disposition};
use crate::error::{Error, Result};
use crate::format::{
    block_size_from_id, pack_trailer, BlockType, FRAME_HEADER_SIZE, MAX_BLOCK_HEADER_SIZE,
};

/// Streaming encoder for single-frame BRIX files.
///
/// # Write contract
/// [`Writer::new`] emits the 5-byte frame header immediately. Call
/// [`write`] any number of times with arbitrary-sized byte slices; the
/// writer gathers `block_size` bytes at a time and routes each gathered
/// block through the codec. Call [`finish`] to flush the partial tail
/// block and append the checksum trailer.
///
/// # Layout written
/// ```text
/// [MAGIC 4][DESCRIPTOR 1]
/// [BLOCK 0] [BLOCK 1] ...      ← header (1-5 bytes) + payload each
/// [TRAILER 3]                  ← 22-bit checksum of the raw stream
/// ```
///
/// [`write`]: Writer::write
/// [`finish`]: Writer::finish
pub struct Writer<W: Write> {
    out: W,
    codec: Box<dyn BlockCodec>,
    block_size: usize,
    /// Pending raw bytes not yet classified into a block.
    pending: Vec<u8>,
    /// Scratch destination for codec output, sized to the codec's bound.
    scratch: Vec<u8>,
    check: StreamCheck,
    /// Compressed bytes emitted so far, frame header included.
    written: u64,
}

impl<W: Write> Writer<W> {
    /// Open a frame on `out` for the given codec and block size descriptor.
    ///
    /// Fails with [`Error::Format`] if the descriptor is out of range.
    pub fn new(mut out: W, codec: Box<dyn BlockCodec>, block_size_id: u8) -> Result<Self> {
        let block_size = block_size_from_id(block_size_id)?;

        let mut header = [0u8; FRAME_HEADER_SIZE];
        header[..4].copy_from_slice(&codec.magic().to_le_bytes());
        header[4] = block_size_id;
        out.write_all(&header).map_err(Error::Write)?;

        let bound = codec.compress_bound(block_size);
        Ok(Self {
            out,
            codec,
            block_size,
            pending: Vec::with_capacity(block_size * 2),
            scratch: vec![0u8; bound],
            check: StreamCheck::new(),
            written: FRAME_HEADER_SIZE as u64,
        })
    }

    /// Nominal raw bytes per block (the tail block may be smaller).
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Buffer `data` and encode complete blocks as they fill up.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(data);
        while self.pending.len() >= self.block_size {
            let chunk: Vec<u8> = self.pending.drain(..self.block_size).collect();
            self.encode_block(&chunk)?;
        }
        Ok(())
    }

    /// Classify and emit one block of at most `block_size` bytes.
    ///
    /// Exposed for callers that do their own chunking; [`Writer::write`] is
    /// the buffered path. Empty chunks are ignored.
    pub fn encode_block(&mut self, chunk: &[u8]) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        if chunk.len() > self.block_size {
            return Err(Error::Format(format!(
                "block of {} bytes exceeds configured block size {}",
                chunk.len(),
                self.block_size
            )));
        }

        let mut disposition = self.codec.compress(&mut self.scratch, chunk)?;
        if let Disposition::Compressed(n) = disposition {
            if n < 2 {
                return Err(Error::Protocol(format!(
                    "codec {} reported a {n}-byte compressed block",
                    self.codec.name()
                )));
            }
            // A result that does not beat verbatim storage is stored raw,
            // which also keeps the 16-bit compressed-size field in range.
            if n >= chunk.len() {
                disposition = Disposition::Raw;
            }
        }

        let full = chunk.len() == self.block_size;
        let mut header = [0u8; MAX_BLOCK_HEADER_SIZE];
        match disposition {
            Disposition::Raw => {
                let len = data_header(&mut header, BlockType::Raw, full, chunk.len());
                self.emit(&header[..len])?;
                self.emit(chunk)?;
            }
            Disposition::RunLength => {
                let len = data_header(&mut header, BlockType::Rle, full, chunk.len());
                header[len] = chunk[0];
                self.emit(&header[..len + 1])?;
            }
            Disposition::Compressed(n) => {
                let mut len = data_header(&mut header, BlockType::Compressed, full, chunk.len());
                header[len] = (n >> 8) as u8;
                header[len + 1] = n as u8;
                len += 2;
                self.emit(&header[..len])?;
                self.out.write_all(&self.scratch[..n]).map_err(Error::Write)?;
                self.written += n as u64;
            }
        }

        self.check.update(chunk);
        Ok(())
    }

    /// Flush the partial tail block and seal the frame with its trailer.
    ///
    /// Returns the total compressed size, header and trailer included.
    pub fn finish(mut self) -> Result<u64> {
        if !self.pending.is_empty() {
            let tail = std::mem::take(&mut self.pending);
            self.encode_block(&tail)?;
        }
        let trailer = pack_trailer(self.check.digest22());
        self.emit(&trailer)?;
        self.out.flush().map_err(Error::Write)?;
        Ok(self.written)
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes).map_err(Error::Write)?;
        self.written += bytes.len() as u64;
        Ok(())
    }
}

/// Write the lead byte and, for non-full blocks, the 2-byte big-endian
/// original size. Returns the header length so far.
fn data_header(dst: &mut [u8], btype: BlockType, full: bool, orig_len: usize) -> usize {
    dst[0] = btype.lead(full);
    if full {
        1
    } else {
        dst[1] = (orig_len >> 8) as u8;
        dst[2] = orig_len as u8;
        3
    }
}
