use std::io::{Read, Write};

use crate::check::StreamCheck;
use crate::codec::{BlockCodec, CodecRegistry};
use crate::error::{Error, Result};
use crate::format::{
    block_size_from_id, unpack_trailer, BlockType, FLAG_FULL_BLOCK, MAX_BLOCK_HEADER_SIZE,
};

/// Streaming decoder for single-frame BRIX files.
///
/// # Read pattern
/// The lead byte of every block header is fetched together with the
/// previous block's payload in a single read of `payload + 1` bytes, so
/// the decoder issues one bulk read per block plus the small conditional
/// header reads. [`decode_next`] hands out one reconstructed block at a
/// time and returns `None` once the trailer has been read and verified
/// against the running checksum.
///
/// Header fields are range-checked before any payload is read, so a
/// hostile stream cannot ask for more than the input buffer holds.
///
/// [`decode_next`]: Reader::decode_next
pub struct Reader<R: Read> {
    input: R,
    codec: Box<dyn BlockCodec>,
    block_size: usize,
    /// One payload plus the prefetched next lead byte.
    in_buf: Vec<u8>,
    /// Reconstructed block for rle and compressed dispositions.
    out_buf: Vec<u8>,
    /// Lead byte of the next block header.
    next_lead: u8,
    check: StreamCheck,
    decoded: u64,
    done: bool,
}

impl<R: Read> Reader<R> {
    /// Open a frame: read the 5-byte header, resolve the codec from the
    /// magic number, and prefetch the first block header's lead byte.
    pub fn open(mut input: R, registry: &dyn CodecRegistry) -> Result<Self> {
        let mut magic = [0u8; 4];
        input.read_exact(&mut magic).map_err(Error::Read)?;
        Self::open_after_magic(input, registry, u32::from_le_bytes(magic))
    }

    /// Continue an open whose 4 magic bytes were already consumed by an
    /// outer frame scanner.
    pub fn open_after_magic(
        mut input: R,
        registry: &dyn CodecRegistry,
        magic: u32,
    ) -> Result<Self> {
        let codec = registry
            .by_magic(magic)
            .ok_or_else(|| Error::Format(format!("unknown magic number 0x{magic:08x}")))?;

        let mut descriptor = [0u8];
        input.read_exact(&mut descriptor).map_err(Error::Read)?;
        let block_size = block_size_from_id(descriptor[0])?;

        let mut lead = [0u8];
        input.read_exact(&mut lead).map_err(Error::Read)?;

        Ok(Self {
            input,
            codec,
            block_size,
            in_buf: vec![0u8; block_size + MAX_BLOCK_HEADER_SIZE],
            out_buf: vec![0u8; block_size],
            next_lead: lead[0],
            check: StreamCheck::new(),
            decoded: 0,
            done: false,
        })
    }

    /// Nominal raw bytes per block for this frame.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Codec resolved from the frame's magic number.
    pub fn codec_name(&self) -> &'static str {
        self.codec.name()
    }

    /// Total decoded bytes handed out so far.
    pub fn decoded_len(&self) -> u64 {
        self.decoded
    }

    /// Decode the next block, or verify the trailer and return `None`.
    pub fn decode_next(&mut self) -> Result<Option<&[u8]>> {
        if self.done {
            return Ok(None);
        }

        let lead = self.next_lead;
        let btype = BlockType::from_lead(lead);

        if btype == BlockType::Trailer {
            let mut rest = [0u8; 2];
            self.input.read_exact(&mut rest).map_err(Error::Read)?;
            let stored = unpack_trailer(lead, rest);
            let computed = self.check.digest22();
            if stored != computed {
                return Err(Error::Integrity { stored, computed });
            }
            self.done = true;
            return Ok(None);
        }

        // Original size: the full flag elides the field, and an explicit 0
        // means the full block size.
        let orig_size = if lead & FLAG_FULL_BLOCK != 0 {
            self.block_size
        } else {
            let mut size = [0u8; 2];
            self.input.read_exact(&mut size).map_err(Error::Read)?;
            match ((size[0] as usize) << 8) | size[1] as usize {
                0 => self.block_size,
                n => n,
            }
        };
        if orig_size > self.block_size {
            return Err(Error::Format(format!(
                "block claims {orig_size} original bytes with block size {}",
                self.block_size
            )));
        }

        let payload_len = match btype {
            BlockType::Compressed => {
                let mut size = [0u8; 2];
                self.input.read_exact(&mut size).map_err(Error::Read)?;
                let csize = ((size[0] as usize) << 8) | size[1] as usize;
                if csize < 2 || csize >= orig_size {
                    return Err(Error::Format(format!(
                        "compressed size {csize} out of range for a {orig_size}-byte block"
                    )));
                }
                csize
            }
            BlockType::Raw => orig_size,
            BlockType::Rle => 1,
            BlockType::Trailer => unreachable!("trailer handled above"),
        };

        // Payload plus the next header's lead byte in one read.
        let wanted = payload_len + 1;
        self.input
            .read_exact(&mut self.in_buf[..wanted])
            .map_err(Error::Read)?;
        self.next_lead = self.in_buf[payload_len];

        let block: &[u8] = match btype {
            BlockType::Compressed => {
                let n = self
                    .codec
                    .decompress(&mut self.out_buf[..orig_size], &self.in_buf[..payload_len])?;
                if n != orig_size {
                    return Err(Error::codec(
                        self.codec.name(),
                        format!("regenerated {n} bytes, block header says {orig_size}"),
                    ));
                }
                &self.out_buf[..orig_size]
            }
            BlockType::Raw => &self.in_buf[..payload_len],
            BlockType::Rle => {
                let run = self.in_buf[0];
                self.out_buf[..orig_size].fill(run);
                &self.out_buf[..orig_size]
            }
            BlockType::Trailer => unreachable!("trailer handled above"),
        };

        self.check.update(block);
        self.decoded += block.len() as u64;
        Ok(Some(block))
    }

    /// Drain the whole frame into `out`. Returns the decoded byte count.
    pub fn decode_to<W: Write>(&mut self, out: &mut W) -> Result<u64> {
        let mut total = 0u64;
        while let Some(block) = self.decode_next()? {
            out.write_all(block).map_err(Error::Write)?;
            total += block.len() as u64;
        }
        Ok(total)
    }
}
