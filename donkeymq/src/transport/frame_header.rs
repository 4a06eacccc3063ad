//! Frame header
//!
//! Every frame exchanged after the protocol header starts with the same 8 bytes,
//! all big-endian and unsigned:
//!
//! ```text
//! 0          4        5        6          8
//! +----------+--------+--------+----------+
//! |   size   |  doff  |  type  | channel  |
//! +----------+--------+--------+----------+
//! ```
//!
//! followed by `doff * 4 - 8` bytes of extended header which are not interpreted here.

use bytes::{Buf, BufMut};
use donkeymq_types::definitions::{FRAME_HEADER_SIZE, MIN_DATA_OFFSET};

use super::error::FrameHeaderError;

/// Frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    size: u32,
    data_offset: u8,
    frame_type: u8,
    channel: u16,
}

impl FrameHeader {
    /// Creates a new frame header, checking that `size` can hold the header
    /// described by `data_offset`
    pub fn new(
        size: u32,
        data_offset: u8,
        frame_type: u8,
        channel: u16,
    ) -> Result<Self, FrameHeaderError> {
        if size < FRAME_HEADER_SIZE as u32 {
            return Err(FrameHeaderError::SizeTooSmall(size));
        }
        if data_offset < MIN_DATA_OFFSET {
            return Err(FrameHeaderError::InvalidDataOffset(data_offset));
        }
        if data_offset as u32 * 4 > size {
            return Err(FrameHeaderError::DataOffsetExceedsSize { data_offset, size });
        }

        Ok(Self {
            size,
            data_offset,
            frame_type,
            channel,
        })
    }

    /// Header of a frame that has neither extended header nor body
    pub fn empty(frame_type: u8, channel: u16) -> Self {
        Self {
            size: FRAME_HEADER_SIZE as u32,
            data_offset: MIN_DATA_OFFSET,
            frame_type,
            channel,
        }
    }

    /// Total frame length in bytes, header included
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Header length in 4-byte words
    pub fn data_offset(&self) -> u8 {
        self.data_offset
    }

    /// Frame type code
    pub fn frame_type(&self) -> u8 {
        self.frame_type
    }

    /// Channel number
    pub fn channel(&self) -> u16 {
        self.channel
    }

    /// Header length in bytes, extended header included
    pub fn header_len(&self) -> usize {
        self.data_offset as usize * 4
    }

    /// Length of the extended header in bytes
    pub fn extended_header_len(&self) -> usize {
        self.header_len() - FRAME_HEADER_SIZE
    }

    /// Length of the frame body in bytes
    pub fn body_len(&self) -> usize {
        self.size as usize - self.header_len()
    }

    /// Writes the 8 fixed header bytes into `dst`
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u32(self.size);
        dst.put_u8(self.data_offset);
        dst.put_u8(self.frame_type);
        dst.put_u16(self.channel);
    }

    /// Returns the 8 fixed header bytes
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut buf = [0u8; FRAME_HEADER_SIZE];
        self.encode(&mut &mut buf[..]);
        buf
    }

    /// Decodes the fixed header from the start of `src`. Bytes after the first 8
    /// are ignored.
    pub fn decode(mut src: &[u8]) -> Result<Self, FrameHeaderError> {
        if src.len() < FRAME_HEADER_SIZE {
            return Err(FrameHeaderError::Incomplete(src.len()));
        }

        let size = src.get_u32();
        let data_offset = src.get_u8();
        let frame_type = src.get_u8();
        let channel = src.get_u16();
        Self::new(size, data_offset, frame_type, channel)
    }
}
