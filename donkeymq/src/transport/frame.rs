//! Raw frames and their encoder and decoder
//!
//! Only the envelope is handled here. The extended header and the body are
//! carried as opaque bytes for whatever layer sits on top.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use donkeymq_types::definitions::{FRAME_HEADER_SIZE, MIN_MAX_FRAME_SIZE};
use tokio_util::codec::{Decoder, Encoder};

use super::{error::FramingError, frame_header::FrameHeader};

const MAX_EXTENDED_HEADER_LEN: usize = u8::MAX as usize * 4 - FRAME_HEADER_SIZE;

/// A frame whose extended header and body are left uninterpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    header: FrameHeader,
    extended_header: Bytes,
    body: Bytes,
}

impl RawFrame {
    /// Creates a new frame, deriving `size` and `data_offset` from the parts
    pub fn new(
        frame_type: u8,
        channel: u16,
        extended_header: impl Into<Bytes>,
        body: impl Into<Bytes>,
    ) -> Result<Self, FramingError> {
        let extended_header = extended_header.into();
        let body = body.into();

        if extended_header.len() % 4 != 0 {
            return Err(FramingError::UnalignedExtendedHeader(extended_header.len()));
        }
        if extended_header.len() > MAX_EXTENDED_HEADER_LEN {
            return Err(FramingError::ExtendedHeaderTooLong(extended_header.len()));
        }

        let header_len = FRAME_HEADER_SIZE + extended_header.len();
        let size = header_len + body.len();
        let size = u32::try_from(size).map_err(|_| FramingError::MaxFrameSizeExceeded {
            size,
            max: u32::MAX as usize,
        })?;
        let header = FrameHeader::new(size, (header_len / 4) as u8, frame_type, channel)?;

        Ok(Self {
            header,
            extended_header,
            body,
        })
    }

    /// Creates an empty frame. An empty frame carries no body and is only used to
    /// keep the connection alive
    pub fn empty(frame_type: u8, channel: u16) -> Self {
        Self {
            header: FrameHeader::empty(frame_type, channel),
            extended_header: Bytes::new(),
            body: Bytes::new(),
        }
    }

    /// Get the frame header
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Get the extended header
    pub fn extended_header(&self) -> &Bytes {
        &self.extended_header
    }

    /// Get the frame body
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume the frame to get the frame body
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Returns whether this is an empty frame
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Encoder and decoder of [`RawFrame`]s
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(MIN_MAX_FRAME_SIZE)
    }
}

impl FrameCodec {
    /// Creates a new codec. Prior to any explicit negotiation the max frame
    /// size is [`MIN_MAX_FRAME_SIZE`], and it is never allowed below that.
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size: std::cmp::max(MIN_MAX_FRAME_SIZE, max_frame_size),
        }
    }

    /// Get the max frame size
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Change the max frame size, typically after it has been agreed with the peer
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) -> &mut Self {
        self.max_frame_size = std::cmp::max(MIN_MAX_FRAME_SIZE, max_frame_size);
        self
    }

    fn check_size(&self, size: usize) -> Result<(), FramingError> {
        if size > self.max_frame_size {
            return Err(FramingError::MaxFrameSizeExceeded {
                size,
                max: self.max_frame_size,
            });
        }
        Ok(())
    }
}

impl Encoder<RawFrame> for FrameCodec {
    type Error = FramingError;

    fn encode(&mut self, item: RawFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size = item.header.size() as usize;
        self.check_size(size)?;

        dst.reserve(size);
        item.header.encode(dst);
        dst.put(item.extended_header);
        dst.put(item.body);
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Item = RawFrame;
    type Error = FramingError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Not even a full header yet, wait for more bytes
        if src.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let header = FrameHeader::decode(&src[..FRAME_HEADER_SIZE])?;
        let size = header.size() as usize;
        self.check_size(size)?;

        if src.len() < size {
            src.reserve(size - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(size).freeze();
        frame.advance(FRAME_HEADER_SIZE);
        let extended_header = frame.split_to(header.extended_header_len());

        Ok(Some(RawFrame {
            header,
            extended_header,
            body: frame,
        }))
    }
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, Bytes, BytesMut};
    use donkeymq_types::definitions::{FRAME_TYPE_AMQP, FRAME_TYPE_SASL};
    use futures_util::{SinkExt, StreamExt};
    use tokio_test::io::Builder;
    use tokio_util::codec::{Decoder, Encoder, Framed, FramedRead};

    use super::{FrameCodec, RawFrame};
    use crate::transport::error::{FrameHeaderError, FramingError};

    #[test]
    fn encode_empty_frame() {
        let mut codec = FrameCodec::default();
        let mut dst = BytesMut::new();
        codec
            .encode(RawFrame::empty(FRAME_TYPE_AMQP, 0), &mut dst)
            .unwrap();
        assert_eq!(&dst[..], &[0x00, 0x00, 0x00, 0x08, 0x02, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn new_frame_derives_size_and_offset() {
        let frame = RawFrame::new(FRAME_TYPE_SASL, 3, vec![1u8, 2, 3, 4], &b"body"[..]).unwrap();
        assert_eq!(frame.header().size(), 16);
        assert_eq!(frame.header().data_offset(), 3);
        assert_eq!(frame.header().channel(), 3);
        assert!(!frame.is_empty());

        assert!(matches!(
            RawFrame::new(FRAME_TYPE_AMQP, 0, vec![1u8, 2, 3], Bytes::new()),
            Err(FramingError::UnalignedExtendedHeader(3))
        ));
        assert!(matches!(
            RawFrame::new(FRAME_TYPE_AMQP, 0, vec![0u8; 1024], Bytes::new()),
            Err(FramingError::ExtendedHeaderTooLong(1024))
        ));
    }

    #[test]
    fn decode_waits_for_a_whole_frame() {
        let mut codec = FrameCodec::default();
        let mut src = BytesMut::new();
        src.put_slice(&[0x00, 0x00, 0x00, 0x0c, 0x02, 0x00]);
        assert!(codec.decode(&mut src).unwrap().is_none());

        src.put_slice(&[0x00, 0x05, b'p', b'i']);
        assert!(codec.decode(&mut src).unwrap().is_none());

        src.put_slice(&[b'n', b'g', 0xff]);
        let frame = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(frame.header().channel(), 5);
        assert_eq!(frame.body(), &Bytes::from_static(b"ping"));
        assert!(frame.extended_header().is_empty());
        // The byte after the frame stays buffered
        assert_eq!(&src[..], &[0xff]);
    }

    #[test]
    fn decode_skips_extended_header() {
        let mut codec = FrameCodec::default();
        let mut src = BytesMut::from(
            &[
                0x00, 0x00, 0x00, 0x0e, 0x03, 0x01, 0x00, 0x00, 0xde, 0xad, 0xbe, 0xef, 0x01, 0x02,
            ][..],
        );
        let frame = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(frame.header().frame_type(), FRAME_TYPE_SASL);
        assert_eq!(&frame.extended_header()[..], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(frame.into_body(), Bytes::from_static(&[0x01, 0x02]));
    }

    #[test]
    fn decode_rejects_invalid_header() {
        let mut codec = FrameCodec::default();
        let mut src = BytesMut::from(&[0x00, 0x00, 0x00, 0x08, 0x01, 0x00, 0x00, 0x00][..]);
        assert!(matches!(
            codec.decode(&mut src),
            Err(FramingError::Header(FrameHeaderError::InvalidDataOffset(1)))
        ));
    }

    #[test]
    fn frames_over_the_limit_are_rejected() {
        let mut codec = FrameCodec::new(0);
        assert_eq!(codec.max_frame_size(), 512);

        let mut src = BytesMut::from(&[0x00, 0x00, 0x02, 0x01, 0x02, 0x00, 0x00, 0x00][..]);
        assert!(matches!(
            codec.decode(&mut src),
            Err(FramingError::MaxFrameSizeExceeded { size: 513, max: 512 })
        ));

        let frame = RawFrame::new(FRAME_TYPE_AMQP, 0, Bytes::new(), vec![0u8; 600]).unwrap();
        let mut dst = BytesMut::new();
        assert!(codec.encode(frame.clone(), &mut dst).is_err());

        codec.set_max_frame_size(1024);
        assert!(codec.encode(frame, &mut dst).is_ok());
        assert_eq!(dst.len(), 608);
    }

    #[tokio::test]
    async fn framed_sink_writes_header_then_body() {
        let mock = Builder::new()
            .write(&[0x00, 0x00, 0x00, 0x0b, 0x02, 0x00, 0x00, 0x01, b'a', b'b', b'c'])
            .build();
        let mut framed = Framed::new(mock, FrameCodec::default());
        let frame = RawFrame::new(FRAME_TYPE_AMQP, 1, Bytes::new(), &b"abc"[..]).unwrap();
        framed.send(frame).await.unwrap();
    }

    #[tokio::test]
    async fn framed_stream_reassembles_split_reads() {
        let mock = Builder::new()
            .read(&[0x00, 0x00, 0x00])
            .read(&[0x0a, 0x02, 0x00, 0x00, 0x02, b'h'])
            .read(&[b'i'])
            .read(&[0x00, 0x00, 0x00, 0x08, 0x02, 0x00, 0x00, 0x00])
            .build();
        let mut framed = FramedRead::new(mock, FrameCodec::default());

        let first = framed.next().await.unwrap().unwrap();
        assert_eq!(first.header().channel(), 2);
        assert_eq!(first.body(), &Bytes::from_static(b"hi"));

        let second = framed.next().await.unwrap().unwrap();
        assert!(second.is_empty());

        assert!(framed.next().await.is_none());
    }
}
