//! Length-prefixed message framing for TCP streams.
//!
//! An encoded message may span several stream reads, or several messages may
//! arrive in one read; the frame codec reassembles exact message boundaries.
//!
//! Frame format: `[4-byte length (little-endian)][message bytes]`

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Length-prefixed frame codec with a hard upper bound on frame size.
///
/// A declared length beyond the maximum is a malformed-input condition and
/// fails the decode rather than growing the buffer without bound.
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    /// Creates a frame codec with the specified maximum frame size.
    #[must_use]
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Returns the maximum frame size.
    #[must_use]
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(crate::MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }

        let length = u32::from_le_bytes([src[0], src[1], src[2], src[3]]) as usize;
        if length > self.max_frame_size {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "frame too large: {length} bytes exceeds maximum {} bytes",
                    self.max_frame_size
                ),
            ));
        }

        if src.len() < 4 + length {
            src.reserve(4 + length - src.len());
            return Ok(None);
        }

        src.advance(4);
        Ok(Some(src.split_to(length)))
    }
}

impl<T: AsRef<[u8]>> Encoder<T> for FrameCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let data = item.as_ref();
        if data.len() > self.max_frame_size {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "frame too large: {} bytes exceeds maximum {} bytes",
                    data.len(),
                    self.max_frame_size
                ),
            ));
        }

        dst.reserve(4 + data.len());
        dst.put_u32_le(data.len() as u32);
        dst.put_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let mut codec = FrameCodec::new(1024);
        let mut buf = BytesMut::new();

        codec.encode(b"control sample".as_slice(), &mut buf).unwrap();
        assert_eq!(buf.len(), 4 + 14);

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&decoded[..], b"control sample");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_frame_waits_for_more() {
        let mut codec = FrameCodec::new(1024);
        let mut buf = BytesMut::new();

        // Length prefix only arrives in pieces.
        buf.put_u8(6);
        buf.put_u8(0);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.put_u8(0);
        buf.put_u8(0);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        // Body split across two reads.
        buf.put_slice(b"abc");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.put_slice(b"def");
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], b"abcdef");
    }

    #[test]
    fn test_several_frames_in_one_read() {
        let mut codec = FrameCodec::new(1024);
        let mut buf = BytesMut::new();

        codec.encode(b"one".as_slice(), &mut buf).unwrap();
        codec.encode(b"two".as_slice(), &mut buf).unwrap();

        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], b"one");
        assert_eq!(&codec.decode(&mut buf).unwrap().unwrap()[..], b"two");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_oversized_inbound_frame_fails() {
        let mut codec = FrameCodec::new(16);
        let mut buf = BytesMut::new();
        buf.put_u32_le(17);

        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_oversized_outbound_frame_fails() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::new();

        let err = codec.encode([0u8; 9].as_slice(), &mut buf).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_default_max_matches_crate_limit() {
        assert_eq!(FrameCodec::default().max_frame_size(), crate::MAX_FRAME_SIZE);
    }
}
