//! Bounds-checked little-endian wire access.
//!
//! [`WireReader`] never reads past the end of its buffer: every access
//! returns [`ProtoError::BufferTooShort`] instead of panicking. Strings are
//! length-prefixed (u16) UTF-8.

use crate::error::{ProtoError, Result};

/// Sequential reader over an encoded buffer.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader positioned at the start of `buf`.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Creates a reader positioned at `offset`.
    #[must_use]
    pub fn with_offset(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, pos: offset }
    }

    /// Current read position in bytes.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the position and the end of the buffer.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.saturating_add(len);
        if end > self.buf.len() {
            return Err(ProtoError::BufferTooShort {
                required: end,
                available: self.buf.len(),
            });
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Reads a u8.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a little-endian u16.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a little-endian u64.
    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.take(8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Reads a little-endian f32, bit-exact.
    pub fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.take(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a little-endian f64, bit-exact.
    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.take(8)?;
        Ok(f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Reads a u16 length-prefixed UTF-8 string.
    pub fn read_str(&mut self) -> Result<String> {
        let offset = self.pos;
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ProtoError::InvalidUtf8 { offset })
    }
}

/// Sequential writer producing an encoded buffer.
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    /// Creates a writer with the given initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a u8.
    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Writes a little-endian u16.
    pub fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian u64.
    pub fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian f32.
    pub fn put_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian f64.
    pub fn put_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a u16 length-prefixed UTF-8 string.
    ///
    /// Strings longer than `u16::MAX` bytes are truncated at the last char
    /// boundary that fits the prefix.
    pub fn put_str(&mut self, value: &str) {
        let mut len = value.len().min(u16::MAX as usize);
        while !value.is_char_boundary(len) {
            len -= 1;
        }
        self.put_u16(len as u16);
        self.buf.extend_from_slice(&value.as_bytes()[..len]);
    }

    /// Consumes the writer and returns the encoded buffer.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_round_trip() {
        let mut w = WireWriter::with_capacity(32);
        w.put_u8(7);
        w.put_u16(5502);
        w.put_u64(u64::MAX - 1);
        w.put_f32(12.5);
        w.put_f64(-47.397);
        let buf = w.finish();

        let mut r = WireReader::new(&buf);
        assert_eq!(r.read_u8().unwrap(), 7);
        assert_eq!(r.read_u16().unwrap(), 5502);
        assert_eq!(r.read_u64().unwrap(), u64::MAX - 1);
        assert_eq!(r.read_f32().unwrap(), 12.5);
        assert_eq!(r.read_f64().unwrap(), -47.397);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_read_past_end_fails() {
        let mut r = WireReader::new(&[1, 2, 3]);
        assert_eq!(
            r.read_u64(),
            Err(ProtoError::BufferTooShort {
                required: 8,
                available: 3
            })
        );
        // Position is unchanged after a failed read.
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn test_string_round_trip() {
        let mut w = WireWriter::with_capacity(16);
        w.put_str("uh-1");
        w.put_str("");
        let buf = w.finish();

        let mut r = WireReader::new(&buf);
        assert_eq!(r.read_str().unwrap(), "uh-1");
        assert_eq!(r.read_str().unwrap(), "");
    }

    #[test]
    fn test_truncated_string_fails() {
        let mut w = WireWriter::with_capacity(16);
        w.put_str("helicopter");
        let buf = w.finish();

        let mut r = WireReader::new(&buf[..buf.len() - 1]);
        assert!(matches!(
            r.read_str(),
            Err(ProtoError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&[0xff, 0xfe]);

        let mut r = WireReader::new(&buf);
        assert_eq!(r.read_str(), Err(ProtoError::InvalidUtf8 { offset: 0 }));
    }

    #[test]
    fn test_float_bits_preserved() {
        let values = [f32::NAN, f32::INFINITY, -0.0, f32::MIN_POSITIVE];
        for v in values {
            let mut w = WireWriter::with_capacity(4);
            w.put_f32(v);
            let buf = w.finish();
            let decoded = WireReader::new(&buf).read_f32().unwrap();
            assert_eq!(decoded.to_bits(), v.to_bits());
        }
    }
}
