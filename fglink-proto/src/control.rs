//! Control messages: high-rate control-axis samples sent to the simulation
//! host.

use crate::envelope::{Envelope, MessageKind};
use crate::error::Result;
use crate::now_millis;
use crate::wire::{WireReader, WireWriter};

/// One control-axis sample.
///
/// Fixed 24-byte block, no variable section.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Control {
    /// Collective position, 0..1.
    pub collective: f32,
    /// Lateral cyclic position, -1..1.
    pub cyclic_lat: f32,
    /// Longitudinal cyclic position, -1..1.
    pub cyclic_lon: f32,
    /// Pedal position, -1..1.
    pub pedals: f32,
    /// Milliseconds since the Unix epoch; zero is auto-filled on encode.
    pub timestamp: u64,
}

impl Control {
    /// Fixed block: 4 f32 axes, u64 timestamp.
    pub const BLOCK_LENGTH: u16 = 24;

    /// Encodes the sample into a self-describing buffer.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w =
            WireWriter::with_capacity(Envelope::ENCODED_LENGTH + Self::BLOCK_LENGTH as usize);
        Envelope::new(Self::BLOCK_LENGTH, MessageKind::Control).write(&mut w);
        w.put_f32(self.collective);
        w.put_f32(self.cyclic_lat);
        w.put_f32(self.cyclic_lon);
        w.put_f32(self.pedals);
        w.put_u64(if self.timestamp == 0 {
            now_millis()
        } else {
            self.timestamp
        });
        w.finish()
    }

    /// Decodes a sample, verifying the envelope first.
    ///
    /// # Errors
    /// Returns a typed [`crate::ProtoError`] on truncation or kind/schema
    /// mismatch.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        Envelope::verify(buf, MessageKind::Control, Self::BLOCK_LENGTH)?;
        let mut r = WireReader::with_offset(buf, Envelope::ENCODED_LENGTH);
        Ok(Self {
            collective: r.read_f32()?,
            cyclic_lat: r.read_f32()?,
            cyclic_lon: r.read_f32()?,
            pedals: r.read_f32()?,
            timestamp: r.read_u64()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let control = Control {
            collective: 0.5,
            cyclic_lat: -0.25,
            cyclic_lon: 0.75,
            pedals: 0.1,
            timestamp: 1_700_000_000_250,
        };
        assert_eq!(Control::decode(&control.encode()).unwrap(), control);
    }

    #[test]
    fn test_zero_timestamp_filled() {
        let decoded = Control::decode(&Control::default().encode()).unwrap();
        assert_ne!(decoded.timestamp, 0);
    }

    #[test]
    fn test_every_truncation_fails() {
        let buf = Control {
            collective: 0.5,
            cyclic_lat: 0.0,
            cyclic_lon: 0.0,
            pedals: 0.1,
            timestamp: 1,
        }
        .encode();
        for n in 0..buf.len() {
            assert!(Control::decode(&buf[..n]).is_err());
        }
    }

    #[test]
    fn test_peek_kind_on_encoded_buffer() {
        let buf = Control::default().encode();
        assert_eq!(crate::peek_kind(&buf).unwrap(), MessageKind::Control);
    }
}
