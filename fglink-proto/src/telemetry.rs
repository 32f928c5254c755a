//! Telemetry messages: high-rate vehicle state samples from the simulation
//! host. Read-only to the control side.

use crate::envelope::{Envelope, MessageKind};
use crate::error::Result;
use crate::now_millis;
use crate::wire::{WireReader, WireWriter};

/// One instant of simulated vehicle state.
///
/// Fixed 96-byte block, no variable section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Telemetry {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude above sea level in feet.
    pub altitude: f64,

    /// Roll angle in degrees.
    pub roll: f32,
    /// Pitch angle in degrees.
    pub pitch: f32,
    /// True heading in degrees.
    pub heading: f32,

    /// Indicated airspeed in knots.
    pub airspeed: f32,
    /// Vertical speed in feet per minute.
    pub vertical_speed: f32,
    /// Ground speed in knots.
    pub ground_speed: f32,

    /// Engine speed in RPM.
    pub engine_rpm: f32,
    /// Main rotor speed in RPM.
    pub rotor_rpm: f32,

    /// Collective position, 0..1.
    pub collective: f32,
    /// Lateral cyclic position, -1..1.
    pub cyclic_lat: f32,
    /// Longitudinal cyclic position, -1..1.
    pub cyclic_lon: f32,
    /// Pedal position, -1..1.
    pub pedals: f32,

    /// Wind speed in knots.
    pub wind_speed: f32,
    /// Wind direction in degrees.
    pub wind_direction: f32,
    /// Outside air temperature in degrees Celsius.
    pub temperature: f32,

    /// Milliseconds since the Unix epoch; zero is auto-filled on encode.
    pub timestamp: u64,
    /// Elapsed simulation time in seconds.
    pub sim_time: f32,
}

impl Telemetry {
    /// Fixed block: 3 f64, 15 f32, u64 timestamp, f32 sim time.
    pub const BLOCK_LENGTH: u16 = 96;

    /// Encodes the sample into a self-describing buffer.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w =
            WireWriter::with_capacity(Envelope::ENCODED_LENGTH + Self::BLOCK_LENGTH as usize);
        Envelope::new(Self::BLOCK_LENGTH, MessageKind::Telemetry).write(&mut w);
        w.put_f64(self.latitude);
        w.put_f64(self.longitude);
        w.put_f64(self.altitude);
        w.put_f32(self.roll);
        w.put_f32(self.pitch);
        w.put_f32(self.heading);
        w.put_f32(self.airspeed);
        w.put_f32(self.vertical_speed);
        w.put_f32(self.ground_speed);
        w.put_f32(self.engine_rpm);
        w.put_f32(self.rotor_rpm);
        w.put_f32(self.collective);
        w.put_f32(self.cyclic_lat);
        w.put_f32(self.cyclic_lon);
        w.put_f32(self.pedals);
        w.put_f32(self.wind_speed);
        w.put_f32(self.wind_direction);
        w.put_f32(self.temperature);
        w.put_u64(if self.timestamp == 0 {
            now_millis()
        } else {
            self.timestamp
        });
        w.put_f32(self.sim_time);
        w.finish()
    }

    /// Decodes a sample, verifying the envelope first.
    ///
    /// # Errors
    /// Returns a typed [`crate::ProtoError`] on truncation or kind/schema
    /// mismatch.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        Envelope::verify(buf, MessageKind::Telemetry, Self::BLOCK_LENGTH)?;
        let mut r = WireReader::with_offset(buf, Envelope::ENCODED_LENGTH);
        Ok(Self {
            latitude: r.read_f64()?,
            longitude: r.read_f64()?,
            altitude: r.read_f64()?,
            roll: r.read_f32()?,
            pitch: r.read_f32()?,
            heading: r.read_f32()?,
            airspeed: r.read_f32()?,
            vertical_speed: r.read_f32()?,
            ground_speed: r.read_f32()?,
            engine_rpm: r.read_f32()?,
            rotor_rpm: r.read_f32()?,
            collective: r.read_f32()?,
            cyclic_lat: r.read_f32()?,
            cyclic_lon: r.read_f32()?,
            pedals: r.read_f32()?,
            wind_speed: r.read_f32()?,
            wind_direction: r.read_f32()?,
            temperature: r.read_f32()?,
            timestamp: r.read_u64()?,
            sim_time: r.read_f32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtoError;
    use crate::status::Status;

    fn sample() -> Telemetry {
        Telemetry {
            latitude: 37.6188,
            longitude: -122.3754,
            altitude: 1250.0,
            roll: -2.5,
            pitch: 4.0,
            heading: 271.0,
            airspeed: 62.0,
            vertical_speed: 300.0,
            ground_speed: 58.0,
            engine_rpm: 6600.0,
            rotor_rpm: 324.0,
            collective: 0.62,
            cyclic_lat: -0.05,
            cyclic_lon: 0.12,
            pedals: 0.02,
            wind_speed: 8.0,
            wind_direction: 240.0,
            temperature: 15.0,
            timestamp: 1_700_000_000_500,
            sim_time: 360.25,
        }
    }

    #[test]
    fn test_round_trip() {
        let telemetry = sample();
        assert_eq!(Telemetry::decode(&telemetry.encode()).unwrap(), telemetry);
    }

    #[test]
    fn test_encoded_size_is_fixed() {
        let buf = sample().encode();
        assert_eq!(
            buf.len(),
            Envelope::ENCODED_LENGTH + Telemetry::BLOCK_LENGTH as usize
        );
    }

    #[test]
    fn test_zero_timestamp_filled() {
        let decoded = Telemetry::decode(&Telemetry::default().encode()).unwrap();
        assert_ne!(decoded.timestamp, 0);
    }

    #[test]
    fn test_every_truncation_fails() {
        let buf = sample().encode();
        for n in 0..buf.len() {
            assert!(Telemetry::decode(&buf[..n]).is_err());
        }
    }

    #[test]
    fn test_cross_kind_decode_fails() {
        let status = Status::new(crate::SimState::Running);
        assert!(matches!(
            Telemetry::decode(&status.encode()),
            Err(ProtoError::KindMismatch { .. })
        ));
    }
}
