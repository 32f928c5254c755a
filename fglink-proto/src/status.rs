//! Status messages: lifecycle and health reports from the simulation host.

use crate::envelope::{Envelope, MessageKind};
use crate::error::{ProtoError, Result};
use crate::now_millis;
use crate::wire::{WireReader, WireWriter};

/// Lifecycle state of the simulation host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SimState {
    /// Simulator not running.
    Idle = 0,
    /// Launch in progress.
    Starting = 1,
    /// Simulation running.
    Running = 2,
    /// Simulation clock frozen.
    Paused = 3,
    /// Shutdown in progress.
    Stopping = 4,
    /// Unrecoverable fault.
    Error = 5,
}

impl SimState {
    fn from_wire(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Idle),
            1 => Ok(Self::Starting),
            2 => Ok(Self::Running),
            3 => Ok(Self::Paused),
            4 => Ok(Self::Stopping),
            5 => Ok(Self::Error),
            other => Err(ProtoError::InvalidEnumValue {
                field: "state",
                value: u64::from(other),
            }),
        }
    }
}

/// A lifecycle and health report.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    /// Current lifecycle state.
    pub state: SimState,
    /// Milliseconds since the Unix epoch; zero is auto-filled on encode.
    pub timestamp: u64,
    /// Human-readable detail; empty when there is nothing to say.
    pub message: String,
    /// Seconds since the simulator started.
    pub uptime: u64,
    /// CPU usage percentage on the host.
    pub cpu_usage: f32,
    /// Memory usage percentage on the host.
    pub mem_usage: f32,
}

impl Status {
    /// Fixed block: state u8, timestamp u64, uptime u64, cpu f32, mem f32.
    pub const BLOCK_LENGTH: u16 = 25;

    /// Creates a report for `state` with everything else zeroed.
    #[must_use]
    pub fn new(state: SimState) -> Self {
        Self {
            state,
            timestamp: 0,
            message: String::new(),
            uptime: 0,
            cpu_usage: 0.0,
            mem_usage: 0.0,
        }
    }

    /// Encodes the report into a self-describing buffer.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = WireWriter::with_capacity(64);
        Envelope::new(Self::BLOCK_LENGTH, MessageKind::Status).write(&mut w);
        w.put_u8(self.state as u8);
        w.put_u64(if self.timestamp == 0 {
            now_millis()
        } else {
            self.timestamp
        });
        w.put_u64(self.uptime);
        w.put_f32(self.cpu_usage);
        w.put_f32(self.mem_usage);
        w.put_str(&self.message);
        w.finish()
    }

    /// Decodes a report, verifying the envelope first.
    ///
    /// # Errors
    /// Returns a typed [`ProtoError`] on truncation, kind or schema mismatch,
    /// or an unknown state value.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        Envelope::verify(buf, MessageKind::Status, Self::BLOCK_LENGTH)?;
        let mut r = WireReader::with_offset(buf, Envelope::ENCODED_LENGTH);
        let state = SimState::from_wire(r.read_u8()?)?;
        let timestamp = r.read_u64()?;
        let uptime = r.read_u64()?;
        let cpu_usage = r.read_f32()?;
        let mem_usage = r.read_f32()?;
        let message = r.read_str()?;
        Ok(Self {
            state,
            timestamp,
            message,
            uptime,
            cpu_usage,
            mem_usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Status {
        Status {
            state: SimState::Running,
            timestamp: 1_700_000_000_000,
            message: "airborne over KSFO".to_string(),
            uptime: 360,
            cpu_usage: 41.5,
            mem_usage: 28.0,
        }
    }

    #[test]
    fn test_round_trip() {
        let status = sample();
        assert_eq!(Status::decode(&status.encode()).unwrap(), status);
    }

    #[test]
    fn test_empty_message_round_trip() {
        let status = Status::new(SimState::Idle);
        let decoded = Status::decode(&status.encode()).unwrap();
        assert_eq!(decoded.message, "");
        assert_eq!(decoded.state, SimState::Idle);
    }

    #[test]
    fn test_zero_timestamp_filled() {
        let decoded = Status::decode(&Status::new(SimState::Starting).encode()).unwrap();
        assert_ne!(decoded.timestamp, 0);
    }

    #[test]
    fn test_every_truncation_fails() {
        let buf = sample().encode();
        for n in 0..buf.len() {
            assert!(Status::decode(&buf[..n]).is_err());
        }
    }

    #[test]
    fn test_unknown_state_fails() {
        let mut buf = sample().encode();
        buf[Envelope::ENCODED_LENGTH] = 77;
        assert_eq!(
            Status::decode(&buf),
            Err(ProtoError::InvalidEnumValue {
                field: "state",
                value: 77,
            })
        );
    }
}
