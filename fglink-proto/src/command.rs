//! Command messages: discrete operation requests from the control side.

use crate::envelope::{Envelope, MessageKind};
use crate::error::{ProtoError, Result};
use crate::now_millis;
use crate::wire::{WireReader, WireWriter};

/// Operation requested of the simulation host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    /// Launch the simulator.
    Start = 0,
    /// Shut the simulator down.
    Stop = 1,
    /// Freeze the simulation clock.
    Pause = 2,
    /// Resume from pause.
    Resume = 3,
    /// Reset to the initial state.
    Reset = 4,
    /// Apply a new launch configuration.
    Configure = 5,
}

impl CommandType {
    fn from_wire(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Start),
            1 => Ok(Self::Stop),
            2 => Ok(Self::Pause),
            3 => Ok(Self::Resume),
            4 => Ok(Self::Reset),
            5 => Ok(Self::Configure),
            other => Err(ProtoError::InvalidEnumValue {
                field: "command_type",
                value: u64::from(other),
            }),
        }
    }
}

/// Simulator launch configuration, carried by commands that need one.
///
/// All fields default to empty; an absent config block on the wire decodes
/// to `None` on [`Command::config`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimConfig {
    /// Aircraft model identifier.
    pub aircraft: String,
    /// ICAO code of the starting airport.
    pub airport: String,
    /// Time of day preset.
    pub time_of_day: String,
    /// Weather preset.
    pub weather: String,
    /// Free-form extra launcher arguments.
    pub extra_args: Vec<String>,
}

/// A discrete operation request, optionally carrying a [`SimConfig`].
///
/// Both forms share one wire tag; a presence flag in the fixed block says
/// whether the variable section holds a config.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Requested operation.
    pub command_type: CommandType,
    /// Milliseconds since the Unix epoch; zero is auto-filled on encode.
    pub timestamp: u64,
    /// Launch configuration, if any.
    pub config: Option<SimConfig>,
}

impl Command {
    /// Fixed block: type u8, config-present flag u8, timestamp u64.
    pub const BLOCK_LENGTH: u16 = 10;

    /// Creates a type-only command with an auto-fill timestamp.
    #[must_use]
    pub fn new(command_type: CommandType) -> Self {
        Self {
            command_type,
            timestamp: 0,
            config: None,
        }
    }

    /// Creates a command carrying a full configuration.
    #[must_use]
    pub fn with_config(command_type: CommandType, config: SimConfig) -> Self {
        Self {
            command_type,
            timestamp: 0,
            config: Some(config),
        }
    }

    /// Encodes the command into a self-describing buffer.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = WireWriter::with_capacity(64);
        Envelope::new(Self::BLOCK_LENGTH, MessageKind::Command).write(&mut w);
        w.put_u8(self.command_type as u8);
        w.put_u8(u8::from(self.config.is_some()));
        w.put_u64(if self.timestamp == 0 {
            now_millis()
        } else {
            self.timestamp
        });
        if let Some(config) = &self.config {
            w.put_str(&config.aircraft);
            w.put_str(&config.airport);
            w.put_str(&config.time_of_day);
            w.put_str(&config.weather);
            let count = config.extra_args.len().min(u16::MAX as usize);
            w.put_u16(count as u16);
            for arg in config.extra_args.iter().take(count) {
                w.put_str(arg);
            }
        }
        w.finish()
    }

    /// Decodes a command, verifying the envelope first.
    ///
    /// # Errors
    /// Returns a typed [`ProtoError`] on truncation, kind or schema mismatch,
    /// or an unknown command type.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        Envelope::verify(buf, MessageKind::Command, Self::BLOCK_LENGTH)?;
        let mut r = WireReader::with_offset(buf, Envelope::ENCODED_LENGTH);
        let command_type = CommandType::from_wire(r.read_u8()?)?;
        let has_config = r.read_u8()? != 0;
        let timestamp = r.read_u64()?;
        let config = if has_config {
            let aircraft = r.read_str()?;
            let airport = r.read_str()?;
            let time_of_day = r.read_str()?;
            let weather = r.read_str()?;
            let count = r.read_u16()? as usize;
            let mut extra_args = Vec::with_capacity(count.min(64));
            for _ in 0..count {
                extra_args.push(r.read_str()?);
            }
            Some(SimConfig {
                aircraft,
                airport,
                time_of_day,
                weather,
                extra_args,
            })
        } else {
            None
        };
        Ok(Self {
            command_type,
            timestamp,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Control;

    fn sample_config() -> SimConfig {
        SimConfig {
            aircraft: "uh1".to_string(),
            airport: "KSFO".to_string(),
            time_of_day: "dawn".to_string(),
            weather: "fair".to_string(),
            extra_args: vec!["--enable-hud".to_string(), "--fog-disable".to_string()],
        }
    }

    #[test]
    fn test_type_only_round_trip() {
        let command = Command {
            command_type: CommandType::Pause,
            timestamp: 1_700_000_000_123,
            config: None,
        };
        let decoded = Command::decode(&command.encode()).unwrap();
        assert_eq!(decoded, command);
    }

    #[test]
    fn test_config_round_trip() {
        let command = Command {
            command_type: CommandType::Configure,
            timestamp: 42,
            config: Some(sample_config()),
        };
        let decoded = Command::decode(&command.encode()).unwrap();
        assert_eq!(decoded, command);
    }

    #[test]
    fn test_empty_config_round_trip() {
        let command = Command {
            command_type: CommandType::Start,
            timestamp: 1,
            config: Some(SimConfig::default()),
        };
        let decoded = Command::decode(&command.encode()).unwrap();
        assert_eq!(decoded.config, Some(SimConfig::default()));
    }

    #[test]
    fn test_zero_timestamp_filled() {
        let decoded = Command::decode(&Command::new(CommandType::Stop).encode()).unwrap();
        assert_ne!(decoded.timestamp, 0);
    }

    #[test]
    fn test_absent_config_decodes_to_none() {
        let decoded = Command::decode(&Command::new(CommandType::Reset).encode()).unwrap();
        assert_eq!(decoded.config, None);
    }

    #[test]
    fn test_every_truncation_fails() {
        let buf = Command::with_config(CommandType::Configure, sample_config()).encode();
        for n in 0..buf.len() {
            assert!(
                Command::decode(&buf[..n]).is_err(),
                "decode succeeded on {n} of {} bytes",
                buf.len()
            );
        }
        assert!(Command::decode(&buf).is_ok());
    }

    #[test]
    fn test_cross_kind_decode_fails() {
        let control = Control {
            collective: 0.5,
            cyclic_lat: 0.0,
            cyclic_lon: 0.0,
            pedals: 0.1,
            timestamp: 1,
        };
        assert!(matches!(
            Command::decode(&control.encode()),
            Err(ProtoError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_command_type_fails() {
        let mut buf = Command::new(CommandType::Start).encode();
        buf[Envelope::ENCODED_LENGTH] = 200;
        assert_eq!(
            Command::decode(&buf),
            Err(ProtoError::InvalidEnumValue {
                field: "command_type",
                value: 200,
            })
        );
    }
}
