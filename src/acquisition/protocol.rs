//! Device wire protocol
//!
//! Device → host lines are classified by a fixed prefix:
//!
//! | Line                    | Message                          |
//! |-------------------------|----------------------------------|
//! | `DATA:<int>,<int>,...`  | [`ProtocolMessage::Waveform`]    |
//! | `FREQ:<float>`          | [`ProtocolMessage::Frequency`]   |
//! | `VOLT:<f>,<f>,<f>,<f>`  | [`ProtocolMessage::Voltage`]     |
//!
//! Host → device commands are single ASCII bytes with no terminator, see
//! [`DeviceCommand`].

use crate::types::VoltageReading;
use thiserror::Error;

pub const DATA_PREFIX: &str = "DATA:";
pub const FREQ_PREFIX: &str = "FREQ:";
pub const VOLT_PREFIX: &str = "VOLT:";

/// Minimum number of fields in a `VOLT:` line
pub const VOLT_FIELDS: usize = 4;

/// A decoded device line
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolMessage {
    /// Raw ADC codes of one frame
    Waveform(Vec<i32>),
    /// Measured frequency in Hz
    Frequency(f64),
    /// Voltage report, peak-to-peak at index 3
    Voltage(VoltageReading),
}

/// Why a line was dropped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A `DATA:` token is not an integer; the whole frame is dropped
    #[error("malformed sample {token:?} at index {index}")]
    MalformedSample { index: usize, token: String },

    /// A `FREQ:` or `VOLT:` payload could not be parsed
    #[error("malformed {kind} measurement: {reason}")]
    MalformedMeasurement { kind: &'static str, reason: String },

    /// The line does not start with a known prefix
    #[error("unknown prefix {0:?}")]
    UnknownPrefix(String),
}

/// Decode one trimmed line
pub fn decode(line: &str) -> Result<ProtocolMessage, DecodeError> {
    if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
        decode_samples(payload).map(ProtocolMessage::Waveform)
    } else if let Some(payload) = line.strip_prefix(FREQ_PREFIX) {
        parse_measurement("frequency", payload).map(ProtocolMessage::Frequency)
    } else if let Some(payload) = line.strip_prefix(VOLT_PREFIX) {
        decode_voltage(payload).map(ProtocolMessage::Voltage)
    } else {
        Err(DecodeError::UnknownPrefix(prefix_of(line)))
    }
}

fn decode_samples(payload: &str) -> Result<Vec<i32>, DecodeError> {
    payload
        .split(',')
        .enumerate()
        .map(|(index, token)| {
            let token = token.trim();
            token
                .parse::<i32>()
                .map_err(|_| DecodeError::MalformedSample {
                    index,
                    token: token.to_string(),
                })
        })
        .collect()
}

fn decode_voltage(payload: &str) -> Result<VoltageReading, DecodeError> {
    let fields: Vec<&str> = payload.split(',').collect();
    if fields.len() < VOLT_FIELDS {
        return Err(DecodeError::MalformedMeasurement {
            kind: "voltage",
            reason: format!("expected {} fields, got {}", VOLT_FIELDS, fields.len()),
        });
    }

    let mut values = [0.0; VOLT_FIELDS];
    for (slot, field) in values.iter_mut().zip(&fields) {
        *slot = parse_measurement("voltage", field)?;
    }
    Ok(VoltageReading::new(values))
}

fn parse_measurement(kind: &'static str, text: &str) -> Result<f64, DecodeError> {
    let text = text.trim();
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) => Err(DecodeError::MalformedMeasurement {
            kind,
            reason: format!("non-finite value {:?}", text),
        }),
        Err(e) => Err(DecodeError::MalformedMeasurement {
            kind,
            reason: format!("{:?}: {}", text, e),
        }),
    }
}

/// Prefix of an unrecognised line, for diagnostics
fn prefix_of(line: &str) -> String {
    let head = line.split(':').next().unwrap_or(line);
    head.chars().take(16).collect()
}

/// Encode raw ADC codes as a `DATA:` line (without newline)
pub fn encode_waveform(codes: &[i32]) -> String {
    let body: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
    format!("{}{}", DATA_PREFIX, body.join(","))
}

/// Encode a frequency report (without newline)
pub fn encode_frequency(hz: f64) -> String {
    format!("{}{:.2}", FREQ_PREFIX, hz)
}

/// Encode a voltage report (without newline)
pub fn encode_voltage(reading: &VoltageReading) -> String {
    let body: Vec<String> = reading.values.iter().map(|v| format!("{:.3}", v)).collect();
    format!("{}{}", VOLT_PREFIX, body.join(","))
}

/// Commands sent from the host to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCommand {
    /// `S`: start streaming frames
    Start,
    /// `P`: pause streaming
    Pause,
    /// `F`: request a frequency report
    RequestFrequency,
    /// `V`: request a voltage report
    RequestVoltage,
}

impl DeviceCommand {
    /// Wire representation
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            DeviceCommand::Start => b"S",
            DeviceCommand::Pause => b"P",
            DeviceCommand::RequestFrequency => b"F",
            DeviceCommand::RequestVoltage => b"V",
        }
    }

    /// Parse a command byte as the device would
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'S' => Some(DeviceCommand::Start),
            b'P' => Some(DeviceCommand::Pause),
            b'F' => Some(DeviceCommand::RequestFrequency),
            b'V' => Some(DeviceCommand::RequestVoltage),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeviceCommand::Start => "start",
            DeviceCommand::Pause => "pause",
            DeviceCommand::RequestFrequency => "request frequency",
            DeviceCommand::RequestVoltage => "request voltage",
        };
        write!(f, "{} ({})", name, String::from_utf8_lossy(self.as_bytes()))
    }
}
