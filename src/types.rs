//! Core data types for ScopeVis-RS
//!
//! This module contains the fundamental data structures shared by the
//! acquisition pipeline, the trigger logic, the renderer and the UI.
//!
//! # Main Types
//!
//! - [`WaveformFrame`] - One immutable sweep of voltage samples
//! - [`InputSource`] - Which frame source is active (demo generator or device)
//! - [`TriggerMode`] / [`TriggerSlope`] / [`TriggerPhase`] - Trigger discipline
//! - [`Measurement`] - Scalar measurements reported by the device or computed locally
//! - [`PipelineStats`] - Counters published periodically to the UI

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default number of samples in a frame
pub const DEFAULT_FRAME_LEN: usize = 512;

/// Default ADC reference voltage
pub const DEFAULT_VREF: f32 = 5.0;

/// One sweep of the display: an ordered, immutable sequence of voltages.
///
/// Cloning is cheap; the sample storage is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformFrame {
    samples: Arc<[f32]>,
}

impl WaveformFrame {
    /// Create a frame from voltage samples
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    /// The voltage samples in acquisition order
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Smallest and largest sample, or None for an empty frame
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let first = *self.samples.first()?;
        Some(
            self.samples
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }
}

impl From<Vec<f32>> for WaveformFrame {
    fn from(samples: Vec<f32>) -> Self {
        Self::new(samples)
    }
}

/// Frame source feeding the trigger engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InputSource {
    /// Synthetic sine generator, no hardware needed
    #[default]
    Demo,
    /// Microcontroller streaming over a serial link
    Device,
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSource::Demo => write!(f, "Demo"),
            InputSource::Device => write!(f, "Device"),
        }
    }
}

/// Oscilloscope trigger mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TriggerMode {
    /// Free-running, every frame is displayed
    #[default]
    Auto,
    /// Only frames containing a qualifying edge are displayed
    Normal,
    /// The first qualifying frame is displayed and then held until re-armed
    Single,
}

impl TriggerMode {
    /// All modes, in toolbar order
    pub fn all() -> &'static [TriggerMode] {
        &[TriggerMode::Auto, TriggerMode::Normal, TriggerMode::Single]
    }

    /// Short label used on scope front panels
    pub fn short_name(&self) -> &'static str {
        match self {
            TriggerMode::Auto => "AUTO",
            TriggerMode::Normal => "NORM",
            TriggerMode::Single => "SINGLE",
        }
    }
}

impl std::fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerMode::Auto => write!(f, "Auto"),
            TriggerMode::Normal => write!(f, "Normal"),
            TriggerMode::Single => write!(f, "Single"),
        }
    }
}

/// Edge direction that qualifies a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TriggerSlope {
    /// Signal crosses the threshold going up
    #[default]
    Rising,
    /// Signal crosses the threshold going down
    Falling,
}

impl TriggerSlope {
    /// The other slope
    pub fn toggled(self) -> Self {
        match self {
            TriggerSlope::Rising => TriggerSlope::Falling,
            TriggerSlope::Falling => TriggerSlope::Rising,
        }
    }
}

impl std::fmt::Display for TriggerSlope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerSlope::Rising => write!(f, "Rising"),
            TriggerSlope::Falling => write!(f, "Falling"),
        }
    }
}

/// Internal state of the trigger engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerPhase {
    /// Auto mode, no gating
    #[default]
    FreeRun,
    /// Waiting for a frame with a qualifying edge
    ArmedWaiting,
    /// Single capture done, holding until re-armed
    Stopped,
}

impl std::fmt::Display for TriggerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerPhase::FreeRun => write!(f, "Free run"),
            TriggerPhase::ArmedWaiting => write!(f, "Armed"),
            TriggerPhase::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Connection status of the device source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No device link open
    #[default]
    Disconnected,
    /// Attempting to open the link
    Connecting,
    /// Link open, bytes may arrive
    Connected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting..."),
            ConnectionStatus::Connected => write!(f, "Connected"),
        }
    }
}

/// The four voltage scalars of a `VOLT:` report.
///
/// The device defines the first three fields; only peak-to-peak (index 3)
/// has a fixed meaning. Locally computed readings use min, max, mean,
/// peak-to-peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageReading {
    pub values: [f64; 4],
}

impl VoltageReading {
    /// Index of the peak-to-peak field
    pub const PEAK_TO_PEAK_INDEX: usize = 3;

    pub fn new(values: [f64; 4]) -> Self {
        Self { values }
    }

    /// Peak-to-peak voltage
    pub fn peak_to_peak(&self) -> f64 {
        self.values[Self::PEAK_TO_PEAK_INDEX]
    }
}

/// A scalar measurement for the readout panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Signal frequency in Hz
    Frequency(f64),
    /// Voltage report
    Voltage(VoltageReading),
}

impl Measurement {
    /// Readout text, or None when the value should not replace the current one.
    ///
    /// Non-positive frequencies mean the device could not lock onto a period.
    pub fn readout(&self) -> Option<String> {
        match self {
            Measurement::Frequency(hz) if *hz > 0.0 => Some(format!("{:.2} Hz", hz)),
            Measurement::Frequency(_) => None,
            Measurement::Voltage(reading) => Some(format!("Vpp: {:.2}V", reading.peak_to_peak())),
        }
    }
}

/// Counters describing pipeline activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Bytes received from the device
    pub bytes_received: u64,
    /// Complete lines extracted by the framer
    pub lines: u64,
    /// Frames offered to the trigger engine
    pub frames_received: u64,
    /// Frames forwarded to the display
    pub frames_displayed: u64,
    /// Lines dropped because they failed to decode
    pub decode_errors: u64,
    /// Carry buffer resynchronisations
    pub overflows: u64,
    /// Measurements published
    pub measurements: u64,
    /// Events dropped because the UI queue was full
    pub dropped_messages: u64,
}

impl PipelineStats {
    /// Percentage of offered frames that reached the display
    pub fn display_ratio(&self) -> f64 {
        if self.frames_received == 0 {
            100.0
        } else {
            (self.frames_displayed as f64 / self.frames_received as f64) * 100.0
        }
    }
}
