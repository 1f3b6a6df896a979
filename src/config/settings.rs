//! Runtime settings that can be modified during application execution
//!
//! This module contains settings that may change during runtime,
//! separate from the persistent configuration. The frontend keeps one
//! [`RuntimeSettings`] as its mirror of the scheduling session: it is
//! updated optimistically when the user issues a command and corrected by
//! the events the backend sends back.
//!
//! # Main Types
//!
//! - [`RuntimeSettings`] - Current source, streaming and display scale
//! - [`TriggerSettings`] - Trigger mode, slope, level and engine phase
//! - [`MeasurementReadout`] - Latest frequency and peak-to-peak texts

use super::AppConfig;
use crate::types::{
    ConnectionStatus, InputSource, Measurement, TriggerMode, TriggerPhase, TriggerSlope,
};
use serde::{Deserialize, Serialize};

/// Voltage scales offered by the toolbar, in volts per full screen
pub const VOLTAGE_SCALE_PRESETS: &[f32] = &[1.0, 2.0, 3.3, 5.0, 10.0];

/// Runtime settings for the application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Active frame source
    pub source: InputSource,

    /// Whether frames are flowing (demo ticking or device started)
    pub streaming: bool,

    /// Device link state
    #[serde(skip)]
    pub connection: ConnectionStatus,

    /// Volts spanning the full vertical extent
    pub voltage_scale: f32,

    /// Major grid divisions per axis
    pub grid_divisions: u32,

    /// Trigger settings
    pub trigger: TriggerSettings,

    /// Latest measurement texts
    #[serde(skip)]
    pub readout: MeasurementReadout,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl RuntimeSettings {
    /// Create new runtime settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial settings matching a freshly built session
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            source: InputSource::Demo,
            streaming: true,
            connection: ConnectionStatus::Disconnected,
            voltage_scale: config.display.voltage_scale,
            grid_divisions: config.display.grid_divisions,
            trigger: TriggerSettings {
                mode: config.trigger.mode,
                slope: config.trigger.slope,
                level: config.trigger.level,
                phase: if config.trigger.mode == TriggerMode::Auto {
                    TriggerPhase::FreeRun
                } else {
                    TriggerPhase::ArmedWaiting
                },
            },
            readout: MeasurementReadout::default(),
        }
    }

    /// Toggle play/pause, returning the new streaming state
    pub fn toggle_streaming(&mut self) -> bool {
        self.streaming = !self.streaming;
        self.streaming
    }

    /// Change the voltage scale; non-positive values are ignored
    pub fn set_voltage_scale(&mut self, scale: f32) -> bool {
        if scale > 0.0 && scale.is_finite() {
            self.voltage_scale = scale;
            true
        } else {
            false
        }
    }

    /// Switch source and forget measurements from the previous one
    pub fn set_source(&mut self, source: InputSource) {
        if self.source != source {
            self.readout.clear();
        }
        self.source = source;
    }

    /// Effective trigger threshold in volts
    pub fn trigger_threshold(&self) -> f32 {
        self.trigger.level.unwrap_or(self.voltage_scale / 2.0)
    }

    /// Whether the device link is usable
    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionStatus::Connected
    }
}

/// Trigger settings mirrored from the trigger engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerSettings {
    pub mode: TriggerMode,

    pub slope: TriggerSlope,

    /// Explicit level in volts, `None` for the midpoint of the voltage scale
    pub level: Option<f32>,

    /// Last reported engine phase
    #[serde(skip)]
    pub phase: TriggerPhase,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            mode: TriggerMode::Auto,
            slope: TriggerSlope::Rising,
            level: None,
            phase: TriggerPhase::FreeRun,
        }
    }
}

impl TriggerSettings {
    /// Whether a single capture is being held
    pub fn is_holding(&self) -> bool {
        self.phase == TriggerPhase::Stopped
    }

    /// Whether the re-arm button does anything
    pub fn can_rearm(&self) -> bool {
        self.mode != TriggerMode::Auto
    }
}

/// Latest measurement texts shown in the readout panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementReadout {
    pub frequency: Option<String>,
    pub peak_to_peak: Option<String>,
}

impl MeasurementReadout {
    /// Apply a measurement; values without a readout leave the text unchanged
    pub fn update(&mut self, measurement: &Measurement) {
        let Some(text) = measurement.readout() else {
            return;
        };
        match measurement {
            Measurement::Frequency(_) => self.frequency = Some(text),
            Measurement::Voltage(_) => self.peak_to_peak = Some(text),
        }
    }

    pub fn clear(&mut self) {
        self.frequency = None;
        self.peak_to_peak = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VoltageReading;

    #[test]
    fn test_runtime_settings_default() {
        let settings = RuntimeSettings::default();
        assert_eq!(settings.source, InputSource::Demo);
        assert!(settings.streaming);
        assert!(!settings.is_connected());
        assert_eq!(settings.trigger.phase, TriggerPhase::FreeRun);
        assert!((settings.trigger_threshold() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_from_config_arms_non_auto_modes() {
        let mut config = AppConfig::default();
        config.trigger.mode = TriggerMode::Single;
        let settings = RuntimeSettings::from_config(&config);
        assert_eq!(settings.trigger.phase, TriggerPhase::ArmedWaiting);
        assert!(settings.trigger.can_rearm());
    }

    #[test]
    fn test_voltage_scale_rejects_nonsense() {
        let mut settings = RuntimeSettings::default();
        assert!(settings.set_voltage_scale(3.3));
        assert!(!settings.set_voltage_scale(0.0));
        assert!(!settings.set_voltage_scale(f32::NAN));
        assert_eq!(settings.voltage_scale, 3.3);
    }

    #[test]
    fn test_toggle_streaming() {
        let mut settings = RuntimeSettings::default();
        assert!(!settings.toggle_streaming());
        assert!(settings.toggle_streaming());
    }

    #[test]
    fn test_readout_ignores_non_positive_frequency() {
        let mut readout = MeasurementReadout::default();
        readout.update(&Measurement::Frequency(50.0));
        readout.update(&Measurement::Frequency(0.0));
        assert_eq!(readout.frequency.as_deref(), Some("50.00 Hz"));

        readout.update(&Measurement::Voltage(VoltageReading::new([0.0, 0.0, 0.0, 1.234])));
        assert_eq!(readout.peak_to_peak.as_deref(), Some("Vpp: 1.23V"));
    }

    #[test]
    fn test_source_switch_clears_readout() {
        let mut settings = RuntimeSettings::default();
        settings.readout.update(&Measurement::Frequency(10.0));
        settings.set_source(InputSource::Demo);
        assert!(settings.readout.frequency.is_some());
        settings.set_source(InputSource::Device);
        assert!(settings.readout.frequency.is_none());
    }
}
