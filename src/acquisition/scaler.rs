//! ADC code to voltage conversion

use crate::config::AcquisitionConfig;
use crate::types::{WaveformFrame, DEFAULT_VREF};

/// Full-scale code of a 10-bit ADC
pub const DEFAULT_CODE_MAX: i32 = 1023;

/// Converts raw ADC codes into calibrated voltage frames.
///
/// Codes above `code_max` (or below zero) are passed through unclamped so
/// that device-side anomalies stay visible on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleScaler {
    vref: f32,
    code_max: i32,
}

impl SampleScaler {
    pub fn new(vref: f32, code_max: i32) -> Self {
        Self {
            vref,
            code_max: code_max.max(1),
        }
    }

    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self::new(config.vref, config.code_max)
    }

    pub fn vref(&self) -> f32 {
        self.vref
    }

    pub fn code_max(&self) -> i32 {
        self.code_max
    }

    /// Voltage of a single code
    pub fn volts(&self, code: i32) -> f32 {
        (code as f32 / self.code_max as f32) * self.vref
    }

    /// Build a frame from raw codes
    pub fn scale(&self, raw_codes: &[i32]) -> WaveformFrame {
        WaveformFrame::new(raw_codes.iter().map(|&c| self.volts(c)).collect())
    }
}

impl Default for SampleScaler {
    fn default() -> Self {
        Self::new(DEFAULT_VREF, DEFAULT_CODE_MAX)
    }
}

/// Convenience wrapper around [`SampleScaler::scale`]
pub fn scale(raw_codes: &[i32], vref: f32, code_max: i32) -> WaveformFrame {
    SampleScaler::new(vref, code_max).scale(raw_codes)
}
