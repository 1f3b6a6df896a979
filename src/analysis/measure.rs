//! Local measurements for sources that cannot report their own

use super::fft::FftAnalyzer;
use crate::types::{Measurement, VoltageReading, WaveformFrame};

/// Voltage statistics of a frame as min, max, mean, peak-to-peak
pub fn voltage_reading(frame: &WaveformFrame) -> Option<VoltageReading> {
    let (lo, hi) = frame.min_max()?;
    let mean = frame.samples().iter().map(|&v| v as f64).sum::<f64>() / frame.len() as f64;
    Some(VoltageReading::new([
        lo as f64,
        hi as f64,
        mean,
        (hi - lo) as f64,
    ]))
}

/// Computes the same pair of measurements a device reports for `F` and `V`
#[derive(Debug, Default)]
pub struct FrameMeasurer {
    analyzer: FftAnalyzer,
}

impl FrameMeasurer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frequency and voltage measurements of one frame; empty for an empty frame
    pub fn measure(&mut self, frame: &WaveformFrame, sample_rate_hz: f32) -> Vec<Measurement> {
        let Some(reading) = voltage_reading(frame) else {
            return Vec::new();
        };

        let samples: Vec<f64> = frame.samples().iter().map(|&v| v as f64).collect();
        let frequency = self
            .analyzer
            .dominant_frequency(&samples, sample_rate_hz as f64);

        vec![Measurement::Frequency(frequency), Measurement::Voltage(reading)]
    }
}
