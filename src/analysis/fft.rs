//! Spectrum of a captured frame, used to estimate the demo signal's frequency.
//!
//! Frames are mean-subtracted, Hann windowed and zero padded to a power of two
//! before the forward transform.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;

/// Magnitudes below this are treated as silence
const MAGNITUDE_FLOOR: f64 = 1e-9;

/// Smallest transform size; longer frames round up to the next power of two
pub const MIN_FFT_SIZE: usize = 1024;

/// Hann weight of sample `i` in a frame of `n`
fn hann(i: usize, n: usize) -> f64 {
    0.5 * (1.0 - (2.0 * PI * i as f64 / n as f64).cos())
}

/// One-sided spectrum, bin 0 is DC
#[derive(Debug, Clone)]
pub struct FftResult {
    /// Bin centre in Hz
    pub frequencies: Vec<f64>,
    /// Linear amplitude per bin
    pub magnitudes: Vec<f64>,
    /// Hz between adjacent bins
    pub frequency_resolution: f64,
}

impl FftResult {
    fn empty() -> Self {
        Self {
            frequencies: Vec::new(),
            magnitudes: Vec::new(),
            frequency_resolution: 0.0,
        }
    }

    /// Strongest non-DC bin as (frequency, magnitude)
    pub fn peak(&self) -> Option<(f64, f64)> {
        let (idx, &mag) = self
            .magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))?;

        if mag < MAGNITUDE_FLOOR {
            return None;
        }
        Some((self.frequencies[idx], mag))
    }
}

/// Reuses one planner across frames
pub struct FftAnalyzer {
    planner: FftPlanner<f64>,
}

impl std::fmt::Debug for FftAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftAnalyzer").finish_non_exhaustive()
    }
}

impl Default for FftAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl FftAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Compute the one-sided magnitude spectrum of `samples`
    pub fn compute(&mut self, samples: &[f64], sample_rate: f64) -> FftResult {
        let n = samples.len();
        if n == 0 || sample_rate <= 0.0 {
            return FftResult::empty();
        }

        let fft_size = MIN_FFT_SIZE.max(n).next_power_of_two();
        let mean = samples.iter().sum::<f64>() / n as f64;

        let mut buffer: Vec<Complex<f64>> = samples
            .iter()
            .enumerate()
            .map(|(i, &s)| Complex::new((s - mean) * hann(i, n), 0.0))
            .collect();
        buffer.resize(fft_size, Complex::new(0.0, 0.0));

        let fft = self.planner.plan_fft_forward(fft_size);
        fft.process(&mut buffer);

        let frequency_resolution = sample_rate / fft_size as f64;
        let num_bins = fft_size / 2 + 1;

        FftResult {
            frequencies: (0..num_bins)
                .map(|i| i as f64 * frequency_resolution)
                .collect(),
            magnitudes: buffer
                .iter()
                .take(num_bins)
                .map(|c| 2.0 * c.norm() / n as f64)
                .collect(),
            frequency_resolution,
        }
    }

    /// Dominant frequency in Hz, 0.0 when there is no periodic content
    pub fn dominant_frequency(&mut self, samples: &[f64], sample_rate: f64) -> f64 {
        self.compute(samples, sample_rate)
            .peak()
            .map(|(freq, _)| freq)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_hann_endpoints() {
        assert!(hann(0, 64).abs() < 1e-12);
        assert!((hann(32, 64) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_peak_of_pure_tone() {
        let mut analyzer = FftAnalyzer::new();
        let samples = sine(1000.0, 10_000.0, 512);
        let result = analyzer.compute(&samples, 10_000.0);
        let (freq, _) = result.peak().unwrap();
        assert!((freq - 1000.0).abs() <= result.frequency_resolution);
    }

    #[test]
    fn test_offset_tone_ignores_dc() {
        let mut analyzer = FftAnalyzer::new();
        let samples: Vec<f64> = sine(200.0, 10_000.0, 512)
            .into_iter()
            .map(|v| 2.5 + v)
            .collect();
        let freq = analyzer.dominant_frequency(&samples, 10_000.0);
        assert!((freq - 200.0).abs() <= 10_000.0 / MIN_FFT_SIZE as f64);
    }

    #[test]
    fn test_dc_only_has_no_peak() {
        let mut analyzer = FftAnalyzer::new();
        assert_eq!(analyzer.dominant_frequency(&[2.5; 256], 10_000.0), 0.0);
    }

    #[test]
    fn test_empty_input() {
        let mut analyzer = FftAnalyzer::new();
        let result = analyzer.compute(&[], 10_000.0);
        assert!(result.magnitudes.is_empty());
        assert!(result.peak().is_none());
    }

    #[test]
    fn test_zero_padding_to_power_of_two() {
        let mut analyzer = FftAnalyzer::new();
        let result = analyzer.compute(&sine(50.0, 1000.0, 1500), 1000.0);
        // 1500 samples pad to 2048 -> 1025 one-sided bins
        assert_eq!(result.magnitudes.len(), 1025);
        assert!((result.frequency_resolution - 1000.0 / 2048.0).abs() < 1e-12);
    }
}
