//! Analysis module for signal processing
//!
//! This module provides signal analysis tools including:
//! - FFT (Fast Fourier Transform) for dominant frequency detection
//! - Frame voltage statistics used when the demo source stands in for a device

pub mod fft;
pub mod measure;

pub use fft::{FftAnalyzer, FftResult};
pub use measure::{voltage_reading, FrameMeasurer};
