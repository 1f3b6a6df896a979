//! Synthetic waveform source for running without hardware
//!
//! The generator holds no timer; the scheduler calls [`DemoSignalGenerator::tick`]
//! once per demo tick and feeds the frame to the trigger engine exactly like a
//! decoded device frame. Output is fully determined by the initial phase and
//! the configured constants.

use crate::config::DemoConfig;
use crate::types::WaveformFrame;
use std::f64::consts::PI;

/// Phase-accumulator sine generator
#[derive(Debug, Clone, PartialEq)]
pub struct DemoSignalGenerator {
    phase: u32,
    step: u32,
    period: u32,
    amplitude: f32,
    offset: f32,
    frame_len: usize,
}

impl DemoSignalGenerator {
    pub fn new(config: &DemoConfig, frame_len: usize) -> Self {
        let period = config.period.max(1);
        Self {
            phase: config.initial_phase % period,
            step: config.step,
            period,
            amplitude: config.amplitude,
            offset: config.offset,
            frame_len,
        }
    }

    /// Start from a specific phase
    pub fn with_phase(mut self, phase: u32) -> Self {
        self.phase = phase % self.period;
        self
    }

    /// Current phase accumulator value
    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Produce the next frame and advance the phase
    pub fn tick(&mut self) -> WaveformFrame {
        let frame = self.frame_at(self.phase);
        self.phase = ((self.phase as u64 + self.step as u64) % self.period as u64) as u32;
        frame
    }

    fn frame_at(&self, phase: u32) -> WaveformFrame {
        let period = self.period as f64;
        let samples = (0..self.frame_len)
            .map(|i| {
                let angle = 2.0 * PI * (phase as f64 + i as f64) / period;
                self.offset + self.amplitude * angle.sin() as f32
            })
            .collect();
        WaveformFrame::new(samples)
    }

    /// Return the phase accumulator to its configured start
    pub fn reset(&mut self, config: &DemoConfig) {
        self.phase = config.initial_phase % self.period;
    }
}
