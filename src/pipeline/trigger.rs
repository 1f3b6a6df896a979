//! Trigger engine: decides per incoming frame whether it reaches the display.
//!
//! | Mode   | Phase after reset | Behaviour                                           |
//! |--------|-------------------|-----------------------------------------------------|
//! | Auto   | `FreeRun`         | every frame is forwarded                            |
//! | Normal | `ArmedWaiting`    | frames with a qualifying edge are forwarded         |
//! | Single | `ArmedWaiting`    | first qualifying frame is forwarded, then `Stopped` |
//!
//! A rejected frame yields `None`; the display keeps whatever it showed last.

use crate::config::TriggerConfig;
use crate::types::{TriggerMode, TriggerPhase, TriggerSlope, WaveformFrame};

/// Index of the first sample completing a qualifying edge.
///
/// Rising: `samples[i-1] < threshold <= samples[i]`.
/// Falling: `samples[i-1] > threshold >= samples[i]`.
pub fn find_edge(samples: &[f32], threshold: f32, slope: TriggerSlope) -> Option<usize> {
    samples
        .windows(2)
        .position(|pair| match slope {
            TriggerSlope::Rising => pair[0] < threshold && threshold <= pair[1],
            TriggerSlope::Falling => pair[0] > threshold && threshold >= pair[1],
        })
        .map(|i| i + 1)
}

/// Decides per frame whether it reaches the display
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEngine {
    mode: TriggerMode,
    slope: TriggerSlope,
    threshold: f32,
    phase: TriggerPhase,
}

impl TriggerEngine {
    pub fn new(mode: TriggerMode, slope: TriggerSlope, threshold: f32) -> Self {
        Self {
            mode,
            slope,
            threshold,
            phase: Self::initial_phase(mode),
        }
    }

    pub fn from_config(config: &TriggerConfig, voltage_scale: f32) -> Self {
        Self::new(config.mode, config.slope, config.threshold(voltage_scale))
    }

    fn initial_phase(mode: TriggerMode) -> TriggerPhase {
        match mode {
            TriggerMode::Auto => TriggerPhase::FreeRun,
            TriggerMode::Normal | TriggerMode::Single => TriggerPhase::ArmedWaiting,
        }
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    pub fn slope(&self) -> TriggerSlope {
        self.slope
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn phase(&self) -> TriggerPhase {
        self.phase
    }

    /// Switch mode; any latched single capture is discarded
    pub fn set_mode(&mut self, mode: TriggerMode) {
        self.mode = mode;
        self.phase = Self::initial_phase(mode);
    }

    pub fn set_slope(&mut self, slope: TriggerSlope) {
        self.slope = slope;
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    /// Leave `Stopped` and wait for the next qualifying edge.
    ///
    /// Idempotent. Auto mode has nothing to arm and stays free-running.
    pub fn rearm(&mut self) {
        if self.mode != TriggerMode::Auto {
            self.phase = TriggerPhase::ArmedWaiting;
        }
    }

    /// Offer a frame, returning it if it should be displayed
    pub fn offer(&mut self, frame: WaveformFrame) -> Option<WaveformFrame> {
        match (self.mode, self.phase) {
            (TriggerMode::Auto, _) => Some(frame),
            (_, TriggerPhase::Stopped) => None,
            (mode, _) => {
                find_edge(frame.samples(), self.threshold, self.slope)?;
                if mode == TriggerMode::Single {
                    tracing::debug!("Single capture latched");
                    self.phase = TriggerPhase::Stopped;
                }
                Some(frame)
            }
        }
    }
}

impl Default for TriggerEngine {
    fn default() -> Self {
        Self::from_config(&TriggerConfig::default(), 5.0)
    }
}
