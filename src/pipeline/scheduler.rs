//! Throttles measurement requests to the rate of displayed frames

use crate::acquisition::protocol::DeviceCommand;
use crate::config::MeasurementConfig;

/// Commands emitted each time the counter fills up
pub const MEASUREMENT_REQUESTS: [DeviceCommand; 2] =
    [DeviceCommand::RequestFrequency, DeviceCommand::RequestVoltage];

/// Counts accepted frames and asks for measurements every `request_every`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementScheduler {
    request_every: u32,
    accepted: u32,
}

impl MeasurementScheduler {
    pub fn new(request_every: u32) -> Self {
        Self {
            request_every: request_every.max(1),
            accepted: 0,
        }
    }

    pub fn from_config(config: &MeasurementConfig) -> Self {
        Self::new(config.request_every)
    }

    /// Frames counted since the last request
    pub fn pending(&self) -> u32 {
        self.accepted
    }

    /// Register one frame accepted by the trigger engine
    pub fn on_frame_accepted(&mut self) -> &'static [DeviceCommand] {
        self.accepted += 1;
        if self.accepted >= self.request_every {
            self.accepted = 0;
            &MEASUREMENT_REQUESTS
        } else {
            &[]
        }
    }

    pub fn reset(&mut self) {
        self.accepted = 0;
    }
}

impl Default for MeasurementScheduler {
    fn default() -> Self {
        Self::from_config(&MeasurementConfig::default())
    }
}
