//! Events published by the scope session to its observer

use crate::error::DeviceFault;
use crate::types::{
    ConnectionStatus, InputSource, Measurement, TriggerMode, TriggerPhase, TriggerSlope,
    WaveformFrame,
};
use chrono::{DateTime, Local};

/// Everything the display side needs to know about the session
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeEvent {
    /// A frame accepted by the trigger engine
    Frame {
        frame: WaveformFrame,
        source: InputSource,
        captured_at: DateTime<Local>,
    },
    /// A measurement decoded from the device or computed locally
    Measurement(Measurement),
    /// The line framer dropped data to resynchronise
    BufferOverflow,
    /// Device link state changed
    ConnectionStatus(ConnectionStatus),
    /// A transport failure the user should see
    DeviceFault(DeviceFault),
    /// Trigger configuration or phase changed
    TriggerStatus {
        mode: TriggerMode,
        slope: TriggerSlope,
        phase: TriggerPhase,
        threshold: f32,
    },
    /// The active frame source changed
    SourceChanged(InputSource),
    /// Streaming was started or paused
    StreamingChanged(bool),
    /// The voltage scale changed
    VoltageScaleChanged(f32),
}

/// Receives session events, once per accepted frame or decoded measurement
pub trait ScopeObserver {
    fn notify(&mut self, event: ScopeEvent);
}

impl ScopeObserver for Vec<ScopeEvent> {
    fn notify(&mut self, event: ScopeEvent) {
        self.push(event);
    }
}
