//! Display-side state and the actions the UI can emit
//!
//! [`ScopeState`] is everything the frontend knows about the session. It is
//! only changed by [`ScopeState::apply`] (backend messages) and
//! [`ScopeState::apply_action`] (optimistic updates for user actions), so it
//! can be tested without an egui context.

use chrono::{DateTime, Local};

use crate::backend::BackendMessage;
use crate::config::settings::RuntimeSettings;
use crate::config::AppConfig;
use crate::error::DeviceFault;
use crate::pipeline::ScopeEvent;
use crate::types::{ConnectionStatus, InputSource, PipelineStats, TriggerMode, WaveformFrame};

/// Actions that toolbar and keyboard shortcuts can emit
///
/// Widgets return `Vec<AppAction>` instead of talking to the backend directly.
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    SelectSource(InputSource),
    ToggleStreaming,
    SetTriggerMode(TriggerMode),
    ToggleSlope,
    RearmTrigger,
    SetVoltageScale(f32),
}

/// Frontend mirror of the session
#[derive(Debug, Clone)]
pub struct ScopeState {
    pub settings: RuntimeSettings,
    /// Frame currently on screen, kept for redraws
    pub last_frame: Option<WaveformFrame>,
    pub captured_at: Option<DateTime<Local>>,
    pub stats: PipelineStats,
    pub last_fault: Option<DeviceFault>,
    pub last_error: Option<String>,
    pub backend_stopped: bool,
}

impl ScopeState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            settings: RuntimeSettings::from_config(config),
            last_frame: None,
            captured_at: None,
            stats: PipelineStats::default(),
            last_fault: None,
            last_error: None,
            backend_stopped: false,
        }
    }

    /// Apply a backend message; returns whether the display changed
    pub fn apply(&mut self, message: BackendMessage) -> bool {
        match message {
            BackendMessage::Scope(event) => self.apply_event(event),
            BackendMessage::Stats(stats) => {
                self.stats = stats;
                true
            }
            BackendMessage::SettingRejected(reason) => {
                self.last_error = Some(reason);
                true
            }
            BackendMessage::Shutdown => {
                tracing::info!("Backend shutdown received");
                self.backend_stopped = true;
                false
            }
        }
    }

    fn apply_event(&mut self, event: ScopeEvent) -> bool {
        match event {
            ScopeEvent::Frame {
                frame, captured_at, ..
            } => {
                self.last_frame = Some(frame);
                self.captured_at = Some(captured_at);
            }
            ScopeEvent::Measurement(measurement) => self.settings.readout.update(&measurement),
            ScopeEvent::BufferOverflow => {
                tracing::debug!("Receive buffer overflow");
            }
            ScopeEvent::ConnectionStatus(status) => {
                self.settings.connection = status;
                if status == ConnectionStatus::Connected {
                    self.last_fault = None;
                    self.last_error = None;
                }
            }
            ScopeEvent::DeviceFault(fault) => {
                self.last_error = Some(format!("{}: {}", fault.kind, fault));
                self.last_fault = Some(fault);
            }
            ScopeEvent::TriggerStatus {
                mode,
                slope,
                phase,
                ..
            } => {
                self.settings.trigger.mode = mode;
                self.settings.trigger.slope = slope;
                self.settings.trigger.phase = phase;
            }
            ScopeEvent::SourceChanged(source) => {
                self.settings.set_source(source);
                self.last_frame = None;
                self.captured_at = None;
            }
            ScopeEvent::StreamingChanged(streaming) => self.settings.streaming = streaming,
            ScopeEvent::VoltageScaleChanged(scale) => {
                self.settings.set_voltage_scale(scale);
            }
        }
        true
    }

    /// Optimistic update for a user action; the backend confirms later
    pub fn apply_action(&mut self, action: &AppAction) {
        match action {
            AppAction::SelectSource(source) => self.settings.set_source(*source),
            AppAction::ToggleStreaming => {
                self.settings.toggle_streaming();
            }
            AppAction::SetTriggerMode(mode) => self.settings.trigger.mode = *mode,
            AppAction::ToggleSlope => {
                self.settings.trigger.slope = self.settings.trigger.slope.toggled();
            }
            AppAction::RearmTrigger => {}
            AppAction::SetVoltageScale(scale) => {
                self.settings.set_voltage_scale(*scale);
            }
        }
    }
}
