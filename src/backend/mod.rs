//! Backend module for device acquisition
//!
//! This module runs the scope session in a separate thread to keep the UI
//! responsive. It uses crossbeam channels for thread-safe communication
//! with the frontend.
//!
//! # Architecture
//!
//! The backend runs in a separate thread from the UI, communicating via channels:
//!
//! - [`BackendCommand`] - Messages sent from UI to backend (source, trigger, scale, etc.)
//! - [`BackendMessage`] - Messages sent from backend to UI (frames, measurements, status)
//! - [`FrontendReceiver`] - UI-side handle for sending commands and receiving messages
//! - [`ScopeBackend`] - Main backend entry point that owns the worker
//!
//! # Components
//!
//! - [`DeviceTransport`] - Common trait for device links
//! - [`SerialTransport`] - USB serial link to the acquisition microcontroller
//! - [`MockDevice`] - Simulated device for testing without hardware (feature-gated)
//! - [`BackendWorker`] - Scheduling loop that drives the session
//!
//! # Example
//!
//! ```ignore
//! use scopevis_rs::backend::{BackendMessage, ScopeBackend};
//! use scopevis_rs::config::AppConfig;
//! use scopevis_rs::types::InputSource;
//!
//! let (backend, frontend) = ScopeBackend::new(AppConfig::default());
//!
//! // Spawn backend thread
//! std::thread::spawn(move || backend.run());
//!
//! // Send commands from UI
//! frontend.select_source(InputSource::Device);
//!
//! // Receive messages
//! for msg in frontend.drain() {
//!     if let BackendMessage::Scope(event) = msg {
//!         // Update the display
//!     }
//! }
//! ```

#[cfg(any(test, feature = "mock-device"))]
pub mod mock_device;
pub mod serial;
pub mod transport;
pub mod worker;

#[cfg(any(test, feature = "mock-device"))]
pub use mock_device::{MockDetachHandle, MockDevice, MockDeviceConfig, MockSignal};
pub use serial::{discover_port, SerialTransport};
pub use transport::{DeviceTransport, NoDevice, TransportEvent};
pub use worker::{BackendWorker, ChannelObserver, STATS_INTERVAL};

use crate::config::AppConfig;
use crate::pipeline::ScopeEvent;
use crate::types::{InputSource, PipelineStats, TriggerMode, TriggerSlope};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Capacity of the UI to backend command queue
pub const COMMAND_QUEUE_CAPACITY: usize = 256;
/// Capacity of the backend to UI message queue
pub const MESSAGE_QUEUE_CAPACITY: usize = 1024;

/// Message sent from the UI to the backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    /// Make a source the active one (re-selecting a lost device reconnects)
    SelectSource(InputSource),
    /// Start or pause streaming
    SetStreaming(bool),
    /// Change the trigger mode
    SetTriggerMode(TriggerMode),
    /// Change the trigger slope
    SetTriggerSlope(TriggerSlope),
    /// Explicit trigger level in volts, `None` for half the voltage scale
    SetTriggerLevel(Option<f32>),
    /// Re-arm a stopped single-shot trigger
    RearmTrigger,
    /// Set the voltage spanned by the display
    SetVoltageScale(f32),
    /// Request current statistics
    RequestStats,
    /// Shutdown the backend
    Shutdown,
    /// Use the mock device instead of real hardware (only available with mock-device feature)
    #[cfg(feature = "mock-device")]
    UseMockDevice(bool),
}

/// Message sent from the backend to the UI
#[derive(Debug, Clone, PartialEq)]
pub enum BackendMessage {
    /// Something happened in the session
    Scope(ScopeEvent),
    /// Statistics update
    Stats(PipelineStats),
    /// A command carried an invalid value
    SettingRejected(String),
    /// Backend is shutting down
    Shutdown,
}

/// Frontend receiver for backend messages
pub struct FrontendReceiver {
    /// Receiver for backend messages
    pub receiver: Receiver<BackendMessage>,
    /// Sender for commands to the backend
    pub command_sender: Sender<BackendCommand>,
}

impl FrontendReceiver {
    /// Try to receive a message without blocking
    pub fn try_recv(&self) -> Option<BackendMessage> {
        self.receiver.try_recv().ok()
    }

    /// Receive all pending messages
    pub fn drain(&self) -> Vec<BackendMessage> {
        self.receiver.try_iter().collect()
    }

    /// Send a command to the backend
    pub fn send_command(&self, cmd: BackendCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    pub fn select_source(&self, source: InputSource) {
        let _ = self.command_sender.send(BackendCommand::SelectSource(source));
    }

    pub fn set_streaming(&self, streaming: bool) {
        let _ = self
            .command_sender
            .send(BackendCommand::SetStreaming(streaming));
    }

    pub fn set_trigger_mode(&self, mode: TriggerMode) {
        let _ = self.command_sender.send(BackendCommand::SetTriggerMode(mode));
    }

    pub fn set_trigger_slope(&self, slope: TriggerSlope) {
        let _ = self
            .command_sender
            .send(BackendCommand::SetTriggerSlope(slope));
    }

    pub fn set_trigger_level(&self, level: Option<f32>) {
        let _ = self
            .command_sender
            .send(BackendCommand::SetTriggerLevel(level));
    }

    pub fn rearm_trigger(&self) {
        let _ = self.command_sender.send(BackendCommand::RearmTrigger);
    }

    pub fn set_voltage_scale(&self, scale: f32) {
        let _ = self
            .command_sender
            .send(BackendCommand::SetVoltageScale(scale));
    }

    pub fn request_stats(&self) {
        let _ = self.command_sender.send(BackendCommand::RequestStats);
    }

    /// Set whether to use the mock device (only available with mock-device feature)
    #[cfg(feature = "mock-device")]
    pub fn use_mock_device(&self, use_mock: bool) {
        let _ = self
            .command_sender
            .send(BackendCommand::UseMockDevice(use_mock));
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_sender.send(BackendCommand::Shutdown);
    }
}

/// The scope backend that runs in a separate thread
pub struct ScopeBackend {
    worker: BackendWorker,
    /// Running flag
    running: Arc<AtomicBool>,
}

impl ScopeBackend {
    /// Create a backend using the configured device transport
    pub fn new(config: AppConfig) -> (Self, FrontendReceiver) {
        let transport = worker::default_transport(&config);
        Self::with_transport(config, transport)
    }

    /// Create a backend around an explicit device transport
    pub fn with_transport(
        config: AppConfig,
        transport: Box<dyn DeviceTransport>,
    ) -> (Self, FrontendReceiver) {
        let (cmd_tx, cmd_rx) = bounded(COMMAND_QUEUE_CAPACITY);
        // Frames are dropped rather than queued once the UI falls this far behind
        let (msg_tx, msg_rx) = bounded(MESSAGE_QUEUE_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));

        let backend = Self {
            worker: BackendWorker::with_transport(
                config,
                transport,
                cmd_rx,
                msg_tx,
                running.clone(),
            ),
            running,
        };

        let frontend = FrontendReceiver {
            receiver: msg_rx,
            command_sender: cmd_tx,
        };

        (backend, frontend)
    }

    /// Run the backend loop
    pub fn run(mut self) {
        self.worker.run();
    }

    /// Get a handle to stop the backend
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}
