//! The scope session: single owner of all acquisition and trigger state.
//!
//! A [`ScopeSession`] is driven entirely by method calls from one scheduling
//! thread (see [`crate::backend::worker`]). It holds no timers and spawns no
//! threads; the device link hands it bytes through [`ScopeSession::on_transport_event`]
//! and the scheduler calls [`ScopeSession::on_demo_tick`] while
//! [`ScopeSession::demo_active`] is true.
//!
//! Exactly one source feeds the trigger engine. Switching closes the device
//! link (dropping its event channel) or stops demo ticking before the new
//! source is activated, and resets the line framer in between.

use super::events::{ScopeEvent, ScopeObserver};
use super::scheduler::MeasurementScheduler;
use super::trigger::TriggerEngine;
use crate::acquisition::protocol::{decode, DeviceCommand, ProtocolMessage};
use crate::acquisition::{DemoSignalGenerator, Framed, LineFramer, SampleScaler};
use crate::analysis::FrameMeasurer;
use crate::backend::transport::{DeviceTransport, TransportEvent};
use crate::config::AppConfig;
use crate::error::{DeviceFault, DeviceFaultKind, Result, ScopeError};
use crate::types::{
    ConnectionStatus, InputSource, Measurement, PipelineStats, TriggerMode, TriggerSlope,
    WaveformFrame,
};
use crossbeam_channel::Receiver;

/// Single owner of the framer, trigger, demo generator and device link
pub struct ScopeSession<O: ScopeObserver> {
    config: AppConfig,
    framer: LineFramer,
    scaler: SampleScaler,
    demo: DemoSignalGenerator,
    trigger: TriggerEngine,
    scheduler: MeasurementScheduler,
    measurer: FrameMeasurer,
    transport: Box<dyn DeviceTransport>,
    device_events: Option<Receiver<TransportEvent>>,
    source: InputSource,
    streaming: bool,
    connection: ConnectionStatus,
    voltage_scale: f32,
    stats: PipelineStats,
    observer: O,
}

impl<O: ScopeObserver> ScopeSession<O> {
    /// New session with the demo source selected and streaming
    pub fn new(config: AppConfig, transport: Box<dyn DeviceTransport>, observer: O) -> Self {
        let voltage_scale = config.display.voltage_scale;
        Self {
            framer: LineFramer::new(config.acquisition.carry_capacity),
            scaler: SampleScaler::from_config(&config.acquisition),
            demo: DemoSignalGenerator::new(&config.demo, config.acquisition.frame_len),
            trigger: TriggerEngine::from_config(&config.trigger, voltage_scale),
            scheduler: MeasurementScheduler::from_config(&config.measurement),
            measurer: FrameMeasurer::new(),
            transport,
            device_events: None,
            source: InputSource::Demo,
            streaming: true,
            connection: ConnectionStatus::Disconnected,
            voltage_scale,
            stats: PipelineStats::default(),
            observer,
            config,
        }
    }

    // ==================== Accessors ====================

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn source(&self) -> InputSource {
        self.source
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn voltage_scale(&self) -> f32 {
        self.voltage_scale
    }

    pub fn trigger(&self) -> &TriggerEngine {
        &self.trigger
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Whether the scheduler should deliver demo ticks
    pub fn demo_active(&self) -> bool {
        self.source == InputSource::Demo && self.streaming
    }

    /// Event channel of the open device link, if any
    pub fn device_events(&self) -> Option<&Receiver<TransportEvent>> {
        self.device_events.as_ref()
    }

    // ==================== UI surface ====================

    /// Make `source` the only active frame source.
    ///
    /// Re-selecting the current source does nothing, except for a
    /// disconnected device, where it is the user-initiated reconnect.
    pub fn select_source(&mut self, source: InputSource) {
        let reconnect =
            source == InputSource::Device && self.connection == ConnectionStatus::Disconnected;
        if source == self.source && !reconnect {
            return;
        }

        if self.source == InputSource::Device {
            self.close_device();
        }
        self.framer.reset();
        self.scheduler.reset();

        if source != self.source {
            tracing::info!("Switching source: {} -> {}", self.source, source);
            self.source = source;
            self.observer.notify(ScopeEvent::SourceChanged(source));
        }

        if source == InputSource::Device {
            self.connect_device();
        }
    }

    /// Start or pause the active source
    pub fn set_streaming(&mut self, streaming: bool) {
        if self.streaming == streaming {
            return;
        }
        self.streaming = streaming;
        tracing::debug!("Streaming {}", if streaming { "started" } else { "paused" });

        if self.source == InputSource::Device && self.connection == ConnectionStatus::Connected {
            self.send(if streaming {
                DeviceCommand::Start
            } else {
                DeviceCommand::Pause
            });
        }
        self.observer.notify(ScopeEvent::StreamingChanged(streaming));
    }

    pub fn set_trigger_mode(&mut self, mode: TriggerMode) {
        self.trigger.set_mode(mode);
        self.notify_trigger();
    }

    pub fn set_trigger_slope(&mut self, slope: TriggerSlope) {
        self.trigger.set_slope(slope);
        self.notify_trigger();
    }

    /// Set an explicit trigger level, or `None` to follow the voltage scale
    pub fn set_trigger_level(&mut self, level: Option<f32>) {
        self.config.trigger.level = level;
        self.trigger
            .set_threshold(self.config.trigger.threshold(self.voltage_scale));
        self.notify_trigger();
    }

    pub fn rearm_trigger(&mut self) {
        self.trigger.rearm();
        self.notify_trigger();
    }

    /// Change the voltage spanned by the display; must be positive
    pub fn set_voltage_scale(&mut self, scale: f32) -> Result<()> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ScopeError::InvalidSetting(format!(
                "voltage scale must be positive, got {}",
                scale
            )));
        }
        self.voltage_scale = scale;
        self.trigger
            .set_threshold(self.config.trigger.threshold(scale));
        self.observer.notify(ScopeEvent::VoltageScaleChanged(scale));
        self.notify_trigger();
        Ok(())
    }

    /// Swap the device link; an open link is closed first
    pub fn replace_transport(&mut self, transport: Box<dyn DeviceTransport>) {
        self.close_device();
        self.transport = transport;
        if self.source == InputSource::Device {
            self.connect_device();
        }
    }

    /// Close the device link, pausing the device first if it is streaming
    pub fn shutdown(&mut self) {
        if self.connection == ConnectionStatus::Connected && self.streaming {
            self.send(DeviceCommand::Pause);
        }
        self.close_device();
    }

    // ==================== Inputs ====================

    /// One demo tick; ignored unless the demo source is active
    pub fn on_demo_tick(&mut self) {
        if !self.demo_active() {
            return;
        }
        let frame = self.demo.tick();
        self.accept_frame(frame);
    }

    pub fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Data(bytes) => self.on_device_bytes(&bytes),
            TransportEvent::Closed(reason) => self.on_device_closed(reason),
        }
    }

    /// Raw bytes from the device; ignored unless the device source is connected.
    ///
    /// While paused the framer still consumes bytes to stay in line sync, but
    /// waveform lines are dropped so no frame follows a processed pause.
    pub fn on_device_bytes(&mut self, bytes: &[u8]) {
        if self.source != InputSource::Device || self.connection != ConnectionStatus::Connected {
            return;
        }
        self.stats.bytes_received += bytes.len() as u64;

        for item in self.framer.ingest(bytes) {
            match item {
                Framed::Line(line) => {
                    self.stats.lines += 1;
                    self.handle_line(&line);
                }
                Framed::Overflow => {
                    self.stats.overflows += 1;
                    self.observer.notify(ScopeEvent::BufferOverflow);
                }
            }
        }
    }

    // ==================== Internals ====================

    fn handle_line(&mut self, line: &str) {
        match decode(line) {
            Ok(ProtocolMessage::Waveform(_)) if !self.streaming => {
                tracing::trace!("Dropped frame received while paused");
            }
            Ok(ProtocolMessage::Waveform(codes)) => {
                let frame = self.scaler.scale(&codes);
                self.accept_frame(frame);
            }
            Ok(ProtocolMessage::Frequency(hz)) => {
                self.publish_measurement(Measurement::Frequency(hz));
            }
            Ok(ProtocolMessage::Voltage(reading)) => {
                self.publish_measurement(Measurement::Voltage(reading));
            }
            Err(e) => {
                self.stats.decode_errors += 1;
                tracing::debug!("Dropped line: {}", e);
            }
        }
    }

    fn accept_frame(&mut self, frame: WaveformFrame) {
        self.stats.frames_received += 1;
        let phase_before = self.trigger.phase();

        let Some(frame) = self.trigger.offer(frame) else {
            tracing::trace!("Frame rejected by trigger");
            return;
        };

        self.stats.frames_displayed += 1;
        self.observer.notify(ScopeEvent::Frame {
            frame: frame.clone(),
            source: self.source,
            captured_at: chrono::Local::now(),
        });
        if self.trigger.phase() != phase_before {
            self.notify_trigger();
        }

        let requests = self.scheduler.on_frame_accepted();
        if requests.is_empty() {
            return;
        }
        match self.source {
            InputSource::Device => {
                for command in requests {
                    self.send(*command);
                }
            }
            InputSource::Demo => {
                let sample_rate = self.config.acquisition.sample_rate_hz;
                for measurement in self.measurer.measure(&frame, sample_rate) {
                    self.publish_measurement(measurement);
                }
            }
        }
    }

    fn publish_measurement(&mut self, measurement: Measurement) {
        self.stats.measurements += 1;
        self.observer.notify(ScopeEvent::Measurement(measurement));
    }

    fn notify_trigger(&mut self) {
        self.observer.notify(ScopeEvent::TriggerStatus {
            mode: self.trigger.mode(),
            slope: self.trigger.slope(),
            phase: self.trigger.phase(),
            threshold: self.trigger.threshold(),
        });
    }

    fn set_connection(&mut self, status: ConnectionStatus) {
        self.connection = status;
        self.observer.notify(ScopeEvent::ConnectionStatus(status));
    }

    /// Fire-and-forget write; failures are logged only
    fn send(&mut self, command: DeviceCommand) {
        match self.transport.write(command) {
            Ok(()) => tracing::trace!("Sent {}", command),
            Err(e) => tracing::warn!("Failed to send {}: {}", command, e),
        }
    }

    fn connect_device(&mut self) {
        self.set_connection(ConnectionStatus::Connecting);

        match self.transport.open(&self.config.device) {
            Ok(events) => {
                tracing::info!("Connected to {}", self.transport.name());
                self.device_events = Some(events);
                self.set_connection(ConnectionStatus::Connected);
                if self.streaming {
                    self.send(DeviceCommand::Start);
                }
            }
            Err(e) => {
                tracing::warn!("Device connection failed: {}", e);
                self.set_connection(ConnectionStatus::Disconnected);
                self.observer
                    .notify(ScopeEvent::DeviceFault(e.to_device_fault()));
            }
        }
    }

    fn close_device(&mut self) {
        self.device_events = None;
        if self.transport.is_open() {
            tracing::info!("Closing {}", self.transport.name());
            self.transport.close();
        }
        self.framer.reset();
        if self.connection != ConnectionStatus::Disconnected {
            self.set_connection(ConnectionStatus::Disconnected);
        }
    }

    fn on_device_closed(&mut self, reason: String) {
        if self.connection == ConnectionStatus::Disconnected {
            return;
        }
        tracing::warn!("Device link closed: {}", reason);
        self.close_device();
        self.observer.notify(ScopeEvent::DeviceFault(DeviceFault::new(
            DeviceFaultKind::Disconnected,
            reason,
        )));
    }
}
