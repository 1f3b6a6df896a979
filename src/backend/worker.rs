//! Backend Worker Thread Implementation
//!
//! This module contains the scheduling loop that owns the [`ScopeSession`]
//! and runs in its own thread. It communicates with the UI thread through
//! crossbeam channels.
//!
//! # Responsibilities
//!
//! - **Command processing**: Applies UI commands (source, streaming, trigger, scale)
//! - **Demo ticking**: Delivers demo ticks while the demo source streams
//! - **Device events**: Feeds transport bytes and link closure into the session
//! - **Statistics**: Publishes [`PipelineStats`] once per second
//!
//! # Scheduling
//!
//! Every wake-up source is a channel, so the loop is a single `select!`:
//! UI commands, the demo ticker (created when the demo starts streaming and
//! dropped when it stops), the open device link's event channel and the
//! stats ticker.
//! The session is only ever touched from this thread.

use crate::backend::serial::SerialTransport;
use crate::backend::transport::{DeviceTransport, TransportEvent};
use crate::backend::{BackendCommand, BackendMessage};
use crate::config::AppConfig;
use crate::pipeline::{ScopeEvent, ScopeObserver, ScopeSession};
use crate::types::PipelineStats;
use crossbeam_channel::{never, select, tick, Receiver, SendTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "mock-device")]
use crate::backend::mock_device::MockDevice;

/// How often statistics are published
pub const STATS_INTERVAL: Duration = Duration::from_secs(1);

/// Longest the worker waits on a full UI queue for a state event
pub const STATE_SEND_TIMEOUT: Duration = Duration::from_millis(250);

/// Forwards session events to the UI queue.
///
/// Frames and measurements are dropped at once when the queue is full. State
/// events wait up to [`STATE_SEND_TIMEOUT`]. Every drop is counted.
pub struct ChannelObserver {
    tx: Sender<BackendMessage>,
    dropped: u64,
}

impl ChannelObserver {
    pub fn new(tx: Sender<BackendMessage>) -> Self {
        Self { tx, dropped: 0 }
    }

    /// Frames dropped because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl ScopeObserver for ChannelObserver {
    fn notify(&mut self, event: ScopeEvent) {
        let periodic = matches!(event, ScopeEvent::Frame { .. } | ScopeEvent::Measurement(_));
        let message = BackendMessage::Scope(event);

        // Receiver gone only happens during shutdown
        if periodic {
            if let Err(TrySendError::Full(_)) = self.tx.try_send(message) {
                self.dropped += 1;
                tracing::trace!("UI queue full, dropped frame or measurement");
            }
        } else if let Err(SendTimeoutError::Timeout(message)) =
            self.tx.send_timeout(message, STATE_SEND_TIMEOUT)
        {
            self.dropped += 1;
            tracing::warn!("UI queue stalled, dropped {:?}", message);
        }
    }
}

/// Demo tick source that only exists while the demo streams
struct DemoClock {
    interval: Duration,
    ticker: Option<Receiver<Instant>>,
}

impl DemoClock {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            ticker: None,
        }
    }

    /// Ticker for this loop pass; a fresh one starts a full interval out
    fn receiver(&mut self, active: bool) -> Receiver<Instant> {
        if !active {
            self.ticker = None;
            return never();
        }
        let interval = self.interval;
        self.ticker.get_or_insert_with(|| tick(interval)).clone()
    }
}

/// Build the device link selected by the configuration
pub fn default_transport(config: &AppConfig) -> Box<dyn DeviceTransport> {
    #[cfg(feature = "mock-device")]
    {
        if config.device.use_mock {
            tracing::info!("Using mock device");
            return Box::new(MockDevice::default());
        }
    }
    #[cfg(not(feature = "mock-device"))]
    {
        if config.device.use_mock {
            tracing::warn!("Mock device requested but the mock-device feature is disabled");
        }
    }
    Box::new(SerialTransport::new())
}

/// The backend worker that runs the scheduling loop
pub struct BackendWorker {
    /// Session driven by this thread
    session: ScopeSession<ChannelObserver>,
    /// Command receiver from the UI
    command_rx: Receiver<BackendCommand>,
    /// Message sender to the UI
    message_tx: Sender<BackendMessage>,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Whether the session currently talks to the mock device
    #[cfg(feature = "mock-device")]
    is_mock_device: bool,
}

impl BackendWorker {
    /// Create a worker using the configured device transport
    pub fn new(
        config: AppConfig,
        command_rx: Receiver<BackendCommand>,
        message_tx: Sender<BackendMessage>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let transport = default_transport(&config);
        Self::with_transport(config, transport, command_rx, message_tx, running)
    }

    /// Create a worker around an explicit device transport
    pub fn with_transport(
        config: AppConfig,
        transport: Box<dyn DeviceTransport>,
        command_rx: Receiver<BackendCommand>,
        message_tx: Sender<BackendMessage>,
        running: Arc<AtomicBool>,
    ) -> Self {
        #[cfg(feature = "mock-device")]
        let is_mock_device = config.device.use_mock;
        let observer = ChannelObserver::new(message_tx.clone());

        Self {
            session: ScopeSession::new(config, transport, observer),
            command_rx,
            message_tx,
            running,
            #[cfg(feature = "mock-device")]
            is_mock_device,
        }
    }

    /// Run the scheduling loop until shutdown
    pub fn run(&mut self) {
        tracing::info!("Backend worker started");

        let commands = self.command_rx.clone();
        let mut demo_clock = DemoClock::new(self.session.config().demo.tick_interval());
        let stats_ticker = tick(STATS_INTERVAL);

        while self.running.load(Ordering::SeqCst) {
            let demo = demo_clock.receiver(self.session.demo_active());
            let device = self
                .session
                .device_events()
                .cloned()
                .unwrap_or_else(never);

            select! {
                recv(commands) -> cmd => match cmd {
                    Ok(cmd) => self.handle_command(cmd),
                    Err(_) => {
                        tracing::debug!("Command channel closed");
                        self.running.store(false, Ordering::SeqCst);
                    }
                },
                recv(demo) -> _ => self.session.on_demo_tick(),
                recv(device) -> event => match event {
                    Ok(event) => self.session.on_transport_event(event),
                    Err(_) => self.session.on_transport_event(TransportEvent::Closed(
                        "device link dropped".to_string(),
                    )),
                },
                recv(stats_ticker) -> _ => self.send_stats(),
            }
        }

        // Cleanup
        self.session.shutdown();

        let _ = self.message_tx.try_send(BackendMessage::Shutdown);
        tracing::info!("Backend worker stopped");
    }

    /// Statistics including frames the UI queue dropped
    pub fn stats(&self) -> PipelineStats {
        let mut stats = self.session.stats().clone();
        stats.dropped_messages = self.session.observer().dropped();
        stats
    }

    /// Handle a single command
    fn handle_command(&mut self, cmd: BackendCommand) {
        tracing::trace!("Command: {:?}", cmd);
        match cmd {
            BackendCommand::SelectSource(source) => self.session.select_source(source),
            BackendCommand::SetStreaming(streaming) => self.session.set_streaming(streaming),
            BackendCommand::SetTriggerMode(mode) => self.session.set_trigger_mode(mode),
            BackendCommand::SetTriggerSlope(slope) => self.session.set_trigger_slope(slope),
            BackendCommand::SetTriggerLevel(level) => self.session.set_trigger_level(level),
            BackendCommand::RearmTrigger => self.session.rearm_trigger(),
            BackendCommand::SetVoltageScale(scale) => {
                if let Err(e) = self.session.set_voltage_scale(scale) {
                    tracing::warn!("{}", e);
                    let _ = self.message_tx.send_timeout(
                        BackendMessage::SettingRejected(e.to_string()),
                        STATE_SEND_TIMEOUT,
                    );
                }
            }
            BackendCommand::RequestStats => self.send_stats(),
            BackendCommand::Shutdown => {
                self.running.store(false, Ordering::SeqCst);
            }
            #[cfg(feature = "mock-device")]
            BackendCommand::UseMockDevice(use_mock) => {
                if use_mock && !self.is_mock_device {
                    self.session.replace_transport(Box::new(MockDevice::default()));
                    self.is_mock_device = true;
                    tracing::info!("Switched to mock device");
                } else if !use_mock && self.is_mock_device {
                    self.session.replace_transport(Box::new(SerialTransport::new()));
                    self.is_mock_device = false;
                    tracing::info!("Switched to serial device");
                }
            }
        }
    }

    /// Commands queued but not yet handled
    #[cfg(test)]
    pub(crate) fn pending_commands(&self) -> Vec<BackendCommand> {
        self.command_rx.try_iter().collect()
    }

    fn send_stats(&self) {
        let _ = self.message_tx.try_send(BackendMessage::Stats(self.stats()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::transport::NoDevice;
    use crate::types::{InputSource, TriggerMode, WaveformFrame};
    use crossbeam_channel::bounded;

    fn create_test_worker(
        capacity: usize,
    ) -> (BackendWorker, Receiver<BackendMessage>, Sender<BackendCommand>) {
        let (cmd_tx, cmd_rx) = bounded(16);
        let (msg_tx, msg_rx) = bounded(capacity);
        let running = Arc::new(AtomicBool::new(true));
        let mut config = AppConfig::default();
        config.demo.tick_ms = 5;

        let worker =
            BackendWorker::with_transport(config, Box::new(NoDevice), cmd_rx, msg_tx, running);

        (worker, msg_rx, cmd_tx)
    }

    fn frame_event() -> ScopeEvent {
        ScopeEvent::Frame {
            frame: WaveformFrame::new(vec![0.0; 4]),
            source: InputSource::Demo,
            captured_at: chrono::Local::now(),
        }
    }

    #[test]
    fn test_observer_drops_frames_when_full() {
        let (tx, rx) = bounded(1);
        let mut observer = ChannelObserver::new(tx);

        observer.notify(frame_event());
        observer.notify(frame_event());
        assert_eq!(observer.dropped(), 1);
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_stalled_ui_does_not_block_worker() {
        let (tx, rx) = bounded(1);
        let mut observer = ChannelObserver::new(tx);
        observer.notify(frame_event());

        let start = Instant::now();
        observer.notify(ScopeEvent::Measurement(crate::types::Measurement::Frequency(50.0)));
        observer.notify(ScopeEvent::StreamingChanged(false));

        assert!(start.elapsed() < STATE_SEND_TIMEOUT * 4);
        assert_eq!(observer.dropped(), 2);
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_state_event_waits_for_ui_to_drain() {
        let (tx, rx) = bounded(1);
        let mut observer = ChannelObserver::new(tx);
        observer.notify(frame_event());

        let reader = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            rx.iter().take(2).collect::<Vec<_>>()
        });
        observer.notify(ScopeEvent::StreamingChanged(false));

        let received = reader.join().unwrap();
        assert_eq!(observer.dropped(), 0);
        assert!(matches!(
            received[1],
            BackendMessage::Scope(ScopeEvent::StreamingChanged(false))
        ));
    }

    #[test]
    fn test_demo_clock_restarts_after_stop() {
        let mut clock = DemoClock::new(Duration::from_millis(10));

        let first = clock.receiver(true);
        std::thread::sleep(Duration::from_millis(30));
        assert!(first.try_recv().is_ok());

        let stopped = clock.receiver(false);
        assert!(clock.ticker.is_none());
        assert!(stopped.try_recv().is_err());
        drop(first);

        // Long pause: a stale tick would be ready immediately
        std::thread::sleep(Duration::from_millis(30));
        let resumed = clock.receiver(true);
        assert!(resumed.try_recv().is_err());
        assert!(resumed.recv_timeout(Duration::from_millis(200)).is_ok());
    }

    #[test]
    fn test_invalid_scale_is_rejected() {
        let (mut worker, msg_rx, _) = create_test_worker(16);

        worker.handle_command(BackendCommand::SetVoltageScale(0.0));
        let rejected = msg_rx
            .try_iter()
            .any(|m| matches!(m, BackendMessage::SettingRejected(_)));
        assert!(rejected);
        assert_eq!(worker.session.voltage_scale(), AppConfig::default().display.voltage_scale);
    }

    #[test]
    fn test_commands_reach_session() {
        let (mut worker, msg_rx, _) = create_test_worker(64);

        worker.handle_command(BackendCommand::SetTriggerMode(TriggerMode::Normal));
        worker.handle_command(BackendCommand::SetStreaming(false));
        assert_eq!(worker.session.trigger().mode(), TriggerMode::Normal);
        assert!(!worker.session.is_streaming());
        assert!(!worker.session.demo_active());

        worker.handle_command(BackendCommand::SelectSource(InputSource::Device));
        assert_eq!(worker.session.source(), InputSource::Device);
        let faulted = msg_rx
            .try_iter()
            .any(|m| matches!(m, BackendMessage::Scope(ScopeEvent::DeviceFault(_))));
        assert!(faulted);
    }

    #[test]
    fn test_shutdown_command() {
        let (mut worker, _, _) = create_test_worker(16);

        worker.handle_command(BackendCommand::Shutdown);
        assert!(!worker.running.load(Ordering::SeqCst));
    }

    #[test]
    fn test_demo_frames_flow_until_shutdown() {
        let (mut worker, msg_rx, cmd_tx) = create_test_worker(1024);
        let handle = std::thread::spawn(move || worker.run());

        let frame = msg_rx
            .iter()
            .find(|m| matches!(m, BackendMessage::Scope(ScopeEvent::Frame { .. })));
        assert!(frame.is_some());

        cmd_tx.send(BackendCommand::Shutdown).unwrap();
        let shutdown = msg_rx
            .iter()
            .any(|m| matches!(m, BackendMessage::Shutdown));
        assert!(shutdown);
        handle.join().unwrap();
    }
}
