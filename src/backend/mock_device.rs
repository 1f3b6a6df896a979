//! Mock Device Implementation for Testing
//!
//! This module provides a simulated acquisition microcontroller that can be
//! used to run the application and the integration tests without hardware.
//! It speaks the same wire protocol as the firmware.
//!
//! # Behaviour
//!
//! - `S` / `P` start and pause streaming of `DATA:` frames
//! - `F` is answered with a `FREQ:` line, `V` with a `VOLT:` line
//! - Frames are split across uneven chunks, the way a USB serial bridge
//!   delivers them
//! - [`MockDetachHandle::detach`] simulates unplugging the device
//!
//! # Data Patterns
//!
//! - [`MockSignal::Sine`] - Sinusoid around the mid-scale code
//! - [`MockSignal::Square`] - Square wave between two codes
//! - [`MockSignal::Triangle`] - Triangle wave
//!
//! # Enabling
//!
//! The mock device is always available to unit tests; binaries and
//! integration tests need the `mock-device` feature:
//!
//! ```bash
//! cargo run --features mock-device
//! ```

use super::transport::{DeviceTransport, TransportEvent, TRANSPORT_CHANNEL_CAPACITY};
use crate::acquisition::protocol::{encode_frequency, encode_voltage, encode_waveform, DeviceCommand};
use crate::acquisition::DEFAULT_CODE_MAX;
use crate::config::DeviceConfig;
use crate::error::{DeviceFaultKind, Result, ScopeError};
use crate::types::VoltageReading;
use crossbeam_channel::{bounded, select, tick, unbounded, Receiver, SendTimeoutError, Sender};
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Chunk sizes cycled through when splitting output
const CHUNK_PATTERN: &[usize] = &[7, 64, 13, 200, 1, 31];

/// Waveform shape produced by the mock device
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockSignal {
    Sine,
    Square,
    Triangle,
}

impl MockSignal {
    /// Unit-amplitude value at a phase in cycles
    fn value(&self, cycles: f64) -> f64 {
        let frac = cycles.rem_euclid(1.0);
        match self {
            MockSignal::Sine => (2.0 * PI * frac).sin(),
            MockSignal::Square => {
                if frac < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            MockSignal::Triangle => 1.0 - 4.0 * (frac - 0.5).abs(),
        }
    }
}

/// Configuration of the simulated device
#[derive(Debug, Clone, PartialEq)]
pub struct MockDeviceConfig {
    pub signal: MockSignal,
    /// Signal frequency in Hz
    pub signal_hz: f64,
    /// Simulated ADC sample rate
    pub sample_rate_hz: f64,
    /// Samples per `DATA:` line
    pub frame_len: usize,
    /// Time between frames while streaming
    pub frame_interval: Duration,
    /// Peak amplitude in ADC codes
    pub amplitude_codes: f64,
    /// Reference voltage reported in `VOLT:` lines
    pub vref: f64,
    /// Make `open` fail with this fault
    pub fail_open: Option<DeviceFaultKind>,
}

impl Default for MockDeviceConfig {
    fn default() -> Self {
        Self {
            signal: MockSignal::Sine,
            signal_hz: 50.0,
            sample_rate_hz: 10_000.0,
            frame_len: 512,
            frame_interval: Duration::from_millis(20),
            amplitude_codes: 400.0,
            vref: 5.0,
            fail_open: None,
        }
    }
}

impl MockDeviceConfig {
    fn code_at(&self, sample_index: u64) -> i32 {
        let mid = DEFAULT_CODE_MAX as f64 / 2.0;
        let cycles = sample_index as f64 * self.signal_hz / self.sample_rate_hz;
        let code = mid + self.amplitude_codes * self.signal.value(cycles);
        (code.round() as i32).clamp(0, DEFAULT_CODE_MAX)
    }

    fn voltage_reading(&self) -> VoltageReading {
        let volts_per_code = self.vref / DEFAULT_CODE_MAX as f64;
        let mid = DEFAULT_CODE_MAX as f64 / 2.0 * volts_per_code;
        let half = self.amplitude_codes * volts_per_code;
        VoltageReading::new([mid - half, mid + half, mid, 2.0 * half])
    }
}

/// Lets a test unplug the device while the transport is owned elsewhere
#[derive(Debug, Clone)]
pub struct MockDetachHandle {
    detached: Arc<AtomicBool>,
}

impl MockDetachHandle {
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }
}

/// Simulated device implementing [`DeviceTransport`]
pub struct MockDevice {
    config: MockDeviceConfig,
    commands: Option<Sender<DeviceCommand>>,
    worker: Option<JoinHandle<()>>,
    detached: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    sent: Arc<std::sync::Mutex<Vec<DeviceCommand>>>,
}

impl MockDevice {
    pub fn new(config: MockDeviceConfig) -> Self {
        Self {
            config,
            commands: None,
            worker: None,
            detached: Arc::new(AtomicBool::new(false)),
            stop: Arc::new(AtomicBool::new(false)),
            sent: Arc::default(),
        }
    }

    pub fn detach_handle(&self) -> MockDetachHandle {
        MockDetachHandle {
            detached: self.detached.clone(),
        }
    }

    /// Shared log of every command written to the device
    pub fn command_log(&self) -> Arc<std::sync::Mutex<Vec<DeviceCommand>>> {
        self.sent.clone()
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new(MockDeviceConfig::default())
    }
}

impl DeviceTransport for MockDevice {
    fn open(&mut self, _config: &DeviceConfig) -> Result<Receiver<TransportEvent>> {
        self.close();

        match self.config.fail_open {
            Some(DeviceFaultKind::PermissionDenied) => {
                return Err(ScopeError::PermissionDenied("mock device".to_string()))
            }
            Some(DeviceFaultKind::DeviceUnavailable) => {
                return Err(ScopeError::DeviceUnavailable("mock device".to_string()))
            }
            Some(_) => return Err(ScopeError::OpenFailed("mock device".to_string())),
            None => {}
        }

        self.detached.store(false, Ordering::SeqCst);
        self.stop = Arc::new(AtomicBool::new(false));
        let (event_tx, event_rx) = bounded(TRANSPORT_CHANNEL_CAPACITY);
        let (command_tx, command_rx) = unbounded();
        let config = self.config.clone();
        let link = Link {
            events: event_tx,
            stop: self.stop.clone(),
            detached: self.detached.clone(),
            chunk: 0,
        };

        let handle = std::thread::Builder::new()
            .name("mock-device".to_string())
            .spawn(move || run_device(config, command_rx, link))
            .map_err(|e| ScopeError::OpenFailed(format!("mock device thread: {}", e)))?;

        tracing::info!("Mock device opened");
        self.commands = Some(command_tx);
        self.worker = Some(handle);
        Ok(event_rx)
    }

    fn write(&mut self, command: DeviceCommand) -> Result<()> {
        let tx = self
            .commands
            .as_ref()
            .ok_or_else(|| ScopeError::Transport("mock device not open".to_string()))?;
        tx.send(command)
            .map_err(|_| ScopeError::Transport("mock device gone".to_string()))?;
        if let Ok(mut log) = self.sent.lock() {
            log.push(command);
        }
        Ok(())
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.commands = None;
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::warn!("Mock device thread panicked");
            }
        }
    }

    fn is_open(&self) -> bool {
        self.commands.is_some()
    }

    fn name(&self) -> String {
        "mock device".to_string()
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.close();
    }
}

/// Device side of the link; splits outgoing text into uneven chunks
struct Link {
    events: Sender<TransportEvent>,
    stop: Arc<AtomicBool>,
    detached: Arc<AtomicBool>,
    chunk: usize,
}

impl Link {
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Send a line; false once the host side is gone
    fn send_line(&mut self, text: &str) -> bool {
        let mut bytes = text.as_bytes();
        while !bytes.is_empty() {
            let size = CHUNK_PATTERN[self.chunk % CHUNK_PATTERN.len()].min(bytes.len());
            self.chunk += 1;
            let (head, rest) = bytes.split_at(size);
            if !self.send(TransportEvent::Data(head.to_vec())) {
                return false;
            }
            bytes = rest;
        }
        true
    }

    fn send(&self, mut event: TransportEvent) -> bool {
        loop {
            match self.events.send_timeout(event, Duration::from_millis(50)) {
                Ok(()) => return true,
                Err(SendTimeoutError::Disconnected(_)) => return false,
                Err(SendTimeoutError::Timeout(back)) => {
                    if self.stopped() {
                        return false;
                    }
                    event = back;
                }
            }
        }
    }
}

fn run_device(config: MockDeviceConfig, commands: Receiver<DeviceCommand>, mut link: Link) {
    let ticker = tick(config.frame_interval);
    let mut streaming = false;
    let mut sample_index: u64 = 0;

    while !link.stopped() {
        if link.detached.load(Ordering::SeqCst) {
            link.send(TransportEvent::Closed("device detached".to_string()));
            break;
        }

        let alive = select! {
            recv(commands) -> command => match command {
                Ok(DeviceCommand::Start) => { streaming = true; true }
                Ok(DeviceCommand::Pause) => { streaming = false; true }
                Ok(DeviceCommand::RequestFrequency) => {
                    link.send_line(&format!("{}\n", encode_frequency(config.signal_hz)))
                }
                Ok(DeviceCommand::RequestVoltage) => {
                    link.send_line(&format!("{}\n", encode_voltage(&config.voltage_reading())))
                }
                Err(_) => false,
            },
            recv(ticker) -> _ => {
                if streaming {
                    let codes: Vec<i32> = (0..config.frame_len as u64)
                        .map(|i| config.code_at(sample_index + i))
                        .collect();
                    sample_index += config.frame_len as u64;
                    link.send_line(&format!("{}\n", encode_waveform(&codes)))
                } else {
                    true
                }
            },
        };

        if !alive {
            break;
        }
    }
    tracing::debug!("Mock device stopped");
}
