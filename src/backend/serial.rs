//! Serial port transport for the acquisition microcontroller
//!
//! The port is opened 8-N-1 without flow control. A cloned handle is moved
//! into a reader thread which only forwards raw byte chunks; all parsing
//! happens on the scheduling thread.

use super::transport::{DeviceTransport, TransportEvent, TRANSPORT_CHANNEL_CAPACITY};
use crate::acquisition::protocol::DeviceCommand;
use crate::config::DeviceConfig;
use crate::error::{Result, ScopeError};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortInfo, SerialPortType, StopBits};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Pick the first USB serial port whose vendor id is accepted
pub fn select_port(ports: &[SerialPortInfo], vendor_ids: &[u16]) -> Option<String> {
    ports.iter().find_map(|port| match &port.port_type {
        SerialPortType::UsbPort(usb) if vendor_ids.contains(&usb.vid) => {
            Some(port.port_name.clone())
        }
        _ => None,
    })
}

/// Find an attached acquisition device by USB vendor id
pub fn discover_port(vendor_ids: &[u16]) -> Result<String> {
    let ports = serialport::available_ports().map_err(|e| {
        ScopeError::DeviceUnavailable(format!("cannot enumerate serial ports: {}", e))
    })?;
    tracing::debug!("Found {} serial ports", ports.len());

    select_port(&ports, vendor_ids).ok_or_else(|| {
        ScopeError::DeviceUnavailable("no USB serial device with a known vendor id".to_string())
    })
}

/// Classify an open failure
pub fn map_open_error(path: &str, error: serialport::Error) -> ScopeError {
    match error.kind() {
        serialport::ErrorKind::NoDevice | serialport::ErrorKind::Io(io::ErrorKind::NotFound) => {
            ScopeError::DeviceUnavailable(format!("{}: {}", path, error))
        }
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            ScopeError::PermissionDenied(format!("{}: {}", path, error))
        }
        _ => ScopeError::OpenFailed(format!("{}: {}", path, error)),
    }
}

/// Serial link with a background reader thread
#[derive(Default)]
pub struct SerialTransport {
    writer: Option<Box<dyn SerialPort>>,
    reader: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    port_name: Option<String>,
}

impl SerialTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceTransport for SerialTransport {
    fn open(&mut self, config: &DeviceConfig) -> Result<Receiver<TransportEvent>> {
        self.close();

        let path = match &config.port {
            Some(path) => path.clone(),
            None => discover_port(&config.vendor_ids)?,
        };
        tracing::info!("Opening {} at {} baud", path, config.baud_rate);

        let port = serialport::new(&path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(config.read_timeout_ms.max(1)))
            .open()
            .map_err(|e| map_open_error(&path, e))?;

        let reader_port = port
            .try_clone()
            .map_err(|e| ScopeError::OpenFailed(format!("{}: {}", path, e)))?;

        let (tx, rx) = bounded(TRANSPORT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let handle = spawn_reader(reader_port, tx, stop.clone(), config.read_chunk)
            .map_err(|e| ScopeError::OpenFailed(format!("{}: reader thread: {}", path, e)))?;

        self.writer = Some(port);
        self.reader = Some(handle);
        self.stop = stop;
        self.port_name = Some(path);
        Ok(rx)
    }

    fn write(&mut self, command: DeviceCommand) -> Result<()> {
        let port = self
            .writer
            .as_mut()
            .ok_or_else(|| ScopeError::Transport("port not open".to_string()))?;
        port.write_all(command.as_bytes())
            .and_then(|_| port.flush())
            .map_err(|e| ScopeError::Transport(format!("write {}: {}", command, e)))
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.writer = None;
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                tracing::warn!("Serial reader thread panicked");
            }
        }
        if let Some(name) = self.port_name.take() {
            tracing::debug!("Closed {}", name);
        }
    }

    fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn name(&self) -> String {
        self.port_name
            .clone()
            .unwrap_or_else(|| "serial (closed)".to_string())
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn spawn_reader(
    mut port: Box<dyn SerialPort>,
    tx: Sender<TransportEvent>,
    stop: Arc<AtomicBool>,
    chunk: usize,
) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("serial-reader".to_string())
        .spawn(move || {
            let mut buf = vec![0u8; chunk.max(1)];
            while !stop.load(Ordering::SeqCst) {
                match port.read(&mut buf) {
                    Ok(0) => {
                        forward(&tx, &stop, TransportEvent::Closed("end of stream".to_string()));
                        break;
                    }
                    Ok(n) => {
                        if !forward(&tx, &stop, TransportEvent::Data(buf[..n].to_vec())) {
                            break;
                        }
                    }
                    Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {}
                    Err(e) => {
                        if !stop.load(Ordering::SeqCst) {
                            forward(&tx, &stop, TransportEvent::Closed(format!("read failed: {}", e)));
                        }
                        break;
                    }
                }
            }
            tracing::debug!("Serial reader stopped");
        })
}

/// Hand an event to the scheduler; false once the link is closed
fn forward(tx: &Sender<TransportEvent>, stop: &AtomicBool, mut event: TransportEvent) -> bool {
    loop {
        match tx.send_timeout(event, Duration::from_millis(50)) {
            Ok(()) => return true,
            Err(SendTimeoutError::Disconnected(_)) => return false,
            Err(SendTimeoutError::Timeout(back)) => {
                if stop.load(Ordering::SeqCst) {
                    return false;
                }
                event = back;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    fn usb(name: &str, vid: u16) -> SerialPortInfo {
        SerialPortInfo {
            port_name: name.to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid,
                pid: 0x0043,
                serial_number: None,
                manufacturer: None,
                product: None,
            }),
        }
    }

    #[test]
    fn test_select_port_by_vendor() {
        let ports = vec![
            SerialPortInfo {
                port_name: "/dev/ttyS0".to_string(),
                port_type: SerialPortType::Unknown,
            },
            usb("/dev/ttyUSB0", 0x1234),
            usb("/dev/ttyACM0", 0x2341),
            usb("/dev/ttyUSB1", 0x1A86),
        ];
        let vids = DeviceConfig::default().vendor_ids;
        assert_eq!(select_port(&ports, &vids), Some("/dev/ttyACM0".to_string()));
        assert_eq!(select_port(&ports[..2], &vids), None);
    }

    #[test]
    fn test_open_error_classification() {
        let err = map_open_error(
            "/dev/ttyACM0",
            serialport::Error::new(
                serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied),
                "access denied",
            ),
        );
        assert!(matches!(err, ScopeError::PermissionDenied(_)));

        let err = map_open_error(
            "/dev/ttyACM0",
            serialport::Error::new(serialport::ErrorKind::NoDevice, "gone"),
        );
        assert!(matches!(err, ScopeError::DeviceUnavailable(_)));

        let err = map_open_error(
            "/dev/ttyACM0",
            serialport::Error::new(serialport::ErrorKind::InvalidInput, "bad baud"),
        );
        assert!(matches!(err, ScopeError::OpenFailed(_)));
    }

    #[test]
    fn test_missing_port_fails_cleanly() {
        let mut transport = SerialTransport::new();
        let config = DeviceConfig {
            port: Some("/dev/scopevis-does-not-exist".to_string()),
            ..Default::default()
        };
        assert!(transport.open(&config).is_err());
        assert!(!transport.is_open());
        assert!(transport.write(DeviceCommand::Start).is_err());
    }
}
