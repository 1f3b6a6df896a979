//! DeviceTransport trait for the acquisition device link
//!
//! This module provides a common trait for all device links, enabling both
//! real serial ports and simulated devices for testing. The transport owns
//! the blocking side of the link (usually a reader thread); the scheduling
//! thread only sees [`TransportEvent`]s arriving on a channel and issues
//! fire-and-forget writes.

use crate::acquisition::protocol::DeviceCommand;
use crate::config::DeviceConfig;
use crate::error::Result;
use crossbeam_channel::Receiver;

/// Capacity of the channel between a reader thread and the scheduler
pub const TRANSPORT_CHANNEL_CAPACITY: usize = 256;

/// Something that happened on an open link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Raw bytes, in arrival order, with arbitrary chunk boundaries
    Data(Vec<u8>),
    /// The link went away (detach, read error or EOF)
    Closed(String),
}

/// Unified interface for device links
///
/// Implementations must be `Send` so the scheduling thread can own them.
///
/// # Example
///
/// ```ignore
/// fn start(transport: &mut dyn DeviceTransport, config: &DeviceConfig) -> Result<()> {
///     let events = transport.open(config)?;
///     transport.write(DeviceCommand::Start)?;
///     for event in events.try_iter() { /* ... */ }
///     Ok(())
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait DeviceTransport: Send {
    /// Open the link and start delivering events on the returned channel.
    ///
    /// Opening an already open transport closes the old link first.
    fn open(&mut self, config: &DeviceConfig) -> Result<Receiver<TransportEvent>>;

    /// Send a command; no acknowledgement is awaited
    fn write(&mut self, command: DeviceCommand) -> Result<()>;

    /// Close the link; no events are delivered afterwards
    fn close(&mut self);

    /// Check whether the link is open
    fn is_open(&self) -> bool;

    /// Human-readable description of the link (port name)
    fn name(&self) -> String;
}

/// Transport used when no device support is wanted; every open fails
#[derive(Debug, Default)]
pub struct NoDevice;

impl DeviceTransport for NoDevice {
    fn open(&mut self, _config: &DeviceConfig) -> Result<Receiver<TransportEvent>> {
        Err(crate::error::ScopeError::DeviceUnavailable(
            "no device transport configured".to_string(),
        ))
    }

    fn write(&mut self, command: DeviceCommand) -> Result<()> {
        Err(crate::error::ScopeError::Transport(format!(
            "cannot send {}: no device",
            command
        )))
    }

    fn close(&mut self) {}

    fn is_open(&self) -> bool {
        false
    }

    fn name(&self) -> String {
        "none".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScopeError;

    #[test]
    fn test_no_device_refuses_to_open() {
        let mut transport = NoDevice;
        assert!(matches!(
            transport.open(&DeviceConfig::default()),
            Err(ScopeError::DeviceUnavailable(_))
        ));
        assert!(!transport.is_open());
        assert!(transport.write(DeviceCommand::Start).is_err());
    }
}
