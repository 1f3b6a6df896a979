//! Mock construction helpers

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use scopevis_rs::acquisition::DeviceCommand;
use scopevis_rs::backend::{DeviceTransport, TransportEvent};
use scopevis_rs::config::DeviceConfig;
use scopevis_rs::error::{Result, ScopeError};
use std::sync::{Arc, Mutex};

/// Create test channels with default size
pub fn create_test_channels<T, U>() -> (Sender<T>, Receiver<T>, Sender<U>, Receiver<U>) {
    let (tx1, rx1) = bounded(16);
    let (tx2, rx2) = bounded(16);
    (tx1, rx1, tx2, rx2)
}

/// Test-side handle of a [`ScriptedTransport`]
#[derive(Clone, Default)]
pub struct ScriptedLink {
    events: Arc<Mutex<Option<Sender<TransportEvent>>>>,
    written: Arc<Mutex<Vec<DeviceCommand>>>,
    opens: Arc<Mutex<u32>>,
}

impl ScriptedLink {
    /// Deliver bytes as the device would; false when the link is not open
    pub fn push(&self, bytes: &[u8]) -> bool {
        self.send(TransportEvent::Data(bytes.to_vec()))
    }

    /// Simulate unplugging the device
    pub fn detach(&self, reason: &str) -> bool {
        self.send(TransportEvent::Closed(reason.to_string()))
    }

    fn send(&self, event: TransportEvent) -> bool {
        let guard = self.events.lock().unwrap();
        guard.as_ref().map(|tx| tx.send(event).is_ok()).unwrap_or(false)
    }

    pub fn written(&self) -> Vec<DeviceCommand> {
        self.written.lock().unwrap().clone()
    }

    pub fn clear_written(&self) {
        self.written.lock().unwrap().clear();
    }

    pub fn opens(&self) -> u32 {
        *self.opens.lock().unwrap()
    }
}

/// Transport whose traffic is scripted by the test through a [`ScriptedLink`]
pub struct ScriptedTransport {
    link: ScriptedLink,
    fail_open: Option<fn() -> ScopeError>,
    open: bool,
}

impl ScriptedTransport {
    pub fn new() -> (Self, ScriptedLink) {
        let link = ScriptedLink::default();
        (
            Self {
                link: link.clone(),
                fail_open: None,
                open: false,
            },
            link,
        )
    }

    /// A transport whose every open fails with the given error
    pub fn failing(make_error: fn() -> ScopeError) -> (Self, ScriptedLink) {
        let (mut transport, link) = Self::new();
        transport.fail_open = Some(make_error);
        (transport, link)
    }
}

impl DeviceTransport for ScriptedTransport {
    fn open(&mut self, _config: &DeviceConfig) -> Result<Receiver<TransportEvent>> {
        *self.link.opens.lock().unwrap() += 1;
        if let Some(make_error) = self.fail_open {
            return Err(make_error());
        }
        let (tx, rx) = unbounded();
        *self.link.events.lock().unwrap() = Some(tx);
        self.open = true;
        Ok(rx)
    }

    fn write(&mut self, command: DeviceCommand) -> Result<()> {
        if !self.open {
            return Err(ScopeError::Transport("scripted link closed".to_string()));
        }
        self.link.written.lock().unwrap().push(command);
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        *self.link.events.lock().unwrap() = None;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}
