//! Error handling for ScopeVis-RS
//!
//! This module defines the crate-wide error type and a Result alias.
//! Line-level decode failures have their own type in
//! [`crate::acquisition::protocol::DecodeError`] since they never leave the
//! acquisition pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for ScopeVis-RS operations
#[derive(Error, Debug)]
pub enum ScopeError {
    /// No matching acquisition device is attached
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The OS refused access to the device
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The device was found but could not be opened
    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    /// Read or write failure on an open link
    #[error("Transport error: {0}")]
    Transport(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// A runtime setting was rejected
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ScopeError>,
    },
}

impl ScopeError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ScopeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping context wrappers
    pub fn root(&self) -> &ScopeError {
        match self {
            ScopeError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Convert a transport-level error into a fault the UI can display
    pub fn to_device_fault(&self) -> DeviceFault {
        let kind = match self.root() {
            ScopeError::DeviceUnavailable(_) => DeviceFaultKind::DeviceUnavailable,
            ScopeError::PermissionDenied(_) => DeviceFaultKind::PermissionDenied,
            ScopeError::Transport(_) => DeviceFaultKind::Disconnected,
            _ => DeviceFaultKind::OpenFailed,
        };
        DeviceFault {
            kind,
            message: self.to_string(),
        }
    }
}

/// Result type alias for ScopeVis-RS operations
pub type Result<T> = std::result::Result<T, ScopeError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

/// Category of a device-side failure reported to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceFaultKind {
    /// No matching device found
    DeviceUnavailable,
    /// Access to the device was refused
    PermissionDenied,
    /// Opening the device failed
    OpenFailed,
    /// An open link went away (detach, read error)
    Disconnected,
}

impl std::fmt::Display for DeviceFaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceFaultKind::DeviceUnavailable => write!(f, "Device unavailable"),
            DeviceFaultKind::PermissionDenied => write!(f, "Permission denied"),
            DeviceFaultKind::OpenFailed => write!(f, "Open failed"),
            DeviceFaultKind::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// Cloneable description of a transport failure, carried across channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFault {
    pub kind: DeviceFaultKind,
    pub message: String,
}

impl DeviceFault {
    pub fn new(kind: DeviceFaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DeviceFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
