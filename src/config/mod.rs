//! Configuration module for ScopeVis-RS
//!
//! This module handles application configuration including:
//! - Acquisition, demo, trigger, measurement, device and display settings ([`AppConfig`])
//! - Application state persistence between runs ([`AppState`])
//! - Runtime settings during execution ([`settings`])
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.scopevis.scopevis-rs/`
//! - **macOS**: `~/Library/Application Support/dev.scopevis.scopevis-rs/`
//! - **Windows**: `%APPDATA%\dev.scopevis.scopevis-rs\`
//!
//! # Files
//!
//! - `app_state.json` - UI preferences and last used source/trigger
//! - `config.json` - Optional [`AppConfig`]; a `.toml` file can be supplied
//!   through the `SCOPEVIS_CONFIG` environment variable instead
//! - `logs/` - Rolling log files
//!
//! # Example
//!
//! ```ignore
//! use scopevis_rs::config::{AppConfig, AppState};
//!
//! let config = AppConfig::resolve();
//! let mut state = AppState::load_or_default();
//! state.last_voltage_scale = Some(config.display.voltage_scale);
//! state.save()?;
//! ```

pub mod settings;

pub use settings::*;

use crate::acquisition::framer::DEFAULT_CARRY_CAPACITY;
use crate::acquisition::scaler::DEFAULT_CODE_MAX;
use crate::error::{Result, ResultExt, ScopeError};
use crate::types::{InputSource, TriggerMode, TriggerSlope, DEFAULT_FRAME_LEN, DEFAULT_VREF};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.scopevis.scopevis-rs";

/// App state filename
pub const APP_STATE_FILE: &str = "app_state.json";

/// Default config filename inside the app data directory
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SCOPEVIS_CONFIG";

/// Log directory name inside the app data directory
pub const LOG_DIR: &str = "logs";

/// Default serial baud rate of the acquisition firmware
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default demo tick interval (20 Hz refresh)
pub const DEFAULT_TICK_MS: u64 = 50;

/// Default sample rate used for annotations and local measurements
pub const DEFAULT_SAMPLE_RATE_HZ: f32 = 10_000.0;

/// USB vendor ids of common Arduino-compatible serial bridges
pub const DEFAULT_VENDOR_IDS: &[u16] = &[
    0x2341, // Arduino
    0x1A86, // QinHeng CH340
    0x0403, // FTDI
    0x10C4, // Silicon Labs CP210x
];

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        ScopeError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            ScopeError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the app state file
pub fn app_state_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(APP_STATE_FILE))
}

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== App State ====================

/// Persistent application state
///
/// Preferences restored on the next start, separate from [`AppConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    /// Version for future migration support
    #[serde(default = "default_app_state_version")]
    pub version: u32,

    /// Source active when the app was closed
    #[serde(default)]
    pub last_source: InputSource,

    /// Trigger mode active when the app was closed
    #[serde(default)]
    pub last_trigger_mode: TriggerMode,

    /// Voltage scale active when the app was closed
    #[serde(default)]
    pub last_voltage_scale: Option<f32>,

    /// UI preferences that persist across sessions
    #[serde(default)]
    pub ui_preferences: UiPreferences,
}

fn default_app_state_version() -> u32 {
    1
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: 1,
            last_source: InputSource::Demo,
            last_trigger_mode: TriggerMode::Auto,
            last_voltage_scale: None,
            ui_preferences: UiPreferences::default(),
        }
    }
}

impl AppState {
    /// Load app state from the default location
    pub fn load() -> Result<Self> {
        let path = app_state_path().ok_or_else(|| {
            ScopeError::Config("Could not determine app state path".to_string())
        })?;
        Self::load_from(&path)
    }

    /// Load app state from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ScopeError::Config(format!("Failed to read app state: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| ScopeError::Config(format!("Failed to parse app state: {}", e)))
    }

    /// Load app state, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load app state, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save app state to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(&dir.join(APP_STATE_FILE))
    }

    /// Save app state to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ScopeError::Config(format!("Failed to serialize app state: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ScopeError::Config(format!("Failed to write app state: {}", e)))
    }

    /// Apply remembered choices on top of a loaded config
    pub fn apply_to(&self, config: &mut AppConfig) {
        config.trigger.mode = self.last_trigger_mode;
        if let Some(scale) = self.last_voltage_scale.filter(|s| *s > 0.0) {
            config.display.voltage_scale = scale;
        }
    }
}

/// UI preferences that persist across sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiPreferences {
    /// Enable dark mode
    #[serde(default = "default_true")]
    pub dark_mode: bool,

    /// Show the centre cross marker on the scope display
    #[serde(default = "default_true")]
    pub show_center_marker: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            show_center_marker: true,
        }
    }
}

// ==================== App Config ====================

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    /// Frame and line-framing parameters
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Synthetic signal parameters
    #[serde(default)]
    pub demo: DemoConfig,

    /// Initial trigger discipline
    #[serde(default)]
    pub trigger: TriggerConfig,

    /// Measurement request throttling
    #[serde(default)]
    pub measurement: MeasurementConfig,

    /// Serial device settings
    #[serde(default)]
    pub device: DeviceConfig,

    /// Scope display settings
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config file; `.toml` files are parsed as TOML, anything else as JSON
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(ScopeError::from)
            .with_context(|| format!("reading config file {:?}", path))?;

        let config: AppConfig = if is_toml(path) {
            toml::from_str(&content).map_err(|e| {
                ScopeError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                ScopeError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Load a config file, returning defaults if any error occurs
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Config from `$SCOPEVIS_CONFIG`, else the app data dir, else defaults
    pub fn resolve() -> Self {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            tracing::info!("Loading config from ${}: {:?}", CONFIG_ENV_VAR, path);
            return Self::load_or_default(PathBuf::from(path));
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load_or_default(path),
            _ => Self::default(),
        }
    }

    /// Save the config; the format follows the file extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ScopeError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = if is_toml(path) {
            toml::to_string_pretty(self)
                .map_err(|e| ScopeError::Config(format!("Failed to serialize config: {}", e)))?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|e| ScopeError::Config(format!("Failed to serialize config: {}", e)))?
        };

        std::fs::write(path, content)
            .map_err(ScopeError::from)
            .with_context(|| format!("writing config file {:?}", path))
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        let checks: [(bool, &str); 9] = [
            (self.acquisition.frame_len > 0, "acquisition.frame_len must be > 0"),
            (self.acquisition.vref > 0.0, "acquisition.vref must be > 0"),
            (self.acquisition.code_max > 0, "acquisition.code_max must be > 0"),
            (self.acquisition.carry_capacity > 0, "acquisition.carry_capacity must be > 0"),
            (self.demo.period > 0, "demo.period must be > 0"),
            (self.demo.tick_ms > 0, "demo.tick_ms must be > 0"),
            (self.measurement.request_every > 0, "measurement.request_every must be > 0"),
            (self.display.voltage_scale > 0.0, "display.voltage_scale must be > 0"),
            (self.display.grid_divisions > 0, "display.grid_divisions must be > 0"),
        ];

        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, message)) => Err(ScopeError::Config(message.to_string())),
            None => Ok(()),
        }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false)
}

// ==================== Acquisition Config ====================

/// Frame geometry and line-framing limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Samples per frame
    pub frame_len: usize,
    /// ADC reference voltage
    pub vref: f32,
    /// ADC full-scale code
    pub code_max: i32,
    /// Carry buffer capacity in bytes
    pub carry_capacity: usize,
    /// Nominal sample rate of the device, for annotations and local measurements
    pub sample_rate_hz: f32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            frame_len: DEFAULT_FRAME_LEN,
            vref: DEFAULT_VREF,
            code_max: DEFAULT_CODE_MAX,
            carry_capacity: DEFAULT_CARRY_CAPACITY,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
        }
    }
}

// ==================== Demo Config ====================

/// Synthetic sine parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Tick interval in milliseconds
    pub tick_ms: u64,
    /// Peak amplitude in volts
    pub amplitude: f32,
    /// DC offset in volts
    pub offset: f32,
    /// Samples per sine cycle; the phase wraps at this value
    pub period: u32,
    /// Phase advance per tick, in samples
    pub step: u32,
    /// Phase of the first frame
    pub initial_phase: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            amplitude: 2.0,
            offset: 2.5,
            period: 512,
            step: 5,
            initial_phase: 0,
        }
    }
}

impl DemoConfig {
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_ms.max(1))
    }
}

// ==================== Trigger Config ====================

/// Initial trigger discipline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TriggerConfig {
    pub mode: TriggerMode,
    pub slope: TriggerSlope,
    /// Trigger level in volts; `None` tracks the midpoint of the voltage scale
    pub level: Option<f32>,
}

impl TriggerConfig {
    /// Effective threshold for a given voltage scale
    pub fn threshold(&self, voltage_scale: f32) -> f32 {
        self.level.unwrap_or(voltage_scale / 2.0)
    }
}

// ==================== Measurement Config ====================

/// Measurement request throttling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeasurementConfig {
    /// Accepted frames between measurement requests
    pub request_every: u32,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self { request_every: 5 }
    }
}

// ==================== Device Config ====================

/// Serial device settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceConfig {
    /// Explicit port path; discovery by vendor id when `None`
    pub port: Option<String>,
    /// Baud rate (8 data bits, 1 stop bit, no parity, no flow control)
    pub baud_rate: u32,
    /// USB vendor ids accepted during discovery
    pub vendor_ids: Vec<u16>,
    /// Read timeout of the reader thread in milliseconds
    pub read_timeout_ms: u64,
    /// Read buffer size in bytes
    pub read_chunk: usize,
    /// Use the simulated device instead of a serial port
    pub use_mock: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            vendor_ids: DEFAULT_VENDOR_IDS.to_vec(),
            read_timeout_ms: 20,
            read_chunk: 512,
            use_mock: false,
        }
    }
}

// ==================== Display Config ====================

/// Scope display settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Volts spanning the full vertical extent
    pub voltage_scale: f32,
    /// Major grid divisions per axis
    pub grid_divisions: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            voltage_scale: 5.0,
            grid_divisions: 10,
        }
    }
}

// ==================== Tests ====================
