//! # ScopeVis-RS: Serial Oscilloscope Front-End
//!
//! A real-time oscilloscope display for a microcontroller that streams ADC
//! frames over a USB serial link, with a built-in demo signal for use without
//! hardware. Acquisition runs in a backend thread; the UI only paints.
//!
//! ## Architecture
//!
//! - **Acquisition**: Line framing, wire protocol decoding, code-to-volt scaling,
//!   demo signal generation ([`acquisition`])
//! - **Pipeline**: Trigger engine, measurement scheduling and the single-owner
//!   scope session ([`pipeline`])
//! - **Backend**: Serial/mock device transports and the scheduling worker thread ([`backend`])
//! - **Render**: Pure mapping from a frame to draw commands ([`render`])
//! - **Frontend**: eframe/egui application painting the draw commands ([`frontend`])
//! - **Communication**: Crossbeam channels for thread-safe data transfer
//!
//! ## Configuration
//!
//! Configuration and application state are stored in the platform-appropriate
//! data directory under `dev.scopevis.scopevis-rs`:
//!
//! - **Linux**: `~/.local/share/dev.scopevis.scopevis-rs/`
//! - **macOS**: `~/Library/Application Support/dev.scopevis.scopevis-rs/`
//! - **Windows**: `%APPDATA%\dev.scopevis.scopevis-rs\`
//!
//! A config file can also be named with the `SCOPEVIS_CONFIG` environment variable.
//!
//! ## Example
//!
//! ```ignore
//! use scopevis_rs::{backend::ScopeBackend, config::{AppConfig, AppState}, ScopeApp};
//!
//! fn main() -> eframe::Result<()> {
//!     let app_state = AppState::load_or_default();
//!     let mut config = AppConfig::resolve();
//!     app_state.apply_to(&mut config);
//!
//!     let (backend, frontend_receiver) = ScopeBackend::new(config.clone());
//!     std::thread::spawn(move || backend.run());
//!
//!     eframe::run_native(
//!         "ScopeVis-RS",
//!         eframe::NativeOptions::default(),
//!         Box::new(|cc| Ok(Box::new(ScopeApp::new(cc, frontend_receiver, config, app_state)))),
//!     )
//! }
//! ```

pub mod acquisition;
pub mod analysis;
pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod frontend;
pub mod pipeline;
pub mod render;
pub mod types;

// Re-export commonly used types
pub use app::ScopeApp;
pub use backend::{BackendCommand, BackendMessage, FrontendReceiver, ScopeBackend};
pub use config::{AppConfig, AppState};
pub use error::{Result, ScopeError};
pub use pipeline::{ScopeEvent, ScopeObserver, ScopeSession};
pub use render::{render, DrawCommand, RenderConfig};
pub use types::{InputSource, TriggerMode, TriggerSlope, WaveformFrame};
