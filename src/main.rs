//! ScopeVis-RS - Main Entry Point
//!
//! Serial oscilloscope display: a backend thread acquires frames from the
//! demo generator or a USB serial device, the egui frontend paints them.

use anyhow::Context;
use scopevis_rs::{
    backend::ScopeBackend,
    config::{self, AppConfig, AppState},
    ScopeApp,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "info,scopevis_rs=debug";
const LOG_FILE: &str = "scopevis.log";

/// Console logging always, file logging when the data dir is writable
fn init_logging() -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let file = config::ensure_app_data_dir()
        .ok()
        .map(|dir| dir.join(config::LOG_DIR))
        .map(|dir| tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE)));

    let (file_layer, guard) = match file {
        Some((writer, guard)) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            ),
            Some(guard),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

fn main() -> anyhow::Result<()> {
    let _log_guard = init_logging();

    tracing::info!("Starting ScopeVis-RS");

    // Restore preferences from the last run on top of the config file
    let app_state = AppState::load_or_default();
    let mut config = AppConfig::resolve();
    app_state.apply_to(&mut config);

    // Spawn the acquisition backend
    let (backend, frontend) = ScopeBackend::new(config.clone());
    let stop = backend.stop_handle();
    let backend_handle = std::thread::Builder::new()
        .name("scope-backend".to_string())
        .spawn(move || backend.run())
        .context("Failed to spawn backend thread")?;

    // Configure eframe options
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 680.0])
            .with_min_inner_size([640.0, 420.0])
            .with_title("ScopeVis-RS"),
        ..Default::default()
    };

    // Run the eframe application
    let result = eframe::run_native(
        "ScopeVis-RS",
        native_options,
        Box::new(|cc| Ok(Box::new(ScopeApp::new(cc, frontend, config, app_state)))),
    );

    // Signal backend to stop and wait for it
    tracing::info!("Shutting down...");
    stop.store(false, std::sync::atomic::Ordering::SeqCst);
    if backend_handle.join().is_err() {
        tracing::error!("Backend thread panicked");
    }

    result.map_err(|e| anyhow::anyhow!("UI error: {}", e))
}
