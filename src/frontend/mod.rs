//! Frontend module for egui UI
//!
//! This module provides the main UI components using eframe/egui.
//! It receives frames and status from the backend through crossbeam channels
//! and paints the scope display in real-time.
//!
//! # Layout
//!
//! - Toolbar (top): source, play/pause, trigger mode and slope, voltage scale
//! - Scope view (centre): grid, centre marker, waveform and annotations
//! - Status bar (bottom): connection, trigger phase, frame statistics, errors
//!
//! # Main Types
//!
//! - [`ScopeApp`] - Main application state implementing [`eframe::App`]
//! - [`ScopeState`] - Display-side mirror of the session, testable without egui
//! - [`AppAction`] - What the widgets ask the app to do
//!
//! # Submodules
//!
//! - [`scope_view`] - Paints [`crate::render`] output with an egui painter
//! - [`theme`] - Scope colours
//! - `toolbar` / `status_bar` - Top and bottom panels

pub mod scope_view;
pub mod state;
pub mod status_bar;
pub mod theme;
pub mod toolbar;

pub use scope_view::{paint_commands, show_scope, ScopeViewContext};
pub use state::{AppAction, ScopeState};
pub use status_bar::{render_status_bar, StatusBarContext};
pub use toolbar::{render_toolbar, ToolbarContext};

use crate::backend::FrontendReceiver;
use crate::config::{AppConfig, AppState};
use crate::types::InputSource;

/// Main application state for the scope
pub struct ScopeApp {
    // === Communication ===
    frontend: FrontendReceiver,

    // === Shared State ===
    config: AppConfig,
    app_state: AppState,
    state: ScopeState,
}

impl ScopeApp {
    /// Create a new application instance
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        frontend: FrontendReceiver,
        config: AppConfig,
        app_state: AppState,
    ) -> Self {
        if app_state.ui_preferences.dark_mode {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
        } else {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
        }

        let mut state = ScopeState::new(&config);
        if app_state.last_source == InputSource::Device {
            tracing::info!("Restoring device source from last session");
            state.apply_action(&AppAction::SelectSource(InputSource::Device));
            frontend.select_source(InputSource::Device);
        }

        Self {
            frontend,
            config,
            app_state,
            state,
        }
    }

    fn process_backend_messages(&mut self) -> bool {
        let mut changed = false;
        for msg in self.frontend.drain() {
            changed |= self.state.apply(msg);
        }
        changed
    }

    fn handle_action(&mut self, action: AppAction) {
        self.state.apply_action(&action);
        match action {
            AppAction::SelectSource(source) => self.frontend.select_source(source),
            AppAction::ToggleStreaming => self.frontend.set_streaming(self.state.settings.streaming),
            AppAction::SetTriggerMode(mode) => self.frontend.set_trigger_mode(mode),
            AppAction::ToggleSlope => self
                .frontend
                .set_trigger_slope(self.state.settings.trigger.slope),
            AppAction::RearmTrigger => self.frontend.rearm_trigger(),
            AppAction::SetVoltageScale(scale) => self.frontend.set_voltage_scale(scale),
        }
    }

    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) -> Vec<AppAction> {
        // Ignore shortcuts while a widget has keyboard focus
        if ctx.memory(|m| m.focused().is_some()) {
            return Vec::new();
        }

        ctx.input(|i| {
            let mut actions = Vec::new();
            if i.key_pressed(egui::Key::Space) {
                actions.push(AppAction::ToggleStreaming);
            }
            if i.key_pressed(egui::Key::R) {
                actions.push(AppAction::RearmTrigger);
            }
            if i.key_pressed(egui::Key::E) {
                actions.push(AppAction::ToggleSlope);
            }
            actions
        })
    }
}

impl eframe::App for ScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let had_messages = self.process_backend_messages();
        let mut actions = self.handle_keyboard_shortcuts(ctx);

        if self.state.settings.streaming || had_messages {
            ctx.request_repaint();
        }

        // Toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            let toolbar_ctx = ToolbarContext {
                settings: &self.state.settings,
            };
            actions.extend(render_toolbar(ui, &toolbar_ctx));
        });

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            let status_ctx = StatusBarContext {
                settings: &self.state.settings,
                stats: &self.state.stats,
                captured_at: self.state.captured_at,
                last_error: self.state.last_error.as_deref(),
            };
            render_status_bar(ui, &status_ctx);
        });

        // Scope view
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let view_ctx = ScopeViewContext {
                    frame: self.state.last_frame.as_ref(),
                    voltage_scale: self.state.settings.voltage_scale,
                    grid_divisions: self.state.settings.grid_divisions,
                    sample_rate_hz: self.config.acquisition.sample_rate_hz,
                    center_marker: self.app_state.ui_preferences.show_center_marker,
                };
                show_scope(ui, &view_ctx);
            });

        for action in actions {
            self.handle_action(action);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.frontend.shutdown();

        let settings = &self.state.settings;
        self.app_state.last_source = settings.source;
        self.app_state.last_trigger_mode = settings.trigger.mode;
        self.app_state.last_voltage_scale = Some(settings.voltage_scale);

        if let Err(e) = self.app_state.save() {
            tracing::warn!("Failed to save app state: {}", e);
        }
    }
}
