//! Status bar panel: bottom bar showing connection, stats, and error info.
//!
//! Sits below the scope view.

use chrono::{DateTime, Local};
use egui::{Color32, RichText, Ui};

use crate::config::settings::RuntimeSettings;
use crate::frontend::toolbar::connection_indicator;
use crate::types::{InputSource, PipelineStats};

/// Context needed to render the status bar.
pub struct StatusBarContext<'a> {
    pub settings: &'a RuntimeSettings,
    pub stats: &'a PipelineStats,
    pub captured_at: Option<DateTime<Local>>,
    pub last_error: Option<&'a str>,
}

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, ctx: &StatusBarContext<'_>) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        // === Source and connection ===
        match ctx.settings.source {
            InputSource::Demo => {
                ui.colored_label(Color32::from_rgb(100, 180, 255), "●");
                ui.label(RichText::new("Demo").small());
            }
            InputSource::Device => {
                let (color, text) = connection_indicator(ctx.settings.connection);
                ui.colored_label(color, "●");
                ui.label(RichText::new(text).small());
            }
        }

        ui.separator();

        // === Trigger ===
        ui.label(RichText::new(trigger_summary(ctx.settings)).small());

        ui.separator();

        // === Frames ===
        ui.label(RichText::new(frame_summary(ctx.stats)).small());

        ui.separator();

        // === Data transferred ===
        ui.label(RichText::new(format_bytes(ctx.stats.bytes_received)).small());

        // === Errors ===
        let errors = ctx.stats.decode_errors + ctx.stats.overflows;
        if errors > 0 {
            ui.separator();
            ui.colored_label(
                Color32::LIGHT_RED,
                RichText::new(format!(
                    "Errors: {} decode, {} overflow",
                    ctx.stats.decode_errors, ctx.stats.overflows
                ))
                .small(),
            );
        }

        if let Some(at) = ctx.captured_at {
            ui.separator();
            ui.label(RichText::new(format!("Last frame {}", at.format("%H:%M:%S%.3f"))).small());
        }

        // === Error message (right-aligned) ===
        if let Some(error) = ctx.last_error {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.colored_label(Color32::RED, RichText::new(error).small());
            });
        }
    });
}

pub fn trigger_summary(settings: &RuntimeSettings) -> String {
    format!(
        "{} {} @ {:.2} V ({})",
        settings.trigger.mode.short_name(),
        settings.trigger.slope,
        settings.trigger_threshold(),
        settings.trigger.phase
    )
}

pub fn frame_summary(stats: &PipelineStats) -> String {
    let mut text = format!(
        "Frames: {}/{} ({:.0}%)",
        stats.frames_displayed,
        stats.frames_received,
        stats.display_ratio()
    );
    if stats.dropped_messages > 0 {
        text.push_str(&format!(", {} dropped", stats.dropped_messages));
    }
    text
}

pub fn format_bytes(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    if kb > 1024.0 {
        format!("Data: {:.2} MB", kb / 1024.0)
    } else {
        format!("Data: {:.2} KB", kb)
    }
}
