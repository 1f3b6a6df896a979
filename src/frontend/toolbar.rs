//! Toolbar panel: horizontal bar with source, acquisition and trigger controls.
//!
//! Sits above the scope view.

use egui::{Color32, RichText, Ui};

use crate::config::settings::{RuntimeSettings, VOLTAGE_SCALE_PRESETS};
use crate::frontend::state::AppAction;
use crate::types::{ConnectionStatus, InputSource, TriggerMode, TriggerSlope};

/// Context needed to render the toolbar.
pub struct ToolbarContext<'a> {
    pub settings: &'a RuntimeSettings,
}

/// Render the main application toolbar.
///
/// Returns actions to be applied by the app.
pub fn render_toolbar(ui: &mut Ui, ctx: &ToolbarContext<'_>) -> Vec<AppAction> {
    let mut actions = Vec::new();

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 4.0;

        // === Source group ===
        render_source_group(ui, ctx, &mut actions);

        ui.separator();

        // === Acquisition group ===
        render_acquisition_group(ui, ctx, &mut actions);

        ui.separator();

        // === Trigger group ===
        render_trigger_group(ui, ctx, &mut actions);

        ui.separator();

        // === Scale group ===
        render_scale_group(ui, ctx, &mut actions);

        // === Right-aligned readout ===
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            render_readout_group(ui, ctx);
        });
    });

    actions
}

fn render_source_group(ui: &mut Ui, ctx: &ToolbarContext<'_>, actions: &mut Vec<AppAction>) {
    let settings = ctx.settings;
    ui.label("Source:");
    for source in [InputSource::Demo, InputSource::Device] {
        let selected = settings.source == source;
        if ui.selectable_label(selected, source.to_string()).clicked() {
            // Clicking a lost device again is the reconnect
            if !selected || settings.connection == ConnectionStatus::Disconnected {
                actions.push(AppAction::SelectSource(source));
            }
        }
    }

    if settings.source == InputSource::Device {
        let (color, text) = connection_indicator(settings.connection);
        ui.colored_label(color, "●").on_hover_text(text);
    }
}

fn render_acquisition_group(ui: &mut Ui, ctx: &ToolbarContext<'_>, actions: &mut Vec<AppAction>) {
    let (label, hover) = if ctx.settings.streaming {
        ("⏸ Pause", "Pause acquisition")
    } else {
        ("▶ Play", "Resume acquisition")
    };
    if ui.button(label).on_hover_text(hover).clicked() {
        actions.push(AppAction::ToggleStreaming);
    }
}

fn render_trigger_group(ui: &mut Ui, ctx: &ToolbarContext<'_>, actions: &mut Vec<AppAction>) {
    let trigger = &ctx.settings.trigger;
    ui.label("Trigger:");
    for &mode in TriggerMode::all() {
        if ui
            .selectable_label(trigger.mode == mode, mode.short_name())
            .on_hover_text(mode.to_string())
            .clicked()
            && trigger.mode != mode
        {
            actions.push(AppAction::SetTriggerMode(mode));
        }
    }

    let slope_label = match trigger.slope {
        TriggerSlope::Rising => "↗",
        TriggerSlope::Falling => "↘",
    };
    if ui
        .button(slope_label)
        .on_hover_text(format!("{} edge", trigger.slope))
        .clicked()
    {
        actions.push(AppAction::ToggleSlope);
    }

    let rearm = egui::Button::new("Re-arm");
    if ui
        .add_enabled(trigger.can_rearm(), rearm)
        .on_hover_text("Wait for the next trigger")
        .clicked()
    {
        actions.push(AppAction::RearmTrigger);
    }

    let phase_color = if trigger.is_holding() {
        Color32::YELLOW
    } else {
        Color32::GRAY
    };
    ui.colored_label(phase_color, RichText::new(trigger.phase.to_string()).small());
}

fn render_scale_group(ui: &mut Ui, ctx: &ToolbarContext<'_>, actions: &mut Vec<AppAction>) {
    let current = ctx.settings.voltage_scale;
    ui.label("Scale:");
    egui::ComboBox::from_id_salt("voltage_scale")
        .selected_text(format!("{:.1} V", current))
        .width(70.0)
        .show_ui(ui, |ui| {
            for &scale in VOLTAGE_SCALE_PRESETS {
                if ui
                    .selectable_label(current == scale, format!("{:.1} V", scale))
                    .clicked()
                    && current != scale
                {
                    actions.push(AppAction::SetVoltageScale(scale));
                }
            }
        });
}

fn render_readout_group(ui: &mut Ui, ctx: &ToolbarContext<'_>) {
    let readout = &ctx.settings.readout;
    // Right-to-left layout: last item added is leftmost
    if let Some(vpp) = &readout.peak_to_peak {
        ui.monospace(vpp);
    }
    if let Some(freq) = &readout.frequency {
        ui.monospace(freq);
    }
}

pub fn connection_indicator(status: ConnectionStatus) -> (Color32, &'static str) {
    match status {
        ConnectionStatus::Connected => (Color32::GREEN, "Connected"),
        ConnectionStatus::Connecting => (Color32::YELLOW, "Connecting..."),
        ConnectionStatus::Disconnected => (Color32::GRAY, "Disconnected"),
    }
}
