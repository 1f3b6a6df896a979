//! Scope view: paints [`render`] output into the central panel.
//!
//! The render config is rebuilt from the allocated rect on every repaint,
//! so resizing the window simply redraws the last frame at the new size.

use egui::{Align2, Pos2, Rect, Sense, Shape, Ui};

use crate::frontend::theme;
use crate::render::{render, DrawCommand, Point, RenderConfig, TextAnchor};
use crate::types::WaveformFrame;

/// What the scope view needs besides the frame
pub struct ScopeViewContext<'a> {
    pub frame: Option<&'a WaveformFrame>,
    pub voltage_scale: f32,
    pub grid_divisions: u32,
    pub sample_rate_hz: f32,
    pub center_marker: bool,
}

impl ScopeViewContext<'_> {
    pub fn render_config(&self, size: egui::Vec2) -> RenderConfig {
        RenderConfig {
            voltage_scale: self.voltage_scale,
            grid_divisions: self.grid_divisions,
            width: size.x,
            height: size.y,
            sample_rate_hz: self.sample_rate_hz,
            center_marker: self.center_marker,
        }
    }
}

/// Fill the remaining space of `ui` with the scope display
pub fn show_scope(ui: &mut Ui, ctx: &ScopeViewContext<'_>) -> egui::Response {
    let size = ui.available_size();
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;

    let commands = render(ctx.frame, &ctx.render_config(rect.size()));
    paint_commands(&painter, rect, &commands);
    response
}

/// Paint draw commands with `rect.min` as the viewport origin
pub fn paint_commands(painter: &egui::Painter, rect: Rect, commands: &[DrawCommand]) {
    let origin = rect.min;
    for command in commands {
        match command {
            DrawCommand::Background { width, height } => {
                let bg = Rect::from_min_size(origin, egui::vec2(*width, *height));
                painter.rect_filled(bg, 0.0, theme::BACKGROUND);
            }
            DrawCommand::Line { from, to, style } => {
                painter.line_segment(
                    [to_screen(origin, *from), to_screen(origin, *to)],
                    theme::line_stroke(*style),
                );
            }
            DrawCommand::Text {
                pos,
                text,
                anchor,
                style,
            } => {
                painter.text(
                    to_screen(origin, *pos),
                    anchor_align(*anchor),
                    text,
                    theme::text_font(*style),
                    theme::text_color(*style),
                );
            }
            DrawCommand::Trace { points } => {
                let points: Vec<Pos2> = points.iter().map(|p| to_screen(origin, *p)).collect();
                // Samples outside the scale run off screen
                painter.with_clip_rect(rect).add(Shape::line(
                    points,
                    egui::Stroke::new(theme::TRACE_WIDTH, theme::WAVEFORM),
                ));
            }
        }
    }
}

pub fn to_screen(origin: Pos2, point: Point) -> Pos2 {
    Pos2::new(origin.x + point.x, origin.y + point.y)
}

pub fn anchor_align(anchor: TextAnchor) -> Align2 {
    match anchor {
        TextAnchor::LeftBottom => Align2::LEFT_BOTTOM,
        TextAnchor::RightBottom => Align2::RIGHT_BOTTOM,
    }
}
