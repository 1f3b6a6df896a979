//! Scope colour theme

use crate::render::{LineStyle, TextStyle};
use egui::{Color32, FontId, Stroke};

pub const BACKGROUND: Color32 = Color32::from_rgb(0x0A, 0x1E, 0x1E);
pub const MINOR_GRID: Color32 = Color32::from_rgb(0x1A, 0x35, 0x35);
pub const MAJOR_GRID: Color32 = Color32::from_rgb(0x2A, 0x45, 0x45);
pub const WAVEFORM: Color32 = Color32::from_rgb(0x00, 0xFF, 0x88);
pub const AXIS_TEXT: Color32 = Color32::from_rgb(0x88, 0xFF, 0xAA);
pub const MARKER: Color32 = Color32::from_rgb(0xFF, 0x88, 0x44);
pub const STATUS_TEXT: Color32 = Color32::from_rgb(0x66, 0x66, 0x66);

pub const TRACE_WIDTH: f32 = 2.0;

pub fn line_stroke(style: LineStyle) -> Stroke {
    match style {
        LineStyle::MinorGrid => Stroke::new(1.0, MINOR_GRID),
        LineStyle::MajorGrid => Stroke::new(1.0, MAJOR_GRID),
        LineStyle::CenterGrid => Stroke::new(2.0, MAJOR_GRID),
        LineStyle::Marker => Stroke::new(2.0, MARKER),
    }
}

pub fn text_color(style: TextStyle) -> Color32 {
    match style {
        TextStyle::AxisLabel => AXIS_TEXT,
        TextStyle::Status => STATUS_TEXT,
    }
}

pub fn text_font(style: TextStyle) -> FontId {
    match style {
        TextStyle::AxisLabel => FontId::monospace(12.0),
        TextStyle::Status => FontId::monospace(11.0),
    }
}
