//! Scope display mapping
//!
//! [`render`] turns the frame currently on screen and a [`RenderConfig`] into
//! a flat list of [`DrawCommand`]s in viewport pixel coordinates (origin top
//! left, y down). It never touches a display surface; the frontend paints the
//! commands with egui, and tests inspect them directly.
//!
//! Draw order: background, grid, centre marker, axis labels, trace, status.

use crate::config::AppConfig;
use crate::types::WaveformFrame;

/// Minor subdivisions per major grid cell
pub const MINOR_DIVISIONS: u32 = 5;

/// Half length of the centre cross arms in pixels
pub const MARKER_HALF_SIZE: f32 = 20.0;

/// Inset of labels and status text from the viewport edge
const TEXT_MARGIN: f32 = 10.0;

/// Baseline offset of an axis label below its grid line
const LABEL_BASELINE: f32 = 20.0;

/// Everything the renderer needs besides the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Volts spanning the full vertical extent
    pub voltage_scale: f32,
    /// Major grid divisions per axis
    pub grid_divisions: u32,
    /// Viewport width in pixels
    pub width: f32,
    /// Viewport height in pixels
    pub height: f32,
    /// Sample rate shown in the status annotation
    pub sample_rate_hz: f32,
    /// Draw the centre cross marker
    pub center_marker: bool,
}

impl RenderConfig {
    /// Config for a viewport, taking scale and grid from the app config
    pub fn from_config(config: &AppConfig, width: f32, height: f32) -> Self {
        Self {
            voltage_scale: config.display.voltage_scale,
            grid_divisions: config.display.grid_divisions,
            width,
            height,
            sample_rate_hz: config.acquisition.sample_rate_hz,
            center_marker: true,
        }
    }

    /// Vertical pixel position of a voltage
    pub fn voltage_to_y(&self, volts: f32) -> f32 {
        self.height * (1.0 - volts / self.voltage_scale)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from_config(&AppConfig::default(), 800.0, 600.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// Subdivision of a grid cell
    MinorGrid,
    /// Major grid line
    MajorGrid,
    /// The central major line of each axis
    CenterGrid,
    /// Centre cross marker
    Marker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// Voltage axis label
    AxisLabel,
    /// Time and sample annotations
    Status,
}

/// Which corner of the text box sits on the given position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    LeftBottom,
    RightBottom,
}

/// One drawing primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole viewport with the background colour
    Background { width: f32, height: f32 },
    Line {
        from: Point,
        to: Point,
        style: LineStyle,
    },
    Text {
        pos: Point,
        text: String,
        anchor: TextAnchor,
        style: TextStyle,
    },
    /// The waveform path; points may lie outside the viewport
    Trace { points: Vec<Point> },
}

/// Map a frame and config to drawing primitives
pub fn render(frame: Option<&WaveformFrame>, config: &RenderConfig) -> Vec<DrawCommand> {
    let (width, height) = (config.width, config.height);
    if !(width > 0.0 && height > 0.0) {
        return Vec::new();
    }

    let mut out = vec![DrawCommand::Background { width, height }];
    render_grid(config, &mut out);

    if config.center_marker {
        let (cx, cy) = (width / 2.0, height / 2.0);
        out.push(line(cx - MARKER_HALF_SIZE, cy, cx + MARKER_HALF_SIZE, cy, LineStyle::Marker));
        out.push(line(cx, cy - MARKER_HALF_SIZE, cx, cy + MARKER_HALF_SIZE, LineStyle::Marker));
    }

    let scale_valid = config.voltage_scale > 0.0 && config.voltage_scale.is_finite();
    if scale_valid {
        render_axis_labels(config, &mut out);
    }

    if let Some(frame) = frame.filter(|f| !f.is_empty() && scale_valid) {
        out.push(DrawCommand::Trace {
            points: trace_points(frame, config),
        });
    }

    render_status(frame, config, &mut out);
    out
}

/// Polyline vertices for a frame: `x_i = i * width / N`, `y_i = voltage_to_y(s_i)`
pub fn trace_points(frame: &WaveformFrame, config: &RenderConfig) -> Vec<Point> {
    let step = config.width / frame.len() as f32;
    frame
        .samples()
        .iter()
        .enumerate()
        .map(|(i, &v)| Point::new(i as f32 * step, config.voltage_to_y(v)))
        .collect()
}

fn line(x0: f32, y0: f32, x1: f32, y1: f32, style: LineStyle) -> DrawCommand {
    DrawCommand::Line {
        from: Point::new(x0, y0),
        to: Point::new(x1, y1),
        style,
    }
}

fn render_grid(config: &RenderConfig, out: &mut Vec<DrawCommand>) {
    let divisions = config.grid_divisions;
    if divisions == 0 {
        return;
    }
    let (width, height) = (config.width, config.height);
    let div_x = width / divisions as f32;
    let div_y = height / divisions as f32;
    let style_for = |i: u32| {
        if i == divisions / 2 {
            LineStyle::CenterGrid
        } else {
            LineStyle::MajorGrid
        }
    };

    for i in 0..=divisions {
        let x = i as f32 * div_x;
        out.push(line(x, 0.0, x, height, style_for(i)));
        if i < divisions {
            for j in 1..MINOR_DIVISIONS {
                let sub = x + div_x / MINOR_DIVISIONS as f32 * j as f32;
                out.push(line(sub, 0.0, sub, height, LineStyle::MinorGrid));
            }
        }
    }

    for i in 0..=divisions {
        let y = i as f32 * div_y;
        out.push(line(0.0, y, width, y, style_for(i)));
        if i < divisions {
            for j in 1..MINOR_DIVISIONS {
                let sub = y + div_y / MINOR_DIVISIONS as f32 * j as f32;
                out.push(line(0.0, sub, width, sub, LineStyle::MinorGrid));
            }
        }
    }
}

fn render_axis_labels(config: &RenderConfig, out: &mut Vec<DrawCommand>) {
    let divisions = config.grid_divisions;
    if divisions == 0 {
        return;
    }
    let div_y = config.height / divisions as f32;
    let per_division = config.voltage_scale / divisions as f32;

    for i in 0..=divisions {
        let volts = config.voltage_scale - i as f32 * per_division;
        out.push(DrawCommand::Text {
            pos: Point::new(TEXT_MARGIN, i as f32 * div_y + LABEL_BASELINE),
            text: format!("{:.1}", volts),
            anchor: TextAnchor::LeftBottom,
            style: TextStyle::AxisLabel,
        });
    }
}

fn render_status(frame: Option<&WaveformFrame>, config: &RenderConfig, out: &mut Vec<DrawCommand>) {
    let baseline = config.height - TEXT_MARGIN;
    out.push(DrawCommand::Text {
        pos: Point::new(TEXT_MARGIN, baseline),
        text: "0s".to_string(),
        anchor: TextAnchor::LeftBottom,
        style: TextStyle::Status,
    });

    let info = match frame {
        Some(frame) => format!("{:.0} Sa/s  {} Sa", config.sample_rate_hz, frame.len()),
        None => "0 Sa/s".to_string(),
    };
    out.push(DrawCommand::Text {
        pos: Point::new(config.width - TEXT_MARGIN, baseline),
        text: info,
        anchor: TextAnchor::RightBottom,
        style: TextStyle::Status,
    });
}
