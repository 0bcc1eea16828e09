use ratatui::{prelude::*, widgets::Gauge};

use crate::core::system_monitor::MetricHistory;

/// Create a gauge with color based on value thresholds
pub fn colored_gauge<'a>(value: f64, label: &'a str) -> Gauge<'a> {
    let color = usage_color(value);

    Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio((value / 100.0).clamp(0.0, 1.0))
        .label(label)
}

pub fn usage_color(value: f64) -> Color {
    match value {
        v if v < 50.0 => Color::Cyan,
        v if v < 75.0 => Color::LightYellow,
        v if v < 90.0 => Color::LightRed,
        _ => Color::Red,
    }
}

/// Color for a temperature relative to its alarm threshold
pub fn temp_color(current: f64, critical: f64) -> Color {
    if critical <= 0.0 {
        return Color::White;
    }
    match current / critical {
        r if r < 0.6 => Color::Cyan,
        r if r < 0.8 => Color::LightYellow,
        r if r < 0.95 => Color::LightRed,
        _ => Color::Red,
    }
}

/// The most recent `width` history points scaled to integers for `Sparkline`.
///
/// `max` is the value mapped to the full bar height; values are scaled by 10
/// so fractional percentages still show.
pub fn sparkline_data(history: &MetricHistory, width: usize, max: f64) -> Vec<u64> {
    if max <= 0.0 {
        return vec![0; history.len().min(width)];
    }
    history
        .values(width)
        .into_iter()
        .map(|v| ((v / max).clamp(0.0, 1.0) * 1000.0).round() as u64)
        .collect()
}
