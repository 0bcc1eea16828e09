//! Terminal User Interface for system monitoring.
//!
//! Provides a real-time dashboard using ratatui.

mod app;
mod event_handler;
mod render;
mod widgets;

pub use app::{run_json_output, run_monitor_app, MonitorApp};
pub use event_handler::MonitorEvent;
