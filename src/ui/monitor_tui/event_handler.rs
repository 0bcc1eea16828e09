use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::system_monitor::SamplerCommand;

/// Events that can occur in the monitor TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Quit the application
    Quit,
    /// Sample and repaint immediately
    Redraw,
    /// Toggle help overlay
    ToggleHelp,
    /// No action
    None,
}

impl MonitorEvent {
    /// Map a key press. Raw mode swallows SIGINT, so Ctrl-C arrives here.
    pub fn from_key(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                MonitorEvent::Quit
            }
            KeyCode::Char('q') | KeyCode::Esc => MonitorEvent::Quit,
            KeyCode::Char('r') => MonitorEvent::Redraw,
            KeyCode::Char('?') | KeyCode::Char('h') => MonitorEvent::ToggleHelp,
            _ => MonitorEvent::None,
        }
    }

    /// The sampler command this event forwards, if any
    pub fn command(self) -> Option<SamplerCommand> {
        match self {
            MonitorEvent::Quit => Some(SamplerCommand::Quit),
            MonitorEvent::Redraw => Some(SamplerCommand::Redraw),
            MonitorEvent::ToggleHelp | MonitorEvent::None => None,
        }
    }
}
