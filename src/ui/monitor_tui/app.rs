use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::core::config::MonitorConfig;
use crate::core::system_monitor::{ClockedSampler, SamplerCommand, Snapshot};

use super::event_handler::MonitorEvent;
use super::render::render_ui;

/// Monitor application state
pub struct MonitorApp {
    pub snapshot: Snapshot,
    pub should_quit: bool,
    pub show_help: bool,
    pub refresh: Duration,
}

impl MonitorApp {
    pub fn new(refresh: Duration) -> Self {
        Self {
            snapshot: Snapshot::default(),
            should_quit: false,
            show_help: false,
            refresh,
        }
    }

    pub fn update(&mut self, snapshot: &Snapshot) {
        self.snapshot = snapshot.clone();
    }

    /// Handle keyboard events; sampler commands are forwarded by the caller
    pub fn handle_event(&mut self, event: MonitorEvent) {
        match event {
            MonitorEvent::Quit => self.should_quit = true,
            MonitorEvent::ToggleHelp => self.show_help = !self.show_help,
            MonitorEvent::Redraw | MonitorEvent::None => {}
        }
    }
}

/// Raw mode and the alternate screen, undone on drop.
///
/// Dropping restores the terminal whether the loop returns normally, bails
/// out with an error, or is left because of an interrupt.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e).context("Failed to enter alternate screen");
        }

        match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(e) => {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                Err(e).context("Failed to create terminal")
            }
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Run the monitor TUI until the user quits or `interrupted` is set
pub fn run_monitor_app(config: MonitorConfig, interrupted: Arc<AtomicBool>) -> Result<()> {
    let poll = config.input_poll();
    let mut app = MonitorApp::new(config.refresh());

    // Startup failures are reported before the terminal changes mode.
    let mut sampler = ClockedSampler::new(config).context("Failed to start sampler")?;

    let mut guard = TerminalGuard::enter()?;

    // The first CPU reading needs a short gap after priming.
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    app.update(sampler.tick());

    loop {
        guard
            .terminal
            .draw(|frame| render_ui(frame, &app))
            .context("Failed to draw frame")?;

        let timeout = sampler.until_next(Instant::now()).min(poll);
        if event::poll(timeout).context("Event poll failed")? {
            if let Event::Key(key) = event::read().context("Event read failed")? {
                if key.kind == KeyEventKind::Press {
                    let monitor_event = MonitorEvent::from_key(key);
                    app.handle_event(monitor_event);

                    if let Some(command) = monitor_event.command() {
                        sampler.handle(command);
                        if command == SamplerCommand::Redraw {
                            app.update(sampler.latest());
                        }
                    }
                }
            }
        }

        if interrupted.load(Ordering::SeqCst) {
            log::info!("Interrupted, shutting down");
            sampler.handle(SamplerCommand::Quit);
            app.should_quit = true;
        }

        if app.should_quit || sampler.is_stopped() {
            break;
        }

        let now = Instant::now();
        if sampler.is_due(now) {
            app.update(sampler.tick_at(now));
        }
    }

    Ok(())
}

/// Print one JSON snapshot per refresh until `interrupted` is set
pub fn run_json_output(config: MonitorConfig, interrupted: Arc<AtomicBool>) -> Result<()> {
    let refresh = config.refresh();
    let mut sampler = ClockedSampler::new(config).context("Failed to start sampler")?;

    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);

    while !interrupted.load(Ordering::SeqCst) {
        let snapshot = sampler.tick();
        println!(
            "{}",
            serde_json::to_string(snapshot).context("Failed to serialize snapshot")?
        );

        let deadline = Instant::now() + refresh;
        while Instant::now() < deadline && !interrupted.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(50).min(refresh));
        }
    }

    sampler.handle(SamplerCommand::Quit);
    Ok(())
}
