// ktop library - public API

// Re-export error types
pub mod error;
pub use error::{KtopError, Result};

// Module declarations
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use core::config::MonitorConfig;
pub use core::system_monitor::{ClockedSampler, SamplerCommand, Snapshot};

use std::fs::File;
use std::path::Path;

/// Initialize logging.
///
/// The TUI owns the terminal, so without a log file only warnings and errors
/// are emitted (to stderr). `RUST_LOG` still overrides `level`.
pub fn init_logging(level: log::LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_default_env();

    if let Some(path) = log_file {
        let file = File::create(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .map_err(|e| KtopError::config(format!("logger already initialised: {}", e)))
}
