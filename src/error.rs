use std::io;
use thiserror::Error;

/// Custom error type for ktop
#[derive(Error, Debug)]
pub enum KtopError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error("Process table unavailable: {0}")]
    ProcessTable(String),

    #[error("GPU not available: {0}")]
    GpuNotAvailable(String),

    #[error("Metric collection failed: {0}")]
    MetricCollection(String),

    #[error("Event log query failed: {0}")]
    EventLog(String),

    #[error("TUI error: {0}")]
    Tui(String),
}

/// Result type alias for ktop
pub type Result<T> = std::result::Result<T, KtopError>;

impl KtopError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        KtopError::Config(msg.into())
    }

    /// Create a parse error for the named input
    pub fn parse<W: Into<String>, S: Into<String>>(what: W, msg: S) -> Self {
        KtopError::Parse {
            what: what.into(),
            message: msg.into(),
        }
    }

    pub fn process_table<S: Into<String>>(msg: S) -> Self {
        KtopError::ProcessTable(msg.into())
    }

    pub fn gpu_not_available<S: Into<String>>(msg: S) -> Self {
        KtopError::GpuNotAvailable(msg.into())
    }

    pub fn metric_collection<S: Into<String>>(msg: S) -> Self {
        KtopError::MetricCollection(msg.into())
    }

    pub fn event_log<S: Into<String>>(msg: S) -> Self {
        KtopError::EventLog(msg.into())
    }

    pub fn tui<S: Into<String>>(msg: S) -> Self {
        KtopError::Tui(msg.into())
    }
}
