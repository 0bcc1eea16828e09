use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{KtopError, Result};

/// Upper bound for `history_len`; one day of samples at the default cadence
pub const MAX_HISTORY_LEN: usize = 86_400;

/// Monitor settings.
///
/// Loaded from `<config_dir>/ktop/config.json`; every field is optional in the
/// file and falls back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sampling cadence
    pub refresh_ms: u64,
    /// Input polling granularity between ticks
    pub input_poll_ms: u64,
    pub history_len: usize,
    pub top_processes: usize,
    /// Minimum gap between the seeding process scan and the first real one
    pub process_first_interval_ms: u64,
    pub process_interval_ms: u64,
    pub thermal_interval_ms: u64,
    pub oom_interval_ms: u64,
    pub oom_window_hours: u64,
    pub event_query_timeout_ms: u64,
    /// Lower bound for the network peak, bytes/s
    pub net_peak_floor: f64,
    pub collect_gpu: bool,
    /// PCI vendor ids picked up by the DRM sysfs collector
    pub drm_vendor_ids: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 1000,
            input_poll_ms: 50,
            history_len: 300,
            top_processes: 10,
            process_first_interval_ms: 1000,
            process_interval_ms: 3000,
            thermal_interval_ms: 5000,
            oom_interval_ms: 5000,
            oom_window_hours: 8,
            event_query_timeout_ms: 2000,
            net_peak_floor: 1024.0,
            collect_gpu: true,
            drm_vendor_ids: vec!["0x1002".to_string(), "0x8086".to_string()],
        }
    }
}

impl MonitorConfig {
    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path).map_err(|e| {
            KtopError::config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::load_from_str(&data)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> Result<Self> {
        let config: MonitorConfig = if s.trim().is_empty() {
            MonitorConfig::default()
        } else {
            serde_json::from_str(s)
                .map_err(|e| KtopError::config(format!("Invalid config: {}", e)))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ktop").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("refresh_ms", self.refresh_ms),
            ("input_poll_ms", self.input_poll_ms),
            ("process_first_interval_ms", self.process_first_interval_ms),
            ("process_interval_ms", self.process_interval_ms),
            ("thermal_interval_ms", self.thermal_interval_ms),
            ("oom_interval_ms", self.oom_interval_ms),
            ("oom_window_hours", self.oom_window_hours),
            ("event_query_timeout_ms", self.event_query_timeout_ms),
        ];
        for (name, value) in durations {
            if value == 0 {
                return Err(KtopError::config(format!("{} must be > 0", name)));
            }
        }

        if self.history_len == 0 || self.history_len > MAX_HISTORY_LEN {
            return Err(KtopError::config(format!(
                "history_len must be between 1 and {}, got {}",
                MAX_HISTORY_LEN, self.history_len
            )));
        }
        if self.top_processes == 0 {
            return Err(KtopError::config("top_processes must be > 0"));
        }
        if !(self.net_peak_floor.is_finite() && self.net_peak_floor > 0.0) {
            return Err(KtopError::config(format!(
                "net_peak_floor must be a positive number, got {}",
                self.net_peak_floor
            )));
        }
        Ok(())
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn input_poll(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms)
    }

    pub fn process_first_interval(&self) -> Duration {
        Duration::from_millis(self.process_first_interval_ms)
    }

    pub fn process_interval(&self) -> Duration {
        Duration::from_millis(self.process_interval_ms)
    }

    pub fn thermal_interval(&self) -> Duration {
        Duration::from_millis(self.thermal_interval_ms)
    }

    pub fn oom_interval(&self) -> Duration {
        Duration::from_millis(self.oom_interval_ms)
    }

    pub fn oom_window(&self) -> Duration {
        Duration::from_secs(self.oom_window_hours.saturating_mul(3600))
    }

    pub fn event_query_timeout(&self) -> Duration {
        Duration::from_millis(self.event_query_timeout_ms)
    }
}
