use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::history::MetricHistory;

/// Complete metrics snapshot for one tick
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub cpu: CpuMetrics,
    pub mem: MemoryMetrics,
    pub net: NetworkMetrics,
    pub gpus: Vec<GpuDevice>,
    pub procs_by_cpu: Vec<ProcessRecord>,
    pub procs_by_mem: Vec<ProcessRecord>,
    pub thermal: ThermalMetrics,
    pub oom: Option<OomEvent>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CpuMetrics {
    pub pct: f64,
    /// Logical cores
    pub cores: usize,
    /// Current frequency of the first core, 0 when unknown
    pub freq_mhz: u64,
    pub history: MetricHistory,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryMetrics {
    pub used: u64,
    pub total: u64,
    /// Reclaimable plus free, as the kernel reports it
    pub available: u64,
    pub swap_used: u64,
    pub swap_total: u64,
}

impl MemoryMetrics {
    pub fn used_pct(&self) -> f64 {
        percent(self.used, self.total)
    }

    pub fn swap_pct(&self) -> f64 {
        percent(self.swap_used, self.swap_total)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkMetrics {
    /// Bytes per second
    pub rate_up: f64,
    pub rate_down: f64,
    pub peak: f64,
    pub history_up: MetricHistory,
    pub history_down: MetricHistory,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    #[default]
    Unknown,
}

impl GpuVendor {
    /// Map a PCI vendor id (as found in sysfs, e.g. `0x1002`)
    pub fn from_pci_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "0x10de" => GpuVendor::Nvidia,
            "0x1002" => GpuVendor::Amd,
            "0x8086" => GpuVendor::Intel,
            _ => GpuVendor::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GpuVendor::Nvidia => "NVIDIA",
            GpuVendor::Amd => "AMD",
            GpuVendor::Intel => "Intel",
            GpuVendor::Unknown => "Unknown",
        }
    }
}

/// Which metrics a device can report, fixed at discovery
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GpuCapabilities {
    pub has_util: bool,
    pub has_mem: bool,
    pub has_temp: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GpuDevice {
    pub id: usize,
    pub vendor: GpuVendor,
    pub name: String,
    pub util_pct: f64,
    pub mem_used: u64,
    pub mem_total: u64,
    pub capabilities: GpuCapabilities,
    pub util_history: MetricHistory,
    pub mem_history: MetricHistory,
}

impl GpuDevice {
    pub fn mem_pct(&self) -> f64 {
        percent(self.mem_used, self.mem_total)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub cpu_ticks: u64,
    pub rss_bytes: u64,
    pub shared_bytes: Option<u64>,
    pub cpu_pct: f64,
    pub mem_pct: f64,
}

/// Where a thermal threshold came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ThresholdSource {
    Critical,
    High,
    Vendor,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThermalReading {
    pub label: String,
    pub current_c: f64,
    pub critical_c: f64,
    pub threshold_source: ThresholdSource,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ThermalMetrics {
    pub cpu: Option<ThermalReading>,
    pub mem: Option<ThermalReading>,
    pub gpus: Vec<ThermalReading>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OomSource {
    /// Kernel OOM killer
    Kernel,
    /// systemd-oomd
    Daemon,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OomEvent {
    pub timestamp: DateTime<FixedOffset>,
    pub target: String,
    pub source: OomSource,
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}
