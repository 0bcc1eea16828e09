//! System monitoring core functionality.
//!
//! Collectors for CPU, memory, processes, GPUs, network, temperatures and
//! OOM events, plus the sampler that assembles them into snapshots.

mod events;
mod gpu;
mod history;
mod metrics;
mod network;
mod process;
mod sampler;
mod system;
mod thermal;

pub use events::{clean_scope_name, EventLog, EventWatcher, Journalctl, OomLineParser};
pub use gpu::{DeviceDescriptor, GpuBackend, GpuProvider, GpuSample, GpuTemperature};
pub use history::{MetricHistory, MetricSample, DEFAULT_HISTORY_SIZE};
pub use metrics::{
    CpuMetrics, GpuCapabilities, GpuDevice, GpuVendor, MemoryMetrics, NetworkMetrics, OomEvent,
    OomSource, ProcessRecord, Snapshot, ThermalMetrics, ThermalReading, ThresholdSource,
};
pub use network::{NetCounterSource, NetCounters, NetworkRateEstimator, SysinfoNetSource};
pub use process::{ProcessRanking, ProcessScanner, ScannerConfig};
pub use sampler::{ClockedSampler, SamplerCommand, SamplerSources};
pub use system::SystemCollector;
pub use thermal::{ThermalMonitor, CPU_FALLBACK_C, GPU_FALLBACK_C, MEM_FALLBACK_C};
