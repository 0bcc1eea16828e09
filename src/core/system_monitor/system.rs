use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use super::history::MetricHistory;
use super::metrics::{CpuMetrics, MemoryMetrics};

/// Aggregate CPU utilisation plus memory and swap totals
pub struct SystemCollector {
    system: System,
    cpu_pct: f64,
    cores: usize,
    freq_mhz: u64,
    history: MetricHistory,
    memory: MemoryMetrics,
}

impl SystemCollector {
    pub fn new(history_len: usize) -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(cpu_refresh_kind())
            .with_memory(MemoryRefreshKind::everything());

        Self {
            system: System::new_with_specifics(refresh_kind),
            cpu_pct: 0.0,
            cores: 0,
            freq_mhz: 0,
            history: MetricHistory::new(history_len),
            memory: MemoryMetrics::default(),
        }
    }

    /// Take the first CPU reading. Usage is a delta between refreshes, so the
    /// first real sample is only meaningful after this.
    pub fn prime(&mut self) {
        self.system.refresh_cpu_specifics(cpu_refresh_kind());
        self.system.refresh_memory();
    }

    pub fn sample(&mut self) -> (CpuMetrics, MemoryMetrics) {
        self.system.refresh_cpu_specifics(cpu_refresh_kind());
        self.system.refresh_memory();

        let cpus = self.system.cpus();
        self.cores = cpus.len();
        self.freq_mhz = cpus.first().map_or(0, |cpu| cpu.frequency());

        let memory = MemoryMetrics {
            used: self.system.used_memory(),
            total: self.system.total_memory(),
            available: self.system.available_memory(),
            swap_used: self.system.used_swap(),
            swap_total: self.system.total_swap(),
        };
        self.record(f64::from(self.system.global_cpu_usage()), memory);

        (self.cpu(), self.memory)
    }

    fn record(&mut self, cpu_pct: f64, memory: MemoryMetrics) {
        self.cpu_pct = if cpu_pct.is_finite() {
            cpu_pct.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.history.append(self.cpu_pct);
        self.memory = memory;
    }

    pub fn cpu(&self) -> CpuMetrics {
        CpuMetrics {
            pct: self.cpu_pct,
            cores: self.cores,
            freq_mhz: self.freq_mhz,
            history: self.history.clone(),
        }
    }

    pub fn memory(&self) -> MemoryMetrics {
        self.memory
    }
}

fn cpu_refresh_kind() -> CpuRefreshKind {
    CpuRefreshKind::nothing().with_cpu_usage().with_frequency()
}
