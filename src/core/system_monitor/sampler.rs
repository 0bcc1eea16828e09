//! Clocked sampling loop and snapshot assembly.
//!
//! Everything runs on the caller's thread: the presentation loop asks whether
//! a tick is due, calls `tick`, and renders the returned snapshot. Each
//! collector enforces its own throttle, so a tick is cheap when only the fast
//! metrics are due.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::core::config::MonitorConfig;
use crate::error::Result;
use crate::platform::fs::{FileSystem, RealFs};
use crate::platform::gpu::get_gpu_providers;
use crate::platform::procfs::ProcfsParams;

use super::events::{EventLog, EventWatcher, Journalctl};
use super::gpu::{GpuBackend, GpuProvider};
use super::metrics::Snapshot;
use super::network::{NetCounterSource, NetworkRateEstimator, SysinfoNetSource};
use super::process::{ProcessScanner, ScannerConfig};
use super::system::SystemCollector;
use super::thermal::ThermalMonitor;

/// Commands the input layer can send to the sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerCommand {
    /// Sample now, outside the regular cadence
    Redraw,
    /// Stop sampling and release backend handles
    Quit,
}

/// Where the collectors read from.
///
/// `SamplerSources::system` wires up the live machine; tests swap in fixtures.
pub struct SamplerSources {
    pub fs: Arc<dyn FileSystem>,
    pub proc_root: PathBuf,
    pub hwmon_root: PathBuf,
    pub procfs_params: ProcfsParams,
    pub gpu_providers: Vec<Box<dyn GpuProvider>>,
    pub net_source: Box<dyn NetCounterSource>,
    pub event_log: Box<dyn EventLog>,
}

impl SamplerSources {
    pub fn system(config: &MonitorConfig) -> Self {
        let fs = RealFs::shared();
        let gpu_providers = if config.collect_gpu {
            get_gpu_providers(fs.clone(), config.drm_vendor_ids.clone())
        } else {
            Vec::new()
        };

        Self {
            fs,
            proc_root: PathBuf::from("/proc"),
            hwmon_root: PathBuf::from("/sys/class/hwmon"),
            procfs_params: ProcfsParams::detect(),
            gpu_providers,
            net_source: Box::new(SysinfoNetSource::new()),
            event_log: Box::new(Journalctl::new(
                config.oom_window(),
                config.event_query_timeout(),
            )),
        }
    }
}

pub struct ClockedSampler {
    cadence: Duration,
    system: SystemCollector,
    processes: ProcessScanner,
    gpus: GpuBackend,
    network: NetworkRateEstimator,
    thermal: ThermalMonitor,
    events: EventWatcher,
    last_tick: Option<Instant>,
    latest: Snapshot,
    stopped: bool,
}

impl ClockedSampler {
    /// Build every collector against the live system.
    ///
    /// Fails only when the process table can't be read.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let sources = SamplerSources::system(&config);
        Self::with_sources(config, sources)
    }

    pub fn with_sources(config: MonitorConfig, sources: SamplerSources) -> Result<Self> {
        config.validate()?;
        let now = Instant::now();

        let mut system = SystemCollector::new(config.history_len);
        system.prime();

        let mut processes = ProcessScanner::new(
            sources.fs.clone(),
            ScannerConfig {
                proc_root: sources.proc_root,
                params: sources.procfs_params,
                top_n: config.top_processes,
                first_interval: config.process_first_interval(),
                interval: config.process_interval(),
            },
        );
        processes.prime(now)?;

        let gpus = if sources.gpu_providers.is_empty() {
            GpuBackend::empty()
        } else {
            GpuBackend::new(sources.gpu_providers, config.history_len)
        };

        let mut network = NetworkRateEstimator::new(
            sources.net_source,
            config.net_peak_floor,
            config.history_len,
        );
        // Baseline so the first tick already reports a rate.
        network.sample_at(now);

        let thermal =
            ThermalMonitor::with_root(sources.fs, sources.hwmon_root, config.thermal_interval());
        let events = EventWatcher::new(sources.event_log, config.oom_interval())?;

        log::info!(
            "Sampler ready: {} GPU(s), refresh every {:?}",
            gpus.device_count(),
            config.refresh()
        );

        Ok(Self {
            cadence: config.refresh(),
            system,
            processes,
            gpus,
            network,
            thermal,
            events,
            last_tick: None,
            latest: Snapshot::default(),
            stopped: false,
        })
    }

    /// Whether the regular cadence calls for a tick at `now`
    pub fn is_due(&self, now: Instant) -> bool {
        !self.stopped
            && self
                .last_tick
                .map_or(true, |prev| now.saturating_duration_since(prev) >= self.cadence)
    }

    /// Time left until the next regular tick
    pub fn until_next(&self, now: Instant) -> Duration {
        match self.last_tick {
            Some(prev) => self.cadence.saturating_sub(now.saturating_duration_since(prev)),
            None => Duration::ZERO,
        }
    }

    pub fn tick(&mut self) -> &Snapshot {
        self.tick_at(Instant::now())
    }

    /// Run every collector once and publish a new snapshot
    pub fn tick_at(&mut self, now: Instant) -> &Snapshot {
        if self.stopped {
            return &self.latest;
        }
        self.last_tick = Some(now);

        let (cpu, mem) = self.system.sample();
        let ranking = self.processes.scan_at(now).clone();
        let gpus = self.gpus.sample_all();
        self.network.sample_at(now);
        let thermal = self.thermal.refresh_at(now, &self.gpus.temperatures());
        let oom = self.events.check_at(now);

        self.latest = Snapshot {
            taken_at: Utc::now(),
            cpu,
            mem,
            net: self.network.metrics(),
            gpus,
            procs_by_cpu: ranking.by_cpu,
            procs_by_mem: ranking.by_mem,
            thermal,
            oom,
        };
        &self.latest
    }

    pub fn latest(&self) -> &Snapshot {
        &self.latest
    }

    /// Apply an input command. Returns `false` once the sampler has stopped.
    pub fn handle(&mut self, command: SamplerCommand) -> bool {
        match command {
            SamplerCommand::Redraw => {
                self.tick();
            }
            SamplerCommand::Quit => self.shutdown(),
        }
        !self.stopped
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.gpus.shutdown();
        log::info!("Sampler stopped");
    }
}

impl Drop for ClockedSampler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
