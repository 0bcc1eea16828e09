// End-to-end sampling over fixture sources

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ktop::core::config::MonitorConfig;
use ktop::core::system_monitor::{
    ClockedSampler, EventLog, NetCounterSource, NetCounters, OomSource, SamplerCommand,
    SamplerSources,
};
use ktop::platform::{MockFs, ProcfsParams};
use ktop::Result;

struct QuietJournal;

impl EventLog for QuietJournal {
    fn query(&mut self, _source: OomSource) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

struct SteadyNet(u64);

impl NetCounterSource for SteadyNet {
    fn read(&mut self) -> NetCounters {
        self.0 += 4096;
        NetCounters {
            sent: self.0,
            received: self.0 * 2,
        }
    }
}

fn fixture() -> Arc<MockFs> {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/proc/meminfo", "MemTotal:       4000000 kB\n");
    fs.add_process("/proc", 1, "init", 5, 300, 100);
    fs.add_process("/proc", 500, "render", 100, 90000, 2000);
    fs.add_file("/sys/class/hwmon/hwmon0/name", "k10temp\n");
    fs.add_file("/sys/class/hwmon/hwmon0/temp1_input", "64000\n");
    fs
}

fn sources(fs: Arc<MockFs>) -> SamplerSources {
    SamplerSources {
        fs,
        proc_root: PathBuf::from("/proc"),
        hwmon_root: PathBuf::from("/sys/class/hwmon"),
        procfs_params: ProcfsParams::default(),
        gpu_providers: Vec::new(),
        net_source: Box::new(SteadyNet(0)),
        event_log: Box::new(QuietJournal),
    }
}

#[test]
fn test_ticks_assemble_full_snapshot() {
    let fs = fixture();
    let config = MonitorConfig {
        top_processes: 1,
        ..MonitorConfig::default()
    };
    let mut sampler = ClockedSampler::with_sources(config, sources(fs.clone())).unwrap();
    let t0 = Instant::now();

    sampler.tick_at(t0);
    fs.add_process("/proc", 1, "init", 55, 300, 100);
    let snapshot = sampler.tick_at(t0 + Duration::from_secs(1)).clone();

    assert_eq!(snapshot.procs_by_cpu.len(), 1);
    assert_eq!(snapshot.procs_by_mem.len(), 1);
    assert_eq!(snapshot.procs_by_mem[0].pid, 500);
    assert_eq!(snapshot.thermal.cpu.as_ref().map(|t| t.current_c), Some(64.0));
    assert!(snapshot.net.rate_down >= snapshot.net.rate_up);
    assert_eq!(snapshot.cpu.history.len(), 2);
    assert!(snapshot.gpus.is_empty());
    assert!(snapshot.oom.is_none());

    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("procs_by_cpu"));
}

#[test]
fn test_redraw_and_quit() {
    let mut sampler =
        ClockedSampler::with_sources(MonitorConfig::default(), sources(fixture())).unwrap();

    assert!(sampler.handle(SamplerCommand::Redraw));
    assert_eq!(sampler.latest().cpu.history.len(), 1);

    assert!(!sampler.handle(SamplerCommand::Quit));
    assert!(sampler.is_stopped());
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = MonitorConfig {
        refresh_ms: 0,
        ..MonitorConfig::default()
    };
    assert!(ClockedSampler::with_sources(config, sources(fixture())).is_err());
}
