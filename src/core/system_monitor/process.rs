//! Per-process CPU attribution from raw `/proc` tick counters.
//!
//! Each full scan diffs the cumulative utime+stime of every pid against the
//! value stored by the previous scan, so the result is the average load over
//! the scan interval rather than a since-boot average.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{KtopError, Result};
use crate::platform::fs::FileSystem;
use crate::platform::procfs::{
    parse_meminfo_total, parse_proc_stat, parse_statm_shared, pid_from_file_name, ProcfsParams,
};

use super::metrics::ProcessRecord;

/// Top-N lists produced by one full scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessRanking {
    pub by_cpu: Vec<ProcessRecord>,
    pub by_mem: Vec<ProcessRecord>,
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub proc_root: PathBuf,
    pub params: ProcfsParams,
    pub top_n: usize,
    pub first_interval: Duration,
    pub interval: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            params: ProcfsParams::detect(),
            top_n: 10,
            first_interval: Duration::from_secs(1),
            interval: Duration::from_secs(3),
        }
    }
}

pub struct ProcessScanner {
    fs: Arc<dyn FileSystem>,
    config: ScannerConfig,
    /// pid -> cumulative ticks at the last full scan
    baselines: HashMap<u32, u64>,
    last_scan: Option<Instant>,
    scans: u64,
    mem_total: u64,
    ranking: ProcessRanking,
}

impl ProcessScanner {
    pub fn new(fs: Arc<dyn FileSystem>, config: ScannerConfig) -> Self {
        Self {
            fs,
            config,
            baselines: HashMap::new(),
            last_scan: None,
            scans: 0,
            mem_total: 0,
            ranking: ProcessRanking::default(),
        }
    }

    /// Seed every baseline. Fails only if the process table can't be listed.
    pub fn prime(&mut self, now: Instant) -> Result<()> {
        let entries = self.list_pids().map_err(|e| {
            KtopError::process_table(format!(
                "cannot list {}: {}",
                self.config.proc_root.display(),
                e
            ))
        })?;
        self.full_scan(entries, now);
        Ok(())
    }

    pub fn scan(&mut self) -> &ProcessRanking {
        self.scan_at(Instant::now())
    }

    /// Run a full scan if the throttle interval has elapsed, otherwise return
    /// the previous ranking unchanged.
    pub fn scan_at(&mut self, now: Instant) -> &ProcessRanking {
        if !self.is_due(now) {
            return &self.ranking;
        }

        match self.list_pids() {
            Ok(entries) => self.full_scan(entries, now),
            Err(e) => log::debug!("Process table listing failed, keeping last ranking: {}", e),
        }
        &self.ranking
    }

    pub fn ranking(&self) -> &ProcessRanking {
        &self.ranking
    }

    /// Number of pids currently holding a baseline
    pub fn tracked_pids(&self) -> usize {
        self.baselines.len()
    }

    fn is_due(&self, now: Instant) -> bool {
        match self.last_scan {
            None => true,
            Some(prev) => {
                let min = if self.scans <= 1 {
                    self.config.first_interval
                } else {
                    self.config.interval
                };
                now.saturating_duration_since(prev) >= min
            }
        }
    }

    fn list_pids(&self) -> std::io::Result<Vec<(u32, PathBuf)>> {
        let entries = self.fs.read_dir(&self.config.proc_root)?;
        Ok(entries
            .into_iter()
            .filter_map(|path| {
                let pid = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(pid_from_file_name)?;
                Some((pid, path))
            })
            .collect())
    }

    fn full_scan(&mut self, entries: Vec<(u32, PathBuf)>, now: Instant) {
        let elapsed = self
            .last_scan
            .map(|prev| now.saturating_duration_since(prev).as_secs_f64());
        let hz = self.config.params.clock_ticks_per_sec.max(1) as f64;
        let page_size = self.config.params.page_size;

        if let Ok(content) = self
            .fs
            .read_to_string(&self.config.proc_root.join("meminfo"))
        {
            match parse_meminfo_total(&content) {
                Ok(total) => self.mem_total = total,
                Err(e) => log::debug!("{}", e),
            }
        }

        let mut next_baselines = HashMap::with_capacity(entries.len());
        let mut records = Vec::with_capacity(entries.len());

        for (pid, dir) in entries {
            // The process may have exited since the listing.
            let Ok(content) = self.fs.read_to_string(&dir.join("stat")) else {
                continue;
            };
            let stat = match parse_proc_stat(&content) {
                Ok(stat) => stat,
                Err(e) => {
                    log::debug!("Skipping pid {}: {}", pid, e);
                    continue;
                }
            };

            let cpu_pct = match (self.baselines.get(&pid), elapsed) {
                (Some(&prev), Some(dt)) if dt > 0.0 => {
                    let delta = stat.cpu_ticks.saturating_sub(prev) as f64;
                    (delta / hz) / dt * 100.0
                }
                _ => 0.0,
            };

            let rss_bytes = stat.rss_pages.saturating_mul(page_size);
            let mem_pct = if self.mem_total > 0 {
                rss_bytes as f64 / self.mem_total as f64 * 100.0
            } else {
                0.0
            };

            next_baselines.insert(pid, stat.cpu_ticks);
            records.push(ProcessRecord {
                pid,
                name: stat.comm,
                cpu_ticks: stat.cpu_ticks,
                rss_bytes,
                shared_bytes: None,
                cpu_pct,
                mem_pct,
            });
        }

        self.baselines = next_baselines;
        self.last_scan = Some(now);
        self.scans += 1;
        self.ranking = self.rank(records);
    }

    fn rank(&self, mut records: Vec<ProcessRecord>) -> ProcessRanking {
        let top_n = self.config.top_n;

        records.sort_by(|a, b| b.cpu_pct.total_cmp(&a.cpu_pct).then(a.pid.cmp(&b.pid)));
        let mut by_cpu: Vec<ProcessRecord> = records.iter().take(top_n).cloned().collect();

        records.sort_by(|a, b| b.rss_bytes.cmp(&a.rss_bytes).then(a.pid.cmp(&b.pid)));
        records.truncate(top_n);
        let mut by_mem = records;

        // Extended fields only for pids that made either list.
        let ranked: HashSet<u32> = by_cpu.iter().chain(by_mem.iter()).map(|p| p.pid).collect();
        let shared: HashMap<u32, u64> = ranked
            .into_iter()
            .filter_map(|pid| Some((pid, self.read_shared(pid)?)))
            .collect();

        for record in by_cpu.iter_mut().chain(by_mem.iter_mut()) {
            record.shared_bytes = shared.get(&record.pid).copied();
        }

        ProcessRanking { by_cpu, by_mem }
    }

    fn read_shared(&self, pid: u32) -> Option<u64> {
        let path = self.config.proc_root.join(pid.to_string()).join("statm");
        let content = self.fs.read_to_string(&path).ok()?;
        let pages = parse_statm_shared(&content).ok()?;
        Some(pages.saturating_mul(self.config.params.page_size))
    }
}
