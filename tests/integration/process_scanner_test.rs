// ProcessScanner scenarios against an in-memory /proc

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ktop::core::system_monitor::{ProcessScanner, ScannerConfig};
use ktop::platform::{MockFs, ProcfsParams};

fn scanner(fs: Arc<MockFs>, top_n: usize) -> ProcessScanner {
    ProcessScanner::new(
        fs,
        ScannerConfig {
            proc_root: PathBuf::from("/proc"),
            params: ProcfsParams {
                clock_ticks_per_sec: 100,
                page_size: 4096,
            },
            top_n,
            first_interval: Duration::from_secs(1),
            interval: Duration::from_secs(3),
        },
    )
}

fn base_fs() -> Arc<MockFs> {
    let fs = Arc::new(MockFs::new());
    fs.add_file("/proc/meminfo", "MemTotal:        8000000 kB\nMemFree:  1 kB\n");
    fs
}

#[test]
fn test_busy_and_idle_process() {
    let fs = base_fs();
    fs.add_process("/proc", 101, "trainer", 100, 2000, 100);
    fs.add_process("/proc", 202, "idle", 50, 500, 10);

    let mut scanner = scanner(fs.clone(), 10);
    let t0 = Instant::now();
    scanner.prime(t0).unwrap();

    fs.add_process("/proc", 101, "trainer", 140, 2000, 100);
    let ranking = scanner.scan_at(t0 + Duration::from_secs(1)).clone();

    assert_eq!(ranking.by_cpu[0].pid, 101);
    assert!((ranking.by_cpu[0].cpu_pct - 40.0).abs() < 1e-9);
    assert_eq!(ranking.by_cpu[1].pid, 202);
    assert_eq!(ranking.by_cpu[1].cpu_pct, 0.0);

    assert_eq!(ranking.by_mem[0].pid, 101);
    assert_eq!(ranking.by_mem[0].rss_bytes, 2000 * 4096);
    assert_eq!(ranking.by_mem[0].shared_bytes, Some(100 * 4096));
}

#[test]
fn test_identical_counters_give_identical_order() {
    let fs = base_fs();
    for pid in 1..=20u32 {
        fs.add_process("/proc", pid, &format!("p{}", pid), 1000, (pid as u64 % 4) * 100, 1);
    }

    let mut scanner = scanner(fs.clone(), 5);
    let t0 = Instant::now();
    scanner.prime(t0).unwrap();

    let first = scanner.scan_at(t0 + Duration::from_secs(1)).clone();
    let second = scanner.scan_at(t0 + Duration::from_secs(4)).clone();

    let pids = |records: &[ktop::core::system_monitor::ProcessRecord]| {
        records.iter().map(|r| r.pid).collect::<Vec<_>>()
    };
    assert_eq!(pids(&first.by_cpu), pids(&second.by_cpu));
    assert_eq!(pids(&first.by_mem), pids(&second.by_mem));
    assert_eq!(first.by_cpu.len(), 5);
    assert!(first.by_cpu.iter().all(|r| r.cpu_pct >= 0.0));
}

#[test]
fn test_vanished_process_is_skipped() {
    let fs = base_fs();
    fs.add_process("/proc", 10, "short", 10, 10, 1);
    fs.add_process("/proc", 11, "long", 10, 10, 1);

    let mut scanner = scanner(fs.clone(), 10);
    let t0 = Instant::now();
    scanner.prime(t0).unwrap();
    assert_eq!(scanner.tracked_pids(), 2);

    fs.remove("/proc/10");
    let ranking = scanner.scan_at(t0 + Duration::from_secs(1)).clone();
    assert_eq!(ranking.by_cpu.len(), 1);
    assert_eq!(scanner.tracked_pids(), 1);
}

#[test]
fn test_comm_with_spaces_and_parens() {
    let fs = base_fs();
    fs.add_process("/proc", 77, "Web Content (x)", 10, 10, 1);

    let mut scanner = scanner(fs, 10);
    scanner.prime(Instant::now()).unwrap();
    assert_eq!(scanner.ranking().by_cpu[0].name, "Web Content (x)");
}
