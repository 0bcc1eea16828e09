// OOM event detection with canned journal output

use std::time::{Duration, Instant};

use ktop::core::system_monitor::{clean_scope_name, EventLog, EventWatcher, OomSource};
use ktop::{KtopError, Result};

struct CannedJournal {
    kernel: Vec<String>,
    daemon: Vec<String>,
    daemon_fails: bool,
}

impl CannedJournal {
    fn new(kernel: &[&str], daemon: &[&str]) -> Self {
        Self {
            kernel: kernel.iter().map(|s| s.to_string()).collect(),
            daemon: daemon.iter().map(|s| s.to_string()).collect(),
            daemon_fails: false,
        }
    }
}

impl EventLog for CannedJournal {
    fn query(&mut self, source: OomSource) -> Result<Vec<String>> {
        match source {
            OomSource::Kernel => Ok(self.kernel.clone()),
            OomSource::Daemon if self.daemon_fails => {
                Err(KtopError::event_log("journalctl timed out"))
            }
            OomSource::Daemon => Ok(self.daemon.clone()),
        }
    }
}

fn watcher(journal: CannedJournal) -> EventWatcher {
    EventWatcher::new(Box::new(journal), Duration::from_secs(5)).unwrap()
}

const OLD_KERNEL: &str = "2026-10-19T08:00:00+0000 host kernel: Out of memory: Killed process 900 (old) total-vm:1kB";
const NEW_KERNEL: &str = "2026-10-19T11:30:00+0000 host kernel: Out of memory: Killed process 901 (python3) total-vm:1kB";
const DAEMON: &str = "2026-10-19T10:00:00+0000 host systemd-oomd[77]: Killed /user.slice/user-1000.slice/user@1000.service/app.slice/app-org.gnome.Terminal-4821.scope due to memory used";

#[test]
fn test_kernel_later_than_daemon() {
    let mut watcher = watcher(CannedJournal::new(&[OLD_KERNEL, NEW_KERNEL], &[DAEMON]));
    let event = watcher.check_at(Instant::now()).unwrap();

    assert_eq!(event.source, OomSource::Kernel);
    assert_eq!(event.target, "python3");
}

#[test]
fn test_daemon_later_than_kernel() {
    let mut watcher = watcher(CannedJournal::new(&[OLD_KERNEL], &[DAEMON]));
    let event = watcher.check_at(Instant::now()).unwrap();

    assert_eq!(event.source, OomSource::Daemon);
    assert_eq!(event.target, "org.gnome.Terminal");
}

#[test]
fn test_neither_source_has_events() {
    let mut watcher = watcher(CannedJournal::new(&["-- No entries --"], &[]));
    assert!(watcher.check_at(Instant::now()).is_none());
}

#[test]
fn test_failing_source_does_not_hide_the_other() {
    let mut journal = CannedJournal::new(&[OLD_KERNEL], &[DAEMON]);
    journal.daemon_fails = true;
    let mut watcher = watcher(journal);

    assert_eq!(watcher.check_at(Instant::now()).unwrap().target, "old");
}

#[test]
fn test_unparseable_line_is_no_match() {
    let mut watcher = watcher(CannedJournal::new(&["garbage without timestamp"], &[]));
    assert!(watcher.check_at(Instant::now()).is_none());
}

#[test]
fn test_scope_cleanup() {
    assert_eq!(clean_scope_name("app-gnome-code-99999.scope"), "code");
    assert_eq!(clean_scope_name("/user.slice/app.slice/steam.service"), "steam");
    assert_eq!(
        clean_scope_name("app-flatpak-com.spotify.Client-deadbeef1234.scope"),
        "com.spotify.Client"
    );
}
