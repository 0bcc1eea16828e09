//! Recent out-of-memory kills from the system journal.
//!
//! Two sources are consulted: the kernel OOM killer and `systemd-oomd`. The
//! most recent kill from either one is reported.

use std::io::Read;
use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset};
use regex::Regex;

use crate::error::{KtopError, Result};

use super::metrics::{OomEvent, OomSource};

/// Runs one journal query and returns its raw output lines
pub trait EventLog: Send {
    fn query(&mut self, source: OomSource) -> Result<Vec<String>>;
}

/// `journalctl` with a bounded run time
pub struct Journalctl {
    window_hours: u64,
    timeout: Duration,
}

impl Journalctl {
    pub fn new(window: Duration, timeout: Duration) -> Self {
        Self {
            window_hours: (window.as_secs() / 3600).max(1),
            timeout,
        }
    }

    fn args(&self, source: OomSource) -> Vec<String> {
        let since = format!("-{}h", self.window_hours);
        let (scope, pattern): (&[&str], &str) = match source {
            OomSource::Kernel => (&["-k"], "Out of memory: Killed process"),
            OomSource::Daemon => (&["-u", "systemd-oomd"], "Killed"),
        };

        scope
            .iter()
            .map(|s| s.to_string())
            .chain([
                "--since".to_string(),
                since,
                "-o".to_string(),
                "short-iso".to_string(),
                "--no-pager".to_string(),
                "-g".to_string(),
                pattern.to_string(),
            ])
            .collect()
    }
}

impl EventLog for Journalctl {
    fn query(&mut self, source: OomSource) -> Result<Vec<String>> {
        let mut child = Command::new("journalctl")
            .args(self.args(source))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| KtopError::event_log(format!("failed to run journalctl: {}", e)))?;

        // Drain stdout on a side thread so a chatty journal can't fill the
        // pipe while we wait.
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| KtopError::event_log("journalctl stdout not captured"))?;
        let reader = std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = stdout.read_to_string(&mut buf);
            buf
        });

        let status = wait_with_deadline(&mut child, Instant::now() + self.timeout)?
            .ok_or_else(|| {
                KtopError::event_log(format!("journalctl timed out after {:?}", self.timeout))
            })?;

        let output = reader
            .join()
            .map_err(|_| KtopError::event_log("journalctl reader panicked"))?;

        // journalctl exits 1 when -g matched nothing
        if !status.success() {
            return Err(KtopError::event_log(format!("journalctl exited with {}", status)));
        }

        Ok(output.lines().map(str::to_string).collect())
    }
}

/// The parts of a child process the deadline wait needs
trait Reapable {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>>;
    fn kill(&mut self) -> io::Result<()>;
    fn wait(&mut self) -> io::Result<ExitStatus>;
}

impl Reapable for Child {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Child::try_wait(self)
    }

    fn kill(&mut self) -> io::Result<()> {
        Child::kill(self)
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        Child::wait(self)
    }
}

/// Poll until the child exits. Returns `Ok(None)` on timeout.
///
/// The child is killed and reaped on timeout and on a failed poll.
fn wait_with_deadline<C: Reapable>(
    child: &mut C,
    deadline: Instant,
) -> Result<Option<ExitStatus>> {
    loop {
        let polled = match child.try_wait() {
            Ok(polled) => polled,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        };
        match polled {
            Some(status) => return Ok(Some(status)),
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            None => std::thread::sleep(Duration::from_millis(20)),
        }
    }
}

pub struct EventWatcher {
    log: Box<dyn EventLog>,
    parser: OomLineParser,
    interval: Duration,
    last_check: Option<Instant>,
    latest: Option<OomEvent>,
}

impl EventWatcher {
    pub fn new(log: Box<dyn EventLog>, interval: Duration) -> Result<Self> {
        Ok(Self {
            log,
            parser: OomLineParser::new()?,
            interval,
            last_check: None,
            latest: None,
        })
    }

    pub fn check(&mut self) -> Option<OomEvent> {
        self.check_at(Instant::now())
    }

    /// Query both sources at most once per interval and return the most
    /// recent kill; between queries the cached answer is returned.
    pub fn check_at(&mut self, now: Instant) -> Option<OomEvent> {
        let due = self
            .last_check
            .map_or(true, |prev| now.saturating_duration_since(prev) >= self.interval);
        if !due {
            return self.latest.clone();
        }
        self.last_check = Some(now);

        let kernel = self.last_event(OomSource::Kernel);
        let daemon = self.last_event(OomSource::Daemon);

        self.latest = match (kernel, daemon) {
            (Some(k), Some(d)) => Some(if d.timestamp > k.timestamp { d } else { k }),
            (k, d) => k.or(d),
        };
        self.latest.clone()
    }

    fn last_event(&mut self, source: OomSource) -> Option<OomEvent> {
        let lines = match self.log.query(source) {
            Ok(lines) => lines,
            Err(e) => {
                log::debug!("{:?} OOM query: {}", source, e);
                return None;
            }
        };

        lines
            .iter()
            .rev()
            .map(|line| line.trim())
            .find(|line| !line.is_empty() && !line.starts_with("--"))
            .and_then(|line| self.parser.parse(line, source))
    }
}

/// Compiled patterns for `short-iso` journal lines
pub struct OomLineParser {
    timestamp: Regex,
    kernel: Regex,
    daemon: Regex,
}

impl OomLineParser {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| KtopError::parse("journal pattern", e.to_string()))
        };
        Ok(Self {
            timestamp: compile(
                r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:[.,]\d+)?(?:Z|[+-]\d{2}:?\d{2}))",
            )?,
            kernel: compile(r"Killed process \d+ \(([^)]+)\)")?,
            daemon: compile(r"Killed (\S+)")?,
        })
    }

    /// Leading timestamp of a journal line
    pub fn timestamp(&self, line: &str) -> Option<DateTime<FixedOffset>> {
        let raw = self.timestamp.captures(line)?.get(1)?.as_str().replace(',', ".");
        DateTime::parse_from_rfc3339(&raw)
            .or_else(|_| DateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
            .ok()
    }

    /// Turn one journal line into an event, or `None` if it doesn't match
    pub fn parse(&self, line: &str, source: OomSource) -> Option<OomEvent> {
        let timestamp = self.timestamp(line)?;
        let target = match source {
            OomSource::Kernel => self.kernel.captures(line)?.get(1)?.as_str().to_string(),
            OomSource::Daemon => clean_scope_name(self.daemon.captures(line)?.get(1)?.as_str()),
        };
        if target.is_empty() {
            return None;
        }

        Some(OomEvent {
            timestamp,
            target,
            source,
        })
    }
}

const UNIT_SUFFIXES: &[&str] = &[".scope", ".service", ".slice"];
const LAUNCHER_PREFIXES: &[&str] = &["gnome-", "kde-", "flatpak-"];

/// Reduce a control-group path to a readable application name.
///
/// `/user.slice/.../app-gnome-firefox-12345.scope` becomes `firefox`.
pub fn clean_scope_name(cgroup: &str) -> String {
    let last = cgroup
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(cgroup);

    let mut name = last;
    for suffix in UNIT_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped;
            break;
        }
    }
    if let Some(stripped) = name.strip_prefix("app-") {
        name = stripped;
    }
    for prefix in LAUNCHER_PREFIXES {
        if let Some(stripped) = name.strip_prefix(prefix) {
            name = stripped;
            break;
        }
    }

    let mut segments: Vec<&str> = name.split('-').collect();
    if segments.len() > UUID_GROUPS.len() && ends_with_uuid(&segments) {
        segments.truncate(segments.len() - UUID_GROUPS.len());
    }
    while segments.len() > 1 && segments.last().is_some_and(|s| is_identifier_segment(s)) {
        segments.pop();
    }
    let cleaned = segments.join("-");

    if cleaned.is_empty() {
        last.to_string()
    } else {
        cleaned
    }
}

const UUID_GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Whether the last five segments have the 8-4-4-4-12 hex shape
fn ends_with_uuid(segments: &[&str]) -> bool {
    let tail = &segments[segments.len().saturating_sub(UUID_GROUPS.len())..];
    tail.len() == UUID_GROUPS.len()
        && tail.iter().zip(UUID_GROUPS).all(|(group, len)| {
            group.len() == len && group.bytes().all(|b| b.is_ascii_hexdigit())
        })
}

/// Pid, instance number or hex id
fn is_identifier_segment(segment: &str) -> bool {
    if segment.is_empty() {
        return true;
    }
    if segment.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    segment.len() >= 4
        && segment.bytes().all(|b| b.is_ascii_hexdigit())
        && segment.bytes().any(|b| b.is_ascii_digit())
}
