//! Parsers for the `/proc` files the process scanner reads.
//!
//! Pure functions over file contents, so they are tested with string inputs.

use crate::error::{KtopError, Result};

const DEFAULT_CLOCK_TICKS: u64 = 100;
const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Fields of `/proc/<pid>/stat` the scanner needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    /// utime + stime, in clock ticks
    pub cpu_ticks: u64,
    pub rss_pages: u64,
}

/// Kernel constants used to turn raw counters into seconds and bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcfsParams {
    pub clock_ticks_per_sec: u64,
    pub page_size: u64,
}

impl Default for ProcfsParams {
    fn default() -> Self {
        Self {
            clock_ticks_per_sec: DEFAULT_CLOCK_TICKS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProcfsParams {
    /// Query `sysconf` for the tick rate and page size.
    #[cfg(unix)]
    pub fn detect() -> Self {
        // SAFETY: sysconf has no preconditions and only reads its argument.
        let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

        Self {
            clock_ticks_per_sec: if ticks > 0 {
                ticks as u64
            } else {
                DEFAULT_CLOCK_TICKS
            },
            page_size: if page > 0 {
                page as u64
            } else {
                DEFAULT_PAGE_SIZE
            },
        }
    }

    #[cfg(not(unix))]
    pub fn detect() -> Self {
        Self::default()
    }
}

/// Parses `/proc/<pid>/stat`.
///
/// The comm field may contain spaces and parentheses, so it is delimited by
/// the first `(` and the last `)`.
pub fn parse_proc_stat(content: &str) -> Result<ProcStat> {
    let content = content.trim();

    let open_paren = content
        .find('(')
        .ok_or_else(|| KtopError::parse("stat", "missing '('"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| KtopError::parse("stat", "missing ')'"))?;

    if close_paren <= open_paren {
        return Err(KtopError::parse("stat", "invalid parentheses"));
    }

    let pid: u32 = content[..open_paren]
        .trim()
        .parse()
        .map_err(|_| KtopError::parse("stat", "invalid pid"))?;

    let comm = content[open_paren + 1..close_paren].to_string();

    // Index 0 is the state field (field 3 in proc(5)).
    let fields: Vec<&str> = content[close_paren + 1..].split_whitespace().collect();
    if fields.len() < 22 {
        return Err(KtopError::parse(
            "stat",
            format!("expected 22+ fields after comm, got {}", fields.len()),
        ));
    }

    let field_u64 = |idx: usize, name: &str| -> Result<u64> {
        fields[idx]
            .parse::<u64>()
            .map_err(|_| KtopError::parse("stat", format!("invalid {}", name)))
    };

    let utime = field_u64(11, "utime")?;
    let stime = field_u64(12, "stime")?;
    // rss is signed in the kernel; a negative value only shows up for
    // exiting processes.
    let rss_pages = fields[21].parse::<i64>().unwrap_or(0).max(0) as u64;

    Ok(ProcStat {
        pid,
        comm,
        cpu_ticks: utime.saturating_add(stime),
        rss_pages,
    })
}

/// Returns the shared page count (third field) of `/proc/<pid>/statm`.
pub fn parse_statm_shared(content: &str) -> Result<u64> {
    content
        .split_whitespace()
        .nth(2)
        .ok_or_else(|| KtopError::parse("statm", "missing shared field"))?
        .parse()
        .map_err(|_| KtopError::parse("statm", "invalid shared field"))
}

/// Returns `MemTotal` from `/proc/meminfo`, in bytes.
pub fn parse_meminfo_total(content: &str) -> Result<u64> {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            let kib: u64 = rest
                .split_whitespace()
                .next()
                .ok_or_else(|| KtopError::parse("meminfo", "empty MemTotal"))?
                .parse()
                .map_err(|_| KtopError::parse("meminfo", "invalid MemTotal"))?;
            return Ok(kib * 1024);
        }
    }
    Err(KtopError::parse("meminfo", "MemTotal not found"))
}

/// `/proc` entries that name a process: purely numeric directory names.
pub fn pid_from_file_name(name: &str) -> Option<u32> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}
