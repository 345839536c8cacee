//! `/proc/<pid>/stat` parsing.
//!
//! Provides the process state character, CPU times, page fault counters,
//! scheduling priorities and the start time in clock ticks after boot.

use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;

use crate::error::ProbeError;

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> f64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_CLK_TCK
        // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
        unsafe {
            let tck = libc::sysconf(libc::_SC_CLK_TCK);
            if tck > 0 {
                return tck as f64;
            }
        }
    }
    100.0
}

/// System clock ticks per second (for CPU time calculation).
pub static CLK_TCK: Lazy<f64> = Lazy::new(get_clk_tck);

/// Fields of interest from one `/proc/<pid>/stat` line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcStat {
    pub state: char,
    pub minflt: u64,
    pub cminflt: u64,
    pub majflt: u64,
    pub cmajflt: u64,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
    pub nice: i64,
    pub starttime_ticks: u64,
    /// Missing on very old kernels.
    pub rt_priority: Option<u64>,
}

impl ProcStat {
    /// Total CPU time (user + system) in seconds.
    pub fn cpu_time_seconds(&self) -> f64 {
        (self.utime_ticks + self.stime_ticks) as f64 / *CLK_TCK
    }

    /// Process start in seconds since boot.
    pub fn start_seconds_since_boot(&self) -> f64 {
        self.starttime_ticks as f64 / *CLK_TCK
    }
}

/// Parses the content of a stat file.
///
/// The command name is wrapped in parentheses and may itself contain spaces
/// or parentheses, so fields are counted from the last `)`.
pub fn parse_stat(content: &str) -> Option<ProcStat> {
    let close = content.rfind(')')?;
    let fields: Vec<&str> = content[close + 1..].split_whitespace().collect();
    // fields[0] is field 3 (state) in proc(5) numbering
    if fields.len() < 20 {
        return None;
    }
    let num = |i: usize| fields[i].parse::<u64>().ok();

    Some(ProcStat {
        state: fields[0].chars().next()?,
        minflt: num(7)?,
        cminflt: num(8)?,
        majflt: num(9)?,
        cmajflt: num(10)?,
        utime_ticks: num(11)?,
        stime_ticks: num(12)?,
        nice: fields[16].parse().ok()?,
        starttime_ticks: num(19)?,
        rt_priority: fields.get(37).and_then(|v| v.parse().ok()),
    })
}

/// Reads and parses `<proc_path>/stat`.
pub fn read_stat(proc_path: &Path) -> Result<ProcStat, ProbeError> {
    let stat_path = proc_path.join("stat");
    let content =
        fs::read_to_string(&stat_path).map_err(|e| ProbeError::io(stat_path.display().to_string(), e))?;
    parse_stat(&content).ok_or_else(|| ProbeError::parse("stat fields", stat_path.display().to_string()))
}

/// Parse total CPU time (user+system) in seconds from /proc/<pid>/stat.
pub fn parse_cpu_time_seconds(proc_path: &Path) -> Result<f64, ProbeError> {
    Ok(read_stat(proc_path)?.cpu_time_seconds())
}
