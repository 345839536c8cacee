//! System-wide values read from the /proc filesystem.
//!
//! Uptime, boot time and total memory are needed to turn per-process
//! counters into percentages and absolute timestamps.

use std::fs;
use std::path::Path;

use crate::error::ProbeError;

fn read(path: &Path) -> Result<String, ProbeError> {
    fs::read_to_string(path).map_err(|e| ProbeError::io(path.display().to_string(), e))
}

/// Reads system uptime from `<root>/uptime`.
///
/// Returns uptime in seconds.
/// Format: "<uptime_seconds> <idle_seconds>"
pub fn read_uptime(root: &Path) -> Result<f64, ProbeError> {
    let path = root.join("uptime");
    let content = read(&path)?;
    parse_uptime(&content).ok_or_else(|| ProbeError::parse("uptime", path.display().to_string()))
}

pub fn parse_uptime(content: &str) -> Option<f64> {
    content.split_whitespace().next()?.parse().ok()
}

/// Reads the boot time (`btime`, seconds since the epoch) from `<root>/stat`.
pub fn read_boot_time(root: &Path) -> Result<u64, ProbeError> {
    let path = root.join("stat");
    let content = read(&path)?;
    parse_boot_time(&content).ok_or_else(|| ProbeError::missing("btime", path.display().to_string()))
}

pub fn parse_boot_time(content: &str) -> Option<u64> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("btime "))
        .and_then(|v| v.trim().parse().ok())
}

/// Reads `MemTotal` from `<root>/meminfo`, in bytes.
pub fn read_mem_total(root: &Path) -> Result<u64, ProbeError> {
    let path = root.join("meminfo");
    let content = read(&path)?;
    parse_mem_total(&content).ok_or_else(|| ProbeError::missing("MemTotal", path.display().to_string()))
}

pub fn parse_mem_total(content: &str) -> Option<u64> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("MemTotal:"))
        .and_then(|v| v.split_whitespace().next())
        .and_then(|kb| kb.parse::<u64>().ok())
        .and_then(|kb| kb.checked_mul(1024))
}

/// Reads the system-wide POSIX/flock lock table (`<root>/locks`).
pub fn read_locks(root: &Path) -> Result<String, ProbeError> {
    read(&root.join("locks"))
}

/// Host name of this machine, if it can be determined.
pub fn host_name() -> Option<String> {
    nix::unistd::gethostname()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
}
