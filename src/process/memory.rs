//! Memory, thread and context-switch parsing from `/proc/<pid>/status`.
//!
//! All `Vm*` values in status are reported in kB and converted to bytes here.
//! Kernel threads carry no `Vm*` lines at all, which surfaces as a
//! [`ProbeError::Missing`] rather than a zero.

use std::fs;
use std::path::Path;

use crate::error::ProbeError;

/// Memory breakdown of a process, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub rss: u64,
    pub vms: u64,
    pub swap: Option<u64>,
    pub data: Option<u64>,
    pub stack: Option<u64>,
    pub locked: Option<u64>,
}

/// Voluntary / involuntary context switch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextSwitches {
    pub voluntary: u64,
    pub involuntary: u64,
}

/// Parses kilobyte values from status file lines.
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Returns the raw value following `key` (e.g. `"VmRSS:"`) in a status file.
pub fn status_value<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    content
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .map(str::trim)
}

fn status_kb_bytes(content: &str, key: &str) -> Option<u64> {
    status_value(content, key)
        .and_then(parse_kb_value)
        .and_then(|kb| kb.checked_mul(1024))
}

fn status_u64(content: &str, key: &str) -> Option<u64> {
    status_value(content, key).and_then(|v| v.parse().ok())
}

/// Reads `<proc_path>/status` into a string.
pub fn read_status(proc_path: &Path) -> Result<String, ProbeError> {
    let path = proc_path.join("status");
    fs::read_to_string(&path).map_err(|e| ProbeError::io(path.display().to_string(), e))
}

/// Extracts the memory breakdown. RSS and VMS are required, the rest are
/// reported when the kernel provides them.
pub fn parse_memory_info(content: &str, path: &str) -> Result<MemoryInfo, ProbeError> {
    let rss = status_kb_bytes(content, "VmRSS:").ok_or_else(|| ProbeError::missing("VmRSS", path))?;
    let vms = status_kb_bytes(content, "VmSize:").ok_or_else(|| ProbeError::missing("VmSize", path))?;

    Ok(MemoryInfo {
        rss,
        vms,
        swap: status_kb_bytes(content, "VmSwap:"),
        data: status_kb_bytes(content, "VmData:"),
        stack: status_kb_bytes(content, "VmStk:"),
        locked: status_kb_bytes(content, "VmLck:"),
    })
}

pub fn parse_num_threads(content: &str, path: &str) -> Result<u64, ProbeError> {
    status_u64(content, "Threads:").ok_or_else(|| ProbeError::missing("Threads", path))
}

pub fn parse_context_switches(content: &str, path: &str) -> Result<ContextSwitches, ProbeError> {
    let voluntary = status_u64(content, "voluntary_ctxt_switches:")
        .ok_or_else(|| ProbeError::missing("voluntary_ctxt_switches", path))?;
    let involuntary = status_u64(content, "nonvoluntary_ctxt_switches:")
        .ok_or_else(|| ProbeError::missing("nonvoluntary_ctxt_switches", path))?;
    Ok(ContextSwitches {
        voluntary,
        involuntary,
    })
}

/// Number of signals currently queued for the real user id (first half of `SigQ: n/limit`).
pub fn parse_queued_signals(content: &str, path: &str) -> Result<u64, ProbeError> {
    status_value(content, "SigQ:")
        .and_then(|v| v.split('/').next())
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| ProbeError::missing("SigQ", path))
}
