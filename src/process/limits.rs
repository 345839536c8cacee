//! Resource limits from `/proc/<pid>/limits` and their metric mapping.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

use crate::error::ProbeError;

/// Linux resource limit kinds, in `getrlimit(2)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Cpu,
    FileSize,
    Data,
    Stack,
    Core,
    Rss,
    Nproc,
    NoFile,
    MemLock,
    AddressSpace,
    Locks,
    SigPending,
    MsgQueue,
    Nice,
    RtPrio,
    RtTime,
}

/// How a resource limit kind is exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RlimitSpec {
    pub field_name: &'static str,
    pub units: &'static str,
    /// Whether a separate "used" point is meaningful for this kind.
    pub emit_used: bool,
}

const fn spec(field_name: &'static str, units: &'static str, emit_used: bool) -> RlimitSpec {
    RlimitSpec {
        field_name,
        units,
        emit_used,
    }
}

impl ResourceKind {
    /// Maps the row label used in `/proc/<pid>/limits`.
    pub fn from_limits_label(label: &str) -> Option<Self> {
        let kind = match label {
            "Max cpu time" => ResourceKind::Cpu,
            "Max file size" => ResourceKind::FileSize,
            "Max data size" => ResourceKind::Data,
            "Max stack size" => ResourceKind::Stack,
            "Max core file size" => ResourceKind::Core,
            "Max resident set" => ResourceKind::Rss,
            "Max processes" => ResourceKind::Nproc,
            "Max open files" => ResourceKind::NoFile,
            "Max locked memory" => ResourceKind::MemLock,
            "Max address space" => ResourceKind::AddressSpace,
            "Max file locks" => ResourceKind::Locks,
            "Max pending signals" => ResourceKind::SigPending,
            "Max msgqueue size" => ResourceKind::MsgQueue,
            "Max nice priority" => ResourceKind::Nice,
            "Max realtime priority" => ResourceKind::RtPrio,
            "Max realtime timeout" => ResourceKind::RtTime,
            _ => return None,
        };
        Some(kind)
    }

    /// Export mapping; kinds without one are not reported.
    pub fn metric_spec(self) -> Option<RlimitSpec> {
        match self {
            ResourceKind::Cpu => Some(spec("cpu_time", "seconds", true)),
            ResourceKind::Data => Some(spec("memory_data", "bytes", false)),
            ResourceKind::Stack => Some(spec("memory_stack", "bytes", false)),
            ResourceKind::Rss => Some(spec("memory_rss", "bytes", false)),
            ResourceKind::NoFile => Some(spec("num_fds", "count", false)),
            ResourceKind::MemLock => Some(spec("memory_locked", "bytes", false)),
            ResourceKind::AddressSpace => Some(spec("memory_vms", "bytes", false)),
            ResourceKind::Locks => Some(spec("file_locks", "count", true)),
            ResourceKind::SigPending => Some(spec("signals_pending", "count", true)),
            ResourceKind::Nice => Some(spec("nice_priority", "none", true)),
            ResourceKind::RtPrio => Some(spec("realtime_priority", "none", true)),
            ResourceKind::FileSize
            | ResourceKind::Core
            | ResourceKind::Nproc
            | ResourceKind::MsgQueue
            | ResourceKind::RtTime => None,
        }
    }
}

/// A soft or hard limit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitValue {
    Limited(u64),
    Unlimited,
}

impl LimitValue {
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("unlimited") {
            return Some(LimitValue::Unlimited);
        }
        s.parse().ok().map(LimitValue::Limited)
    }

    /// Gauge value; unlimited is exported as -1 (RLIM_INFINITY as a signed value).
    pub fn as_f64(self) -> f64 {
        match self {
            LimitValue::Limited(v) => v as f64,
            LimitValue::Unlimited => -1.0,
        }
    }
}

/// One resource limit of a process with its current usage, if known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceLimit {
    pub kind: ResourceKind,
    pub soft: LimitValue,
    pub hard: LimitValue,
    pub used: Option<f64>,
}

// Columns are padded with at least two spaces; row labels only use single ones.
static LIMITS_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Max [a-z ]+?)\s{2,}(\S+)\s+(\S+)").expect("limits row regex is valid")
});

/// Parses the content of a limits file. Unknown rows are skipped.
pub fn parse_limits(content: &str) -> Vec<ResourceLimit> {
    content
        .lines()
        .filter_map(|line| {
            let caps = LIMITS_ROW.captures(line)?;
            Some(ResourceLimit {
                kind: ResourceKind::from_limits_label(caps.get(1)?.as_str())?,
                soft: LimitValue::parse(caps.get(2)?.as_str())?,
                hard: LimitValue::parse(caps.get(3)?.as_str())?,
                used: None,
            })
        })
        .collect()
}

/// Reads and parses `<proc_path>/limits`.
pub fn read_limits(proc_path: &Path) -> Result<Vec<ResourceLimit>, ProbeError> {
    let path = proc_path.join("limits");
    let content = fs::read_to_string(&path).map_err(|e| ProbeError::io(path.display().to_string(), e))?;
    let limits = parse_limits(&content);
    if limits.is_empty() {
        return Err(ProbeError::parse("limit rows", path.display().to_string()));
    }
    Ok(limits)
}

/// Counts entries in a `/proc/locks` table held by `pid`.
///
/// Rows look like `1: POSIX  ADVISORY  WRITE 1234 08:01:5678 0 EOF`; blocked
/// waiters carry an extra `->` token after the index.
pub fn count_file_locks(locks: &str, pid: u32) -> u64 {
    let pid = pid.to_string();
    locks
        .lines()
        .filter(|line| {
            line.split_whitespace()
                .filter(|t| *t != "->")
                .nth(4)
                .is_some_and(|t| t == pid)
        })
        .count() as u64
}
