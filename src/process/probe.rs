//! Per-process stat probes and the optional field bag they fill.
//!
//! Each stat group is queried independently through [`ProcessProbe`]. A
//! failing group leaves its fields as `None` in [`ProcessStats`]; nothing is
//! ever defaulted to zero.

use tracing::debug;

use crate::error::ProbeError;
use crate::process::limits::ResourceLimit;
use crate::process::memory::{ContextSwitches, MemoryInfo};

/// I/O syscall and byte counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoCounters {
    pub read_count: u64,
    pub write_count: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Page fault counters of the process and its waited-for children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageFaults {
    pub major: u64,
    pub minor: u64,
    pub child_major: u64,
    pub child_minor: u64,
}

/// Source of per-process resource statistics, one method per stat group.
pub trait ProcessProbe {
    /// CPU usage over the lifetime of the process, in percent of one CPU.
    fn cpu_percent(&self, pid: u32) -> Result<f64, ProbeError>;

    /// Resident memory in percent of total physical memory.
    fn memory_percent(&self, pid: u32) -> Result<f64, ProbeError>;

    fn memory_info(&self, pid: u32) -> Result<MemoryInfo, ProbeError>;

    /// Process creation time in milliseconds since the Unix epoch.
    fn create_time_ms(&self, pid: u32) -> Result<i64, ProbeError>;

    fn num_fds(&self, pid: u32) -> Result<u64, ProbeError>;

    fn num_threads(&self, pid: u32) -> Result<u64, ProbeError>;

    fn io_counters(&self, pid: u32) -> Result<IoCounters, ProbeError>;

    fn page_faults(&self, pid: u32) -> Result<PageFaults, ProbeError>;

    fn context_switches(&self, pid: u32) -> Result<ContextSwitches, ProbeError>;

    /// Resource limits together with current usage where it can be determined.
    fn resource_limits(&self, pid: u32) -> Result<Vec<ResourceLimit>, ProbeError>;
}

/// Probe-backed fields of one process. Every group is independently present or absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessStats {
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
    pub memory: Option<MemoryInfo>,
    pub create_time_ms: Option<i64>,
    pub num_fds: Option<u64>,
    pub num_threads: Option<u64>,
    pub io: Option<IoCounters>,
    pub page_faults: Option<PageFaults>,
    pub context_switches: Option<ContextSwitches>,
    pub limits: Option<Vec<ResourceLimit>>,
}

fn present<T>(pid: u32, group: &str, result: Result<T, ProbeError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("pid {}: {} unavailable: {}", pid, group, e);
            None
        }
    }
}

impl ProcessStats {
    /// Runs every probe for `pid`, keeping whatever succeeded.
    pub fn collect<P: ProcessProbe + ?Sized>(probe: &P, pid: u32) -> Self {
        Self {
            cpu_percent: present(pid, "cpu_percent", probe.cpu_percent(pid)),
            memory_percent: present(pid, "memory_percent", probe.memory_percent(pid)),
            memory: present(pid, "memory_info", probe.memory_info(pid)),
            create_time_ms: present(pid, "create_time", probe.create_time_ms(pid)),
            num_fds: present(pid, "num_fds", probe.num_fds(pid)),
            num_threads: present(pid, "num_threads", probe.num_threads(pid)),
            io: present(pid, "io_counters", probe.io_counters(pid)),
            page_faults: present(pid, "page_faults", probe.page_faults(pid)),
            context_switches: present(pid, "context_switches", probe.context_switches(pid)),
            limits: present(pid, "resource_limits", probe.resource_limits(pid)),
        }
    }
}
