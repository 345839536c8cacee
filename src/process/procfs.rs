//! [`ProcessProbe`] implementation reading `/proc/<pid>/*`.
//!
//! System-wide values (total memory, boot time) are read once when the probe
//! is built; if either is unavailable the dependent per-process fields are
//! reported as unsupported rather than guessed.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ProbeError;
use crate::process::cpu::{read_stat, CLK_TCK};
use crate::process::limits::{count_file_locks, read_limits, ResourceKind, ResourceLimit};
use crate::process::memory::{
    parse_context_switches, parse_memory_info, parse_num_threads, parse_queued_signals,
    read_status, ContextSwitches, MemoryInfo,
};
use crate::process::probe::{IoCounters, PageFaults, ProcessProbe};
use crate::system;

#[derive(Debug, Clone)]
pub struct ProcfsProbe {
    root: PathBuf,
    mem_total_bytes: Option<u64>,
    boot_time_secs: Option<u64>,
}

impl ProcfsProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mem_total_bytes = system::read_mem_total(&root)
            .map_err(|e| debug!("Total memory unavailable, memory_usage disabled: {}", e))
            .ok();
        let boot_time_secs = system::read_boot_time(&root)
            .map_err(|e| debug!("Boot time unavailable, created_at disabled: {}", e))
            .ok();
        Self {
            root,
            mem_total_bytes,
            boot_time_secs,
        }
    }

    fn proc_path(&self, pid: u32) -> PathBuf {
        self.root.join(pid.to_string())
    }

    fn status(&self, pid: u32) -> Result<(String, String), ProbeError> {
        let proc_path = self.proc_path(pid);
        let content = read_status(&proc_path)?;
        Ok((content, proc_path.join("status").display().to_string()))
    }

    /// Fills in `used` for the kinds where it is meaningful. A used value that
    /// cannot be read stays `None`; the limit itself is still reported.
    fn attach_usage(&self, pid: u32, limits: &mut [ResourceLimit]) {
        let proc_path = self.proc_path(pid);
        let stat = read_stat(&proc_path).ok();
        let status = read_status(&proc_path).ok();
        let locks = system::read_locks(&self.root).ok();

        for limit in limits.iter_mut() {
            limit.used = match limit.kind {
                ResourceKind::Cpu => stat.map(|s| s.cpu_time_seconds()),
                ResourceKind::Nice => stat.map(|s| s.nice as f64),
                ResourceKind::RtPrio => stat.and_then(|s| s.rt_priority).map(|v| v as f64),
                ResourceKind::SigPending => status
                    .as_deref()
                    .and_then(|s| parse_queued_signals(s, "status").ok())
                    .map(|v| v as f64),
                ResourceKind::Locks => locks.as_deref().map(|l| count_file_locks(l, pid) as f64),
                _ => None,
            };
        }
    }
}

impl ProcessProbe for ProcfsProbe {
    fn cpu_percent(&self, pid: u32) -> Result<f64, ProbeError> {
        let stat = read_stat(&self.proc_path(pid))?;
        let uptime = system::read_uptime(&self.root)?;
        let age = uptime - stat.start_seconds_since_boot();
        if age <= 0.0 {
            return Ok(0.0);
        }
        Ok(stat.cpu_time_seconds() / age * 100.0)
    }

    fn memory_percent(&self, pid: u32) -> Result<f64, ProbeError> {
        let total = self
            .mem_total_bytes
            .filter(|t| *t > 0)
            .ok_or(ProbeError::Unsupported("total memory"))?;
        let mem = self.memory_info(pid)?;
        Ok(mem.rss as f64 / total as f64 * 100.0)
    }

    fn memory_info(&self, pid: u32) -> Result<MemoryInfo, ProbeError> {
        let (content, path) = self.status(pid)?;
        parse_memory_info(&content, &path)
    }

    fn create_time_ms(&self, pid: u32) -> Result<i64, ProbeError> {
        let boot = self.boot_time_secs.ok_or(ProbeError::Unsupported("boot time"))?;
        let stat = read_stat(&self.proc_path(pid))?;
        let start_ms = stat.starttime_ticks as f64 * 1000.0 / *CLK_TCK;
        Ok(boot as i64 * 1000 + start_ms as i64)
    }

    fn num_fds(&self, pid: u32) -> Result<u64, ProbeError> {
        let fd_path = self.proc_path(pid).join("fd");
        let entries = fs::read_dir(&fd_path).map_err(|e| ProbeError::io(fd_path.display().to_string(), e))?;
        Ok(entries.flatten().count() as u64)
    }

    fn num_threads(&self, pid: u32) -> Result<u64, ProbeError> {
        let (content, path) = self.status(pid)?;
        parse_num_threads(&content, &path)
    }

    fn io_counters(&self, pid: u32) -> Result<IoCounters, ProbeError> {
        let io_path = self.proc_path(pid).join("io");
        let content =
            fs::read_to_string(&io_path).map_err(|e| ProbeError::io(io_path.display().to_string(), e))?;
        parse_io_counters(&content).ok_or_else(|| ProbeError::parse("io counters", io_path.display().to_string()))
    }

    fn page_faults(&self, pid: u32) -> Result<PageFaults, ProbeError> {
        let stat = read_stat(&self.proc_path(pid))?;
        Ok(PageFaults {
            major: stat.majflt,
            minor: stat.minflt,
            child_major: stat.cmajflt,
            child_minor: stat.cminflt,
        })
    }

    fn context_switches(&self, pid: u32) -> Result<ContextSwitches, ProbeError> {
        let (content, path) = self.status(pid)?;
        parse_context_switches(&content, &path)
    }

    fn resource_limits(&self, pid: u32) -> Result<Vec<ResourceLimit>, ProbeError> {
        let mut limits = read_limits(&self.proc_path(pid))?;
        self.attach_usage(pid, &mut limits);
        Ok(limits)
    }
}

/// Parses `/proc/<pid>/io`. Requires root or CAP_SYS_PTRACE for foreign processes.
pub fn parse_io_counters(content: &str) -> Option<IoCounters> {
    let field = |key: &str| {
        content
            .lines()
            .find_map(|line| line.strip_prefix(key))
            .and_then(|v| v.trim().parse::<u64>().ok())
    };
    Some(IoCounters {
        read_count: field("syscr:")?,
        write_count: field("syscw:")?,
        read_bytes: field("read_bytes:")?,
        write_bytes: field("write_bytes:")?,
    })
}

/// Whether `root` looks like a procfs mount.
pub fn looks_like_procfs(root: &Path) -> bool {
    root.join("self").exists() || root.join("1").exists() || root.join("uptime").exists()
}
