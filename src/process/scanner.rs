//! Process discovery: turns the /proc process table into [`ProcessRecord`]s.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::CheckError;
use crate::process::cpu::read_stat;
use crate::process::memory::status_value;

/// Identity of one live process as seen by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub cmdline: String,
    /// Raw state character (`R`, `S`, `Z`, ...); `None` when it could not be read.
    pub status: Option<char>,
}

impl ProcessRecord {
    pub fn new(pid: u32, name: impl Into<String>, cmdline: impl Into<String>, status: Option<char>) -> Self {
        Self {
            pid,
            name: name.into(),
            cmdline: cmdline.into(),
            status,
        }
    }

    pub fn is_zombie(&self) -> bool {
        self.status == Some('Z')
    }
}

/// Snapshot provider for the live process table.
pub trait ProcessSource {
    fn processes(&self) -> Result<Vec<ProcessRecord>, CheckError>;
}

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Scans a /proc directory for process entries with numeric PIDs, ordered by pid.
pub fn collect_proc_entries(root: &Path) -> Result<Vec<ProcEntry>, std::io::Error> {
    let mut out = Vec::new();
    for entry in fs::read_dir(root)?.flatten() {
        let p = entry.path();
        let name = match p.file_name().and_then(|s| s.to_str()) {
            Some(v) => v,
            None => continue,
        };
        if !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let pid: u32 = match name.parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        out.push(ProcEntry { pid, proc_path: p });
    }
    out.sort_by_key(|e| e.pid);
    Ok(out)
}

/// Reads process name from the status `Name:` line, falling back to comm.
pub fn read_process_name(proc_path: &Path) -> Option<String> {
    if let Ok(s) = fs::read_to_string(proc_path.join("status")) {
        if let Some(name) = status_value(&s, "Name:").filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
    }

    let comm = fs::read_to_string(proc_path.join("comm")).ok()?;
    let t = comm.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Reads the command line with NUL separators replaced by spaces.
/// Kernel threads have an empty command line.
pub fn read_cmdline(proc_path: &Path) -> Option<String> {
    let content = fs::read(proc_path.join("cmdline")).ok()?;
    let parts: Vec<String> = content
        .split(|&b| b == 0u8)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect();
    Some(parts.join(" "))
}

/// [`ProcessSource`] backed by a procfs mount.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    root: PathBuf,
}

impl ProcfsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ProcessSource for ProcfsSource {
    fn processes(&self) -> Result<Vec<ProcessRecord>, CheckError> {
        let entries = collect_proc_entries(&self.root).map_err(|source| CheckError::Scan {
            root: self.root.display().to_string(),
            source,
        })?;

        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            // A process without a readable name exited while we were scanning.
            let Some(name) = read_process_name(&entry.proc_path) else {
                debug!("pid {}: vanished during scan, skipping", entry.pid);
                continue;
            };
            let cmdline = read_cmdline(&entry.proc_path).unwrap_or_default();
            let status = match read_stat(&entry.proc_path) {
                Ok(stat) => Some(stat.state),
                Err(e) => {
                    debug!("pid {}: status unavailable: {}", entry.pid, e);
                    None
                }
            };
            out.push(ProcessRecord {
                pid: entry.pid,
                name,
                cmdline,
                status,
            });
        }
        debug!("Scanned {} processes under {}", out.len(), self.root.display());
        Ok(out)
    }
}
