//! Process-related modules for discovery, probing and classification.
//!
//! This module provides:
//! - `scanner`: Process discovery from /proc
//! - `classifier`: Bucketing of processes by search criteria
//! - `probe`: Per-process stat probe interface and optional field bag
//! - `procfs`: /proc implementation of the probe interface
//! - `cpu`, `memory`, `limits`: parsers for stat, status and limits files

pub mod classifier;
pub mod cpu;
pub mod limits;
pub mod memory;
pub mod probe;
pub mod procfs;
pub mod scanner;

// Re-export commonly used types
pub use classifier::{Bucket, Buckets, ClassifyOutcome, Classifier, CATCH_ALL};
pub use cpu::{parse_stat, ProcStat, CLK_TCK};
pub use limits::{LimitValue, ResourceKind, ResourceLimit, RlimitSpec};
pub use memory::{ContextSwitches, MemoryInfo};
pub use probe::{IoCounters, PageFaults, ProcessProbe, ProcessStats};
pub use procfs::ProcfsProbe;
pub use scanner::{ProcessRecord, ProcessSource, ProcfsSource};
