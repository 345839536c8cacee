//! procstat-check library
//!
//! A one-shot process check. One scan of the process table is classified
//! against the configured search criteria, each criterion's match count is
//! compared with its threshold, and per-process resource usage plus a summary
//! of process states is rendered in the Prometheus text format.
//!
//! # Pipeline
//!
//! - [`process::Classifier`]: assigns every process to at most one bucket
//! - [`evaluate::SeverityEvaluator`]: status lines and the overall severity
//! - [`metrics::MetricsAggregator`]: `procstat` and `processes` gauge families
//! - [`exposition`]: text rendering with sorted label keys
//!
//! The process table and per-process statistics come from the
//! [`process::ProcessSource`] and [`process::ProcessProbe`] traits; the
//! `/proc` implementations are [`process::ProcfsSource`] and
//! [`process::ProcfsProbe`].
//!
//! # Usage
//!
//! ```no_run
//! use procstat_check::{run_check, CheckOptions, ProcfsProbe, ProcfsSource, SearchCriterion};
//!
//! let opts = CheckOptions {
//!     criteria: vec![SearchCriterion::new("sshd")],
//!     ..CheckOptions::default()
//! };
//! let source = ProcfsSource::new(&opts.proc_root);
//! let probe = ProcfsProbe::new(&opts.proc_root);
//! let now = chrono::Utc::now().timestamp_millis();
//!
//! let mut stdout = std::io::stdout().lock();
//! let severity = run_check(&opts, &source, &probe, now, &mut stdout).unwrap();
//! std::process::exit(severity.exit_code() as i32);
//! ```

pub mod check;
pub mod cli;
pub mod commands;
pub mod config;
pub mod criteria;
pub mod error;
pub mod evaluate;
pub mod exposition;
pub mod metrics;
pub mod process;
pub mod system;

// Re-export main types for convenience
pub use check::run_check;
pub use config::{CheckOptions, Config};
pub use criteria::{parse_searches, Comparator, SearchCriterion, Severity};
pub use error::{CheckError, ProbeError};
pub use evaluate::{Evaluation, SeverityEvaluator};
pub use metrics::{AggregatedMetrics, MetricFamily, MetricPoint, MetricsAggregator};
pub use process::{Classifier, ProcessProbe, ProcessRecord, ProcessSource, ProcfsProbe, ProcfsSource};
