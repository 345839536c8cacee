//! Per-process and summary metrics.
//!
//! Every bucketed process is expanded into one `procstat` gauge point per
//! available field; fields whose probe failed are simply absent. The
//! `processes` family carries the totals and the process state histogram.

use std::collections::BTreeMap;

use crate::process::{Buckets, ProcessProbe, ProcessRecord, ProcessStats, ResourceLimit};

pub const PROCSTAT_FAMILY: &str = "procstat";
pub const PROCSTAT_HELP: &str = "per-process metrics";
pub const PROCESSES_FAMILY: &str = "processes";
pub const PROCESSES_HELP: &str = "summary metrics";

pub const LABEL_HOST: &str = "host.name";
pub const LABEL_SEARCH: &str = "search_string";
pub const LABEL_EXE_NAME: &str = "process.executable.name";
pub const LABEL_EXE_PID: &str = "process.executable.pid";
pub const LABEL_FIELD: &str = "field";
pub const LABEL_UNITS: &str = "units";

/// Label set of a point. A `BTreeMap` keeps keys unique and ascending.
pub type Labels = BTreeMap<String, String>;

/// One labeled gauge observation.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub name: String,
    pub labels: Labels,
    pub value: f64,
    pub timestamp_ms: i64,
}

impl MetricPoint {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn field(&self) -> Option<&str> {
        self.label(LABEL_FIELD)
    }
}

/// A named group of gauge points.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub points: Vec<MetricPoint>,
}

impl MetricFamily {
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            points: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points whose `field` label equals `field`.
    pub fn with_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a MetricPoint> + 'a {
        self.points.iter().filter(move |p| p.field() == Some(field))
    }
}

/// Process state categories, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBucket {
    Parked,
    Wait,
    Blocked,
    Zombies,
    Dead,
    Stopped,
    Running,
    Sleeping,
    Idle,
    Unknown,
    Other,
}

impl StatusBucket {
    pub const ALL: [StatusBucket; 11] = [
        StatusBucket::Parked,
        StatusBucket::Wait,
        StatusBucket::Blocked,
        StatusBucket::Zombies,
        StatusBucket::Dead,
        StatusBucket::Stopped,
        StatusBucket::Running,
        StatusBucket::Sleeping,
        StatusBucket::Idle,
        StatusBucket::Unknown,
        StatusBucket::Other,
    ];

    /// Maps the first character of a raw process state.
    pub fn from_status(c: char) -> Self {
        match c {
            'P' => StatusBucket::Parked,
            'W' => StatusBucket::Wait,
            // uninterruptible / disk sleep
            'U' | 'D' | 'L' => StatusBucket::Blocked,
            'Z' => StatusBucket::Zombies,
            'X' => StatusBucket::Dead,
            'T' => StatusBucket::Stopped,
            'R' => StatusBucket::Running,
            'S' => StatusBucket::Sleeping,
            'I' => StatusBucket::Idle,
            '?' => StatusBucket::Unknown,
            _ => StatusBucket::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusBucket::Parked => "parked",
            StatusBucket::Wait => "wait",
            StatusBucket::Blocked => "blocked",
            StatusBucket::Zombies => "zombies",
            StatusBucket::Dead => "dead",
            StatusBucket::Stopped => "stopped",
            StatusBucket::Running => "running",
            StatusBucket::Sleeping => "sleeping",
            StatusBucket::Idle => "idle",
            StatusBucket::Unknown => "unknown",
            StatusBucket::Other => "other",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Counts of processes per [`StatusBucket`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusHistogram {
    counts: [u64; 11],
}

impl StatusHistogram {
    /// Records a process; a missing status is not counted anywhere.
    pub fn record(&mut self, status: Option<char>) {
        if let Some(c) = status {
            self.counts[StatusBucket::from_status(c).index()] += 1;
        }
    }

    pub fn get(&self, bucket: StatusBucket) -> u64 {
        self.counts[bucket.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatusBucket, u64)> + '_ {
        StatusBucket::ALL.iter().map(move |b| (*b, self.get(*b)))
    }
}

/// Everything produced by one aggregation pass.
#[derive(Debug, Clone)]
pub struct AggregatedMetrics {
    pub procstat: MetricFamily,
    pub processes: MetricFamily,
    pub total_processes: u64,
    pub total_threads: u64,
    pub histogram: StatusHistogram,
}

impl AggregatedMetrics {
    /// Families in exposition order.
    pub fn families(&self) -> [&MetricFamily; 2] {
        [&self.procstat, &self.processes]
    }
}

/// Expands bucketed processes into metric points.
pub struct MetricsAggregator<'a, P: ProcessProbe + ?Sized> {
    probe: &'a P,
    host_name: Option<String>,
    timestamp_ms: i64,
}

impl<'a, P: ProcessProbe + ?Sized> MetricsAggregator<'a, P> {
    pub fn new(probe: &'a P, host_name: Option<String>, timestamp_ms: i64) -> Self {
        Self {
            probe,
            host_name,
            timestamp_ms,
        }
    }

    fn base_labels(&self) -> Labels {
        let mut labels = Labels::new();
        if let Some(host) = &self.host_name {
            labels.insert(LABEL_HOST.to_string(), host.clone());
        }
        labels
    }

    pub fn aggregate(&self, buckets: &Buckets) -> AggregatedMetrics {
        let mut procstat = MetricFamily::new(PROCSTAT_FAMILY, PROCSTAT_HELP);
        let mut histogram = StatusHistogram::default();
        let mut total_processes = 0u64;
        let mut total_threads = 0u64;

        for bucket in buckets.iter() {
            total_processes += bucket.processes.len() as u64;
            for record in &bucket.processes {
                histogram.record(record.status);
                let stats = ProcessStats::collect(self.probe, record.pid);
                if let Some(threads) = stats.num_threads {
                    total_threads += threads;
                }
                let mut emitter = PointEmitter::new(self, &bucket.key, record, &mut procstat);
                emitter.emit_stats(&stats);
            }
        }

        let mut processes = MetricFamily::new(PROCESSES_FAMILY, PROCESSES_HELP);
        let mut summary = |field: &str, value: u64| {
            let mut labels = self.base_labels();
            labels.insert(LABEL_FIELD.to_string(), field.to_string());
            labels.insert(LABEL_UNITS.to_string(), "count".to_string());
            processes.points.push(MetricPoint {
                name: PROCESSES_FAMILY.to_string(),
                labels,
                value: value as f64,
                timestamp_ms: self.timestamp_ms,
            });
        };
        summary("total", total_processes);
        summary("total_threads", total_threads);
        for (bucket, count) in histogram.iter() {
            summary(bucket.as_str(), count);
        }

        AggregatedMetrics {
            procstat,
            processes,
            total_processes,
            total_threads,
            histogram,
        }
    }
}

/// Appends the points of one process to the `procstat` family.
struct PointEmitter<'f> {
    labels: Labels,
    timestamp_ms: i64,
    family: &'f mut MetricFamily,
}

impl<'f> PointEmitter<'f> {
    fn new<P: ProcessProbe + ?Sized>(
        agg: &MetricsAggregator<'_, P>,
        search: &str,
        record: &ProcessRecord,
        family: &'f mut MetricFamily,
    ) -> Self {
        let mut labels = agg.base_labels();
        labels.insert(LABEL_SEARCH.to_string(), search.to_string());
        labels.insert(LABEL_EXE_NAME.to_string(), record.name.clone());
        labels.insert(LABEL_EXE_PID.to_string(), record.pid.to_string());
        Self {
            labels,
            timestamp_ms: agg.timestamp_ms,
            family,
        }
    }

    fn gauge(&mut self, field: &str, units: &str, value: f64) {
        let mut labels = self.labels.clone();
        labels.insert(LABEL_FIELD.to_string(), field.to_string());
        labels.insert(LABEL_UNITS.to_string(), units.to_string());
        self.family.points.push(MetricPoint {
            name: PROCSTAT_FAMILY.to_string(),
            labels,
            value,
            timestamp_ms: self.timestamp_ms,
        });
    }

    fn opt(&mut self, field: &str, units: &str, value: Option<u64>) {
        if let Some(v) = value {
            self.gauge(field, units, v as f64);
        }
    }

    fn emit_stats(&mut self, stats: &ProcessStats) {
        if let Some(cpu) = stats.cpu_percent {
            self.gauge("cpu_usage", "percent", cpu);
        }
        if let Some(mem) = stats.memory_percent {
            self.gauge("memory_usage", "percent", mem);
        }
        if let Some(mem) = &stats.memory {
            self.gauge("memory_rss", "bytes", mem.rss as f64);
            self.gauge("memory_vms", "bytes", mem.vms as f64);
            self.opt("memory_swap", "bytes", mem.swap);
            self.opt("memory_data", "bytes", mem.data);
            self.opt("memory_stack", "bytes", mem.stack);
            self.opt("memory_locked", "bytes", mem.locked);
        }
        if let Some(created_ms) = stats.create_time_ms {
            self.gauge("created_at", "nanoseconds", created_ms as f64 * 1e6);
        }
        self.opt("num_fds", "count", stats.num_fds);
        self.opt("num_threads", "count", stats.num_threads);
        if let Some(io) = &stats.io {
            self.gauge("read_count", "count", io.read_count as f64);
            self.gauge("read_bytes", "bytes", io.read_bytes as f64);
            self.gauge("write_count", "count", io.write_count as f64);
            self.gauge("write_bytes", "bytes", io.write_bytes as f64);
        }
        if let Some(faults) = &stats.page_faults {
            self.gauge("major_faults", "count", faults.major as f64);
            self.gauge("minor_faults", "count", faults.minor as f64);
            self.gauge("child_major_faults", "count", faults.child_major as f64);
            self.gauge("child_minor_faults", "count", faults.child_minor as f64);
        }
        if let Some(cs) = &stats.context_switches {
            self.gauge("involuntary_context_switches", "count", cs.involuntary as f64);
            self.gauge("voluntary_context_switches", "count", cs.voluntary as f64);
        }
        if let Some(limits) = &stats.limits {
            for limit in limits {
                self.emit_limit(limit);
            }
        }
    }

    fn emit_limit(&mut self, limit: &ResourceLimit) {
        let Some(spec) = limit.kind.metric_spec() else {
            return;
        };
        self.gauge(
            &format!("rlimit_{}_soft", spec.field_name),
            spec.units,
            limit.soft.as_f64(),
        );
        self.gauge(
            &format!("rlimit_{}_hard", spec.field_name),
            spec.units,
            limit.hard.as_f64(),
        );
        if spec.emit_used {
            if let Some(used) = limit.used {
                self.gauge(spec.field_name, spec.units, used);
            }
        }
    }
}
