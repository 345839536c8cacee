//! Integration tests for the check pipeline.
//!
//! These tests drive `run_check` and the aggregator through in-memory
//! process sources and probes, so every stat group can be made to fail on
//! demand.

use std::collections::HashMap;

use procstat_check::config::CheckOptions;
use procstat_check::criteria::{SearchCriterion, Severity};
use procstat_check::error::{CheckError, ProbeError};
use procstat_check::metrics::{AggregatedMetrics, MetricsAggregator, StatusBucket};
use procstat_check::process::{
    ClassifyOutcome, Classifier, ContextSwitches, IoCounters, LimitValue, MemoryInfo, PageFaults,
    ProcessProbe, ProcessRecord, ProcessSource, ResourceKind, ResourceLimit,
};
use procstat_check::run_check;

const TS: i64 = 1_700_000_000_000;

struct FakeSource(Vec<ProcessRecord>);

impl ProcessSource for FakeSource {
    fn processes(&self) -> Result<Vec<ProcessRecord>, CheckError> {
        Ok(self.0.clone())
    }
}

struct FailingSource;

impl ProcessSource for FailingSource {
    fn processes(&self) -> Result<Vec<ProcessRecord>, CheckError> {
        Err(CheckError::Scan {
            root: "/nonexistent".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
        })
    }
}

#[derive(Debug, Clone, Default)]
struct FakeStats {
    cpu: Option<f64>,
    mem: Option<f64>,
    memory: Option<MemoryInfo>,
    created_ms: Option<i64>,
    fds: Option<u64>,
    threads: Option<u64>,
    io: Option<IoCounters>,
    faults: Option<PageFaults>,
    switches: Option<ContextSwitches>,
    limits: Option<Vec<ResourceLimit>>,
}

impl FakeStats {
    fn full() -> Self {
        Self {
            cpu: Some(1.5),
            mem: Some(0.25),
            memory: Some(MemoryInfo {
                rss: 4096,
                vms: 8192,
                swap: Some(0),
                data: Some(1024),
                stack: Some(132),
                locked: None,
            }),
            created_ms: Some(1_600_000_000_000),
            fds: Some(12),
            threads: Some(3),
            io: Some(IoCounters {
                read_count: 10,
                write_count: 4,
                read_bytes: 4096,
                write_bytes: 512,
            }),
            faults: Some(PageFaults {
                major: 1,
                minor: 200,
                child_major: 0,
                child_minor: 30,
            }),
            switches: Some(ContextSwitches {
                voluntary: 50,
                involuntary: 7,
            }),
            limits: Some(vec![
                ResourceLimit {
                    kind: ResourceKind::Cpu,
                    soft: LimitValue::Unlimited,
                    hard: LimitValue::Unlimited,
                    used: Some(2.5),
                },
                ResourceLimit {
                    kind: ResourceKind::NoFile,
                    soft: LimitValue::Limited(1024),
                    hard: LimitValue::Limited(4096),
                    used: None,
                },
                ResourceLimit {
                    kind: ResourceKind::FileSize,
                    soft: LimitValue::Unlimited,
                    hard: LimitValue::Unlimited,
                    used: None,
                },
                ResourceLimit {
                    kind: ResourceKind::Locks,
                    soft: LimitValue::Unlimited,
                    hard: LimitValue::Unlimited,
                    used: None,
                },
            ]),
        }
    }
}

#[derive(Default)]
struct FakeProbe {
    stats: HashMap<u32, FakeStats>,
}

impl FakeProbe {
    fn with(mut self, pid: u32, stats: FakeStats) -> Self {
        self.stats.insert(pid, stats);
        self
    }

    fn get(&self, pid: u32) -> FakeStats {
        self.stats.get(&pid).cloned().unwrap_or_default()
    }
}

fn unavailable(what: &'static str) -> ProbeError {
    ProbeError::Unsupported(what)
}

impl ProcessProbe for FakeProbe {
    fn cpu_percent(&self, pid: u32) -> Result<f64, ProbeError> {
        self.get(pid).cpu.ok_or_else(|| unavailable("cpu"))
    }
    fn memory_percent(&self, pid: u32) -> Result<f64, ProbeError> {
        self.get(pid).mem.ok_or_else(|| unavailable("mem"))
    }
    fn memory_info(&self, pid: u32) -> Result<MemoryInfo, ProbeError> {
        self.get(pid).memory.ok_or_else(|| unavailable("memory"))
    }
    fn create_time_ms(&self, pid: u32) -> Result<i64, ProbeError> {
        self.get(pid).created_ms.ok_or_else(|| unavailable("create time"))
    }
    fn num_fds(&self, pid: u32) -> Result<u64, ProbeError> {
        self.get(pid).fds.ok_or_else(|| unavailable("fds"))
    }
    fn num_threads(&self, pid: u32) -> Result<u64, ProbeError> {
        self.get(pid).threads.ok_or_else(|| unavailable("threads"))
    }
    fn io_counters(&self, pid: u32) -> Result<IoCounters, ProbeError> {
        self.get(pid).io.ok_or_else(|| unavailable("io"))
    }
    fn page_faults(&self, pid: u32) -> Result<PageFaults, ProbeError> {
        self.get(pid).faults.ok_or_else(|| unavailable("faults"))
    }
    fn context_switches(&self, pid: u32) -> Result<ContextSwitches, ProbeError> {
        self.get(pid).switches.ok_or_else(|| unavailable("switches"))
    }
    fn resource_limits(&self, pid: u32) -> Result<Vec<ResourceLimit>, ProbeError> {
        self.get(pid).limits.ok_or_else(|| unavailable("limits"))
    }
}

fn proc(pid: u32, name: &str, cmdline: &str, status: Option<char>) -> ProcessRecord {
    ProcessRecord::new(pid, name, cmdline, status)
}

fn options(criteria: Vec<SearchCriterion>) -> CheckOptions {
    CheckOptions {
        criteria,
        host_name: Some("web-01".to_string()),
        self_pid: 1,
        ..CheckOptions::default()
    }
}

fn run(opts: &CheckOptions, source: &FakeSource, probe: &FakeProbe) -> (Result<Severity, CheckError>, String) {
    let mut out = Vec::new();
    let result = run_check(opts, source, probe, TS, &mut out);
    (result, String::from_utf8(out).unwrap())
}

fn aggregate(opts: &CheckOptions, records: Vec<ProcessRecord>, probe: &FakeProbe) -> AggregatedMetrics {
    let buckets = match Classifier::new(&opts.criteria, opts.self_pid).classify(records) {
        ClassifyOutcome::Buckets(b) => b,
        ClassifyOutcome::Zombie(p) => panic!("unexpected zombie {}", p.pid),
    };
    MetricsAggregator::new(probe, opts.host_name.clone(), TS).aggregate(&buckets)
}

fn summary_value(agg: &AggregatedMetrics, field: &str) -> f64 {
    agg.processes
        .with_field(field)
        .next()
        .map(|p| p.value)
        .unwrap_or_else(|| panic!("missing summary field {field}"))
}

fn sample_lines<'a>(text: &'a str, family: &str) -> Vec<&'a str> {
    let prefix = format!("{family}{{");
    text.lines().filter(|l| l.starts_with(&prefix)).collect()
}

#[test]
fn test_ok_run_prints_status_and_exposition() {
    let source = FakeSource(vec![proc(100, "sshd", "/usr/sbin/sshd -D", Some('S'))]);
    let probe = FakeProbe::default().with(100, FakeStats::full());
    let opts = options(vec![SearchCriterion::new("sshd")]);

    let (result, text) = run(&opts, &source, &probe);
    assert_eq!(result.unwrap(), Severity::OK);

    assert!(text.starts_with(
        "# OK       | 1 >= 1 (found >= required) evaluated true for \"sshd\"\n# Status - OK\n"
    ));
    assert!(text.contains("# HELP procstat per-process metrics"));
    assert!(text.contains("# TYPE procstat gauge"));
    assert!(text.contains("# HELP processes summary metrics"));
    assert!(text.contains("# TYPE processes gauge"));
    assert!(text.contains(
        "procstat{field=\"cpu_usage\",host.name=\"web-01\",process.executable.name=\"sshd\",process.executable.pid=\"100\",search_string=\"sshd\",units=\"percent\"} 1.5 1700000000000"
    ));
    assert!(text.find("# TYPE procstat").unwrap() < text.find("# TYPE processes").unwrap());
}

#[test]
fn test_failing_threshold_sets_severity() {
    let source = FakeSource(vec![proc(100, "bash", "bash", Some('S'))]);
    let probe = FakeProbe::default();
    let criteria = vec![SearchCriterion {
        number: 2,
        severity: 1,
        ..SearchCriterion::new("nginx")
    }];

    let (result, text) = run(&options(criteria), &source, &probe);
    assert_eq!(result.unwrap(), Severity::WARNING);
    assert!(text.contains("# WARNING  | 0 >= 2 (found >= required) evaluated false for \"nginx\""));
    assert!(text.contains("# Status - WARNING"));
    // nothing classified: only the summary family is rendered
    assert!(!text.contains("# TYPE procstat gauge"));
    assert!(text.contains("# TYPE processes gauge"));
}

#[test]
fn test_each_pid_in_at_most_one_bucket() {
    let records = vec![
        proc(10, "nginx", "nginx: master process", Some('S')),
        proc(10, "nginx", "nginx: master process", Some('S')),
        proc(11, "nginx", "nginx: worker process", Some('R')),
    ];
    let criteria = vec![
        SearchCriterion::new("nginx"),
        SearchCriterion {
            full_cmdline: true,
            ..SearchCriterion::new("worker")
        },
    ];
    let probe = FakeProbe::default()
        .with(10, FakeStats::full())
        .with(11, FakeStats::full());
    let agg = aggregate(&options(criteria), records, &probe);

    assert_eq!(agg.total_processes, 2);
    let pids: Vec<&str> = agg
        .procstat
        .with_field("num_threads")
        .map(|p| p.label("process.executable.pid").unwrap())
        .collect();
    assert_eq!(pids, vec!["10", "11"]);
    // first matching criterion wins, so "worker" never gets pid 11
    assert!(agg
        .procstat
        .points
        .iter()
        .all(|p| p.label("search_string") == Some("nginx")));
}

#[test]
fn test_zero_criteria_catch_all() {
    let records = vec![
        proc(1, "procstat-check", "procstat-check", Some('R')),
        proc(2, "init", "/sbin/init", Some('S')),
        proc(3, "kworker/0:1", "", Some('I')),
    ];
    let probe = FakeProbe::default()
        .with(2, FakeStats::full())
        .with(3, FakeStats::full());
    let agg = aggregate(&options(vec![]), records, &probe);

    assert_eq!(agg.total_processes, 2);
    assert_eq!(summary_value(&agg, "total"), 2.0);
    for point in &agg.procstat.points {
        assert_eq!(point.label("search_string"), Some(""));
        assert_ne!(point.label("process.executable.pid"), Some("1"));
    }
}

#[test]
fn test_metrics_only_forces_ok_and_keeps_families() {
    let source = FakeSource(vec![
        proc(100, "sshd", "sshd", Some('S')),
        proc(101, "cron", "cron", Some('S')),
    ]);
    let probe = FakeProbe::default()
        .with(100, FakeStats::full())
        .with(101, FakeStats::full());
    let criteria = vec![SearchCriterion {
        number: 5,
        ..SearchCriterion::new("sshd")
    }];

    let checked = options(criteria.clone());
    let (result, full_text) = run(&checked, &source, &probe);
    assert_eq!(result.unwrap(), Severity::CRITICAL);

    let metrics_only = CheckOptions {
        metrics_only: true,
        ..options(criteria)
    };
    let (result, metrics_text) = run(&metrics_only, &source, &probe);
    assert_eq!(result.unwrap(), Severity::OK);

    assert!(!metrics_text.contains("# Status"));
    assert!(metrics_text.starts_with("# HELP"));
    assert!(full_text.ends_with(&metrics_text));
}

#[test]
fn test_suppress_ok_output() {
    let source = FakeSource(vec![proc(100, "sshd", "sshd", Some('S'))]);
    let opts = CheckOptions {
        suppress_ok_output: true,
        ..options(vec![SearchCriterion::new("sshd")])
    };
    let (result, text) = run(&opts, &source, &FakeProbe::default());
    assert_eq!(result.unwrap(), Severity::OK);
    assert!(text.starts_with("# Status - OK\n"));
}

#[test]
fn test_rendered_label_keys_ascending() {
    let source = FakeSource(vec![
        proc(100, "sshd", "sshd", Some('S')),
        proc(200, "cron", "cron", Some('S')),
    ]);
    let probe = FakeProbe::default()
        .with(100, FakeStats::full())
        .with(200, FakeStats::full());
    let (_, text) = run(&options(vec![]), &source, &probe);

    let mut checked = 0;
    for family in ["procstat", "processes"] {
        for line in sample_lines(&text, family) {
            let start = line.find('{').unwrap() + 1;
            let end = line.rfind('}').unwrap();
            let keys: Vec<&str> = line[start..end]
                .split("\",")
                .map(|pair| pair.split('=').next().unwrap())
                .collect();
            let mut sorted = keys.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(keys, sorted, "labels out of order in {line}");
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[test]
fn test_histogram_excludes_missing_status() {
    let records = vec![
        proc(10, "a", "", Some('S')),
        proc(11, "b", "", Some('R')),
        proc(12, "c", "", Some('D')),
        proc(13, "d", "", None),
        proc(14, "e", "", Some('t')),
        proc(15, "f", "", Some('Z')),
    ];
    let agg = aggregate(&options(vec![]), records, &FakeProbe::default());

    assert_eq!(agg.total_processes, 6);
    assert_eq!(agg.histogram.total(), 5);
    assert_eq!(agg.histogram.get(StatusBucket::Sleeping), 1);
    assert_eq!(agg.histogram.get(StatusBucket::Running), 1);
    assert_eq!(agg.histogram.get(StatusBucket::Blocked), 1);
    assert_eq!(agg.histogram.get(StatusBucket::Other), 1);
    assert_eq!(agg.histogram.get(StatusBucket::Zombies), 1);

    let status_sum: f64 = StatusBucket::ALL
        .iter()
        .map(|b| summary_value(&agg, b.as_str()))
        .sum();
    assert_eq!(status_sum, 5.0);

    let fields: Vec<&str> = agg.processes.points.iter().filter_map(|p| p.field()).collect();
    assert_eq!(
        fields,
        vec![
            "total",
            "total_threads",
            "parked",
            "wait",
            "blocked",
            "zombies",
            "dead",
            "stopped",
            "running",
            "sleeping",
            "idle",
            "unknown",
            "other"
        ]
    );
    for point in &agg.processes.points {
        assert_eq!(point.label("units"), Some("count"));
        assert_eq!(point.label("host.name"), Some("web-01"));
        assert_eq!(point.label("search_string"), None);
    }
}

#[test]
fn test_probe_failure_omits_only_that_field() {
    let partial = FakeStats {
        threads: Some(4),
        fds: Some(9),
        ..FakeStats::default()
    };
    let records = vec![
        proc(10, "full", "", Some('S')),
        proc(11, "partial", "", Some('S')),
    ];
    let probe = FakeProbe::default()
        .with(10, FakeStats::full())
        .with(11, partial);
    let agg = aggregate(&options(vec![]), records, &probe);

    let fields_of = |pid: &str| -> Vec<String> {
        agg.procstat
            .points
            .iter()
            .filter(|p| p.label("process.executable.pid") == Some(pid))
            .filter_map(|p| p.field().map(str::to_string))
            .collect()
    };

    assert_eq!(fields_of("11"), vec!["num_fds", "num_threads"]);

    let full = fields_of("10");
    for expected in [
        "cpu_usage",
        "memory_usage",
        "memory_rss",
        "memory_vms",
        "memory_swap",
        "memory_data",
        "memory_stack",
        "created_at",
        "num_fds",
        "num_threads",
        "read_count",
        "read_bytes",
        "write_count",
        "write_bytes",
        "major_faults",
        "minor_faults",
        "child_major_faults",
        "child_minor_faults",
        "involuntary_context_switches",
        "voluntary_context_switches",
    ] {
        assert!(full.iter().any(|f| f == expected), "missing {expected}");
    }
    // VmLck was not available
    assert!(!full.iter().any(|f| f == "memory_locked"));

    assert_eq!(agg.total_threads, 7);
    assert_eq!(summary_value(&agg, "total_threads"), 7.0);
}

#[test]
fn test_field_units_and_values() {
    let records = vec![proc(10, "svc", "", Some('S'))];
    let probe = FakeProbe::default().with(10, FakeStats::full());
    let agg = aggregate(&options(vec![]), records, &probe);

    let point = |field: &str| {
        agg.procstat
            .with_field(field)
            .next()
            .unwrap_or_else(|| panic!("missing {field}"))
            .clone()
    };

    assert_eq!(point("cpu_usage").label("units"), Some("percent"));
    assert_eq!(point("memory_rss").label("units"), Some("bytes"));
    assert_eq!(point("memory_rss").value, 4096.0);
    assert_eq!(point("created_at").label("units"), Some("nanoseconds"));
    assert_eq!(point("created_at").value, 1_600_000_000_000.0 * 1e6);
    assert_eq!(point("read_count").label("units"), Some("count"));
    assert_eq!(point("write_bytes").label("units"), Some("bytes"));
    assert_eq!(point("voluntary_context_switches").value, 50.0);
    assert!(agg.procstat.points.iter().all(|p| p.timestamp_ms == TS));
    assert!(agg.processes.points.iter().all(|p| p.timestamp_ms == TS));
}

#[test]
fn test_resource_limit_points() {
    let records = vec![proc(10, "svc", "", Some('S'))];
    let probe = FakeProbe::default().with(10, FakeStats::full());
    let agg = aggregate(&options(vec![]), records, &probe);

    let value = |field: &str| agg.procstat.with_field(field).next().map(|p| p.value);

    // unlimited exported as -1, used present for cpu time
    assert_eq!(value("rlimit_cpu_time_soft"), Some(-1.0));
    assert_eq!(value("rlimit_cpu_time_hard"), Some(-1.0));
    assert_eq!(value("cpu_time"), Some(2.5));
    let cpu_units = agg.procstat.with_field("cpu_time").next().unwrap().label("units");
    assert_eq!(cpu_units, Some("seconds"));

    // no used point for NOFILE; the plain num_fds point is the fd count probe
    assert_eq!(value("rlimit_num_fds_soft"), Some(1024.0));
    assert_eq!(value("rlimit_num_fds_hard"), Some(4096.0));
    assert_eq!(agg.procstat.with_field("num_fds").count(), 1);
    assert_eq!(value("num_fds"), Some(12.0));

    // used not probed: soft/hard only
    assert_eq!(value("rlimit_file_locks_soft"), Some(-1.0));
    assert_eq!(value("file_locks"), None);

    // kinds without a mapping are skipped
    assert!(!agg
        .procstat
        .points
        .iter()
        .any(|p| p.field().is_some_and(|f| f.contains("file_size"))));
}

#[test]
fn test_missing_host_name_omits_label() {
    let records = vec![proc(10, "svc", "", Some('S'))];
    let probe = FakeProbe::default().with(10, FakeStats::full());
    let opts = CheckOptions {
        host_name: None,
        ..options(vec![])
    };
    let agg = aggregate(&opts, records, &probe);
    assert!(agg
        .procstat
        .points
        .iter()
        .chain(agg.processes.points.iter())
        .all(|p| p.label("host.name").is_none()));
}

#[test]
fn test_zombie_fail_fast_stops_run() {
    let source = FakeSource(vec![
        proc(10, "sshd", "sshd", Some('S')),
        proc(11, "defunct", "", Some('Z')),
    ]);
    let opts = CheckOptions {
        zombie_fail_fast: true,
        metrics_only: true,
        ..options(vec![SearchCriterion::new("sshd")])
    };
    let (result, text) = run(&opts, &source, &FakeProbe::default());
    assert_eq!(result.unwrap(), Severity::CRITICAL);
    assert_eq!(
        text,
        "# CRITICAL | zombie process \"defunct\" found with pid 11\n# Status - CRITICAL\n"
    );
}

#[test]
fn test_bad_comparator_aborts_without_exposition() {
    let source = FakeSource(vec![proc(10, "a", "a", Some('S'))]);
    let criteria = vec![
        SearchCriterion::new("a"),
        SearchCriterion {
            comparison: "~=".to_string(),
            ..SearchCriterion::new("b")
        },
    ];
    let (result, text) = run(&options(criteria), &source, &FakeProbe::default());
    assert!(matches!(result, Err(CheckError::Comparator { .. })));
    assert!(text.contains("evaluated true for \"a\""));
    assert!(!text.contains("# HELP"));
}

#[test]
fn test_scan_failure_is_fatal() {
    let mut out = Vec::new();
    let result = run_check(&options(vec![]), &FailingSource, &FakeProbe::default(), TS, &mut out);
    assert!(matches!(result, Err(CheckError::Scan { .. })));
    assert!(out.is_empty());
}
