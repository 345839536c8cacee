//! Process classification into per-criterion buckets.
//!
//! Every process is assigned to at most one bucket: the first criterion (in
//! declaration order) it matches. Without criteria, every process lands in
//! the catch-all bucket keyed by `""`.

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use tracing::debug;

use crate::criteria::SearchCriterion;
use crate::process::scanner::ProcessRecord;

/// Key of the catch-all bucket used when no criteria are configured.
pub const CATCH_ALL: &str = "";

/// Processes matched to one pattern, in scan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub key: String,
    pub processes: Vec<ProcessRecord>,
}

/// Buckets of one scan, kept in the order they were first filled.
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    buckets: Vec<Bucket>,
    index: HashMap<String, usize>,
}

impl Buckets {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, key: &str, record: ProcessRecord) {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.buckets.push(Bucket {
                    key: key.to_string(),
                    processes: Vec::new(),
                });
                self.index.insert(key.to_string(), self.buckets.len() - 1);
                self.buckets.len() - 1
            }
        };
        self.buckets[idx].processes.push(record);
    }

    /// Processes in the bucket for `key`; empty if nothing matched it.
    pub fn get(&self, key: &str) -> &[ProcessRecord] {
        self.index
            .get(key)
            .map(|&idx| self.buckets[idx].processes.as_slice())
            .unwrap_or(&[])
    }

    pub fn count(&self, key: &str) -> usize {
        self.get(key).len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    /// Number of non-empty buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total processes across all buckets.
    pub fn total_processes(&self) -> usize {
        self.buckets.iter().map(|b| b.processes.len()).sum()
    }
}

/// Result of a scan.
#[derive(Debug, Clone)]
pub enum ClassifyOutcome {
    Buckets(Buckets),
    /// Zombie fail-fast mode hit a zombie; no buckets are produced.
    Zombie(ProcessRecord),
}

/// Returns true when `record` satisfies `criterion`.
pub fn matches(criterion: &SearchCriterion, record: &ProcessRecord) -> bool {
    if !criterion.is_active() {
        return false;
    }
    if criterion.full_cmdline {
        record.cmdline.contains(&criterion.search_string)
    } else {
        record.name == criterion.search_string
    }
}

/// Classifier for one scan. `self_pid` is never classified.
#[derive(Debug, Clone)]
pub struct Classifier<'a> {
    criteria: &'a [SearchCriterion],
    self_pid: u32,
    zombie_fail_fast: bool,
}

impl<'a> Classifier<'a> {
    pub fn new(criteria: &'a [SearchCriterion], self_pid: u32) -> Self {
        Self {
            criteria,
            self_pid,
            zombie_fail_fast: false,
        }
    }

    pub fn with_zombie_fail_fast(mut self, enabled: bool) -> Self {
        self.zombie_fail_fast = enabled;
        self
    }

    pub fn classify<I>(&self, processes: I) -> ClassifyOutcome
    where
        I: IntoIterator<Item = ProcessRecord>,
    {
        let mut buckets = Buckets::new();
        let mut seen: HashSet<u32> = HashSet::new();

        for record in processes {
            if record.pid == self.self_pid {
                continue;
            }
            if !seen.insert(record.pid) {
                debug!("pid {} already classified, skipping duplicate", record.pid);
                continue;
            }
            if self.zombie_fail_fast && record.is_zombie() {
                debug!("Zombie process {} (pid {}) found, stopping scan", record.name, record.pid);
                return ClassifyOutcome::Zombie(record);
            }

            if self.criteria.is_empty() {
                buckets.push(CATCH_ALL, record);
                continue;
            }

            if let Some(criterion) = self.criteria.iter().find(|c| matches(c, &record)) {
                buckets.push(&criterion.search_string, record);
            }
        }

        ClassifyOutcome::Buckets(buckets)
    }
}
