//! Search criteria, comparison operators and severity levels.
//!
//! Criteria arrive as a JSON array, e.g.
//! `[{"search_string": "sshd", "number": 1, "comparison": ">=", "severity": 2}]`.
//! Every field except `search_string` has a default; a criterion with an
//! empty `search_string` is accepted but ignored by classification and
//! evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CheckError;

pub const DEFAULT_NUMBER: i64 = 1;
pub const DEFAULT_SEVERITY: i32 = 2;
pub const DEFAULT_COMPARISON: &str = ">=";

fn default_number() -> i64 {
    DEFAULT_NUMBER
}
fn default_severity() -> i32 {
    DEFAULT_SEVERITY
}
fn default_comparison() -> String {
    DEFAULT_COMPARISON.to_string()
}

/// One configured search pattern with its threshold, comparator and severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriterion {
    #[serde(default)]
    pub search_string: String,

    /// Match the pattern as a substring of the full command line instead of
    /// comparing it to the process name.
    #[serde(default)]
    pub full_cmdline: bool,

    #[serde(default = "default_number")]
    pub number: i64,

    #[serde(default = "default_severity")]
    pub severity: i32,

    /// Kept as text; resolved to a [`Comparator`] at evaluation time.
    #[serde(default = "default_comparison")]
    pub comparison: String,
}

impl SearchCriterion {
    pub fn new(search_string: impl Into<String>) -> Self {
        Self {
            search_string: search_string.into(),
            full_cmdline: false,
            number: DEFAULT_NUMBER,
            severity: DEFAULT_SEVERITY,
            comparison: default_comparison(),
        }
    }

    /// Empty patterns never form a bucket and are never evaluated.
    pub fn is_active(&self) -> bool {
        !self.search_string.is_empty()
    }
}

/// Parses the JSON criteria array. Blank input means "no criteria".
pub fn parse_searches(search_json: &str) -> Result<Vec<SearchCriterion>, CheckError> {
    if search_json.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(search_json)?)
}

/// The six numeric relational operators a criterion may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Ge,
    Le,
    Eq,
    Ne,
    Gt,
    Lt,
}

impl Comparator {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            ">=" => Some(Comparator::Ge),
            "<=" => Some(Comparator::Le),
            "==" => Some(Comparator::Eq),
            "!=" => Some(Comparator::Ne),
            ">" => Some(Comparator::Gt),
            "<" => Some(Comparator::Lt),
            _ => None,
        }
    }

    /// Evaluates `found <op> required`.
    pub fn compare(self, found: i64, required: i64) -> bool {
        match self {
            Comparator::Ge => found >= required,
            Comparator::Le => found <= required,
            Comparator::Eq => found == required,
            Comparator::Ne => found != required,
            Comparator::Gt => found > required,
            Comparator::Lt => found < required,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal alert level. Values other than 0/1/2 are reported as UNKNOWN but
/// keep their numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Severity(pub i32);

impl Severity {
    pub const OK: Severity = Severity(0);
    pub const WARNING: Severity = Severity(1);
    pub const CRITICAL: Severity = Severity(2);
    pub const UNKNOWN: Severity = Severity(3);

    pub fn label(self) -> &'static str {
        severity_label(self.0)
    }

    /// Process exit status for this severity. Values that do not fit an exit
    /// code collapse to UNKNOWN.
    pub fn exit_code(self) -> u8 {
        u8::try_from(self.0).unwrap_or(Severity::UNKNOWN.0 as u8)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn severity_label(sev: i32) -> &'static str {
    match sev {
        0 => "OK",
        1 => "WARNING",
        2 => "CRITICAL",
        _ => "UNKNOWN",
    }
}
