//! Threshold evaluation of bucket sizes.
//!
//! Each active criterion contributes its configured severity when
//! `found <comparison> number` is false and 0 otherwise; the overall
//! severity is the maximum contribution. Status lines are written as each
//! criterion is evaluated, so an invalid operator further down the list
//! leaves the earlier lines in place.

use std::io::Write;

use crate::criteria::{Comparator, SearchCriterion, Severity};
use crate::error::CheckError;
use crate::process::Buckets;

/// Outcome of one criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionResult {
    pub search_string: String,
    pub found: i64,
    pub comparator: Comparator,
    pub number: i64,
    pub passed: bool,
    /// 0 when passed, the configured severity otherwise.
    pub severity: Severity,
}

impl CriterionResult {
    /// `# WARNING  | 0 >= 2 (found >= required) evaluated false for "nginx"`
    pub fn status_line(&self) -> String {
        format!(
            "# {:<8} | {} {} {} (found {} required) evaluated {} for {:?}",
            self.severity.label(),
            self.found,
            self.comparator,
            self.number,
            self.comparator,
            self.passed,
            self.search_string
        )
    }
}

/// Results of all evaluated criteria plus the overall severity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub results: Vec<CriterionResult>,
    pub overall: Severity,
}

/// Evaluates a single criterion against the buckets.
pub fn evaluate_criterion(criterion: &SearchCriterion, buckets: &Buckets) -> Result<CriterionResult, CheckError> {
    let found = buckets.count(&criterion.search_string) as i64;
    let comparator = Comparator::parse(&criterion.comparison).ok_or_else(|| CheckError::Comparator {
        expression: format!("{} {} {}", found, criterion.comparison, criterion.number),
        operator: criterion.comparison.clone(),
    })?;

    let passed = comparator.compare(found, criterion.number);
    Ok(CriterionResult {
        search_string: criterion.search_string.clone(),
        found,
        comparator,
        number: criterion.number,
        passed,
        severity: if passed {
            Severity::OK
        } else {
            Severity(criterion.severity)
        },
    })
}

/// Severity evaluation over all active criteria.
#[derive(Debug, Clone)]
pub struct SeverityEvaluator<'a> {
    criteria: &'a [SearchCriterion],
    suppress_ok_output: bool,
}

impl<'a> SeverityEvaluator<'a> {
    pub fn new(criteria: &'a [SearchCriterion]) -> Self {
        Self {
            criteria,
            suppress_ok_output: false,
        }
    }

    pub fn suppress_ok_output(mut self, suppress: bool) -> Self {
        self.suppress_ok_output = suppress;
        self
    }

    /// Evaluates every active criterion, writing one status line per
    /// criterion (OK lines only unless suppressed) and the overall status line.
    pub fn evaluate<W: Write + ?Sized>(&self, buckets: &Buckets, out: &mut W) -> Result<Evaluation, CheckError> {
        let mut evaluation = Evaluation::default();

        for criterion in self.criteria.iter().filter(|c| c.is_active()) {
            let result = evaluate_criterion(criterion, buckets)?;
            if !result.passed || !self.suppress_ok_output {
                writeln!(out, "{}", result.status_line())?;
            }
            // Plain max over the raw values; a negative severity never lowers OK.
            if result.severity > evaluation.overall {
                evaluation.overall = result.severity;
            }
            evaluation.results.push(result);
        }

        writeln!(out, "# Status - {}", evaluation.overall.label())?;
        Ok(evaluation)
    }
}
