//! One check run: scan, classify, evaluate, aggregate and render.

use std::io::Write;

use tracing::{debug, info};

use crate::config::CheckOptions;
use crate::criteria::Severity;
use crate::error::CheckError;
use crate::evaluate::SeverityEvaluator;
use crate::exposition;
use crate::metrics::MetricsAggregator;
use crate::process::{ClassifyOutcome, Classifier, ProcessProbe, ProcessRecord, ProcessSource};

/// Status line written when zombie fail-fast mode stops the scan.
pub fn zombie_status_line(record: &ProcessRecord) -> String {
    format!(
        "# {:<8} | zombie process {:?} found with pid {}",
        Severity::CRITICAL.label(),
        record.name,
        record.pid
    )
}

/// Runs the check once and writes status lines and exposition to `out`.
///
/// Returns the overall severity. Any error is fatal to the run; the
/// exposition is only written once every family rendered successfully.
pub fn run_check<W>(
    opts: &CheckOptions,
    source: &dyn ProcessSource,
    probe: &dyn ProcessProbe,
    timestamp_ms: i64,
    out: &mut W,
) -> Result<Severity, CheckError>
where
    W: Write + ?Sized,
{
    let records = source.processes()?;
    debug!("Received {} process records", records.len());

    let classifier = Classifier::new(&opts.criteria, opts.self_pid).with_zombie_fail_fast(opts.zombie_fail_fast);
    let buckets = match classifier.classify(records) {
        ClassifyOutcome::Buckets(buckets) => buckets,
        ClassifyOutcome::Zombie(record) => {
            writeln!(out, "{}", zombie_status_line(&record))?;
            writeln!(out, "# Status - {}", Severity::CRITICAL.label())?;
            return Ok(Severity::CRITICAL);
        }
    };
    debug!(
        "Classified {} processes into {} buckets",
        buckets.total_processes(),
        buckets.len()
    );

    let severity = if opts.metrics_only {
        Severity::OK
    } else {
        SeverityEvaluator::new(&opts.criteria)
            .suppress_ok_output(opts.suppress_ok_output)
            .evaluate(&buckets, out)?
            .overall
    };

    let aggregated = MetricsAggregator::new(probe, opts.host_name.clone(), timestamp_ms).aggregate(&buckets);
    info!(
        "Aggregated {} processes, {} threads",
        aggregated.total_processes, aggregated.total_threads
    );

    let text = exposition::render(aggregated.families())?;
    out.write_all(text.as_bytes())?;
    out.flush()?;

    Ok(severity)
}
