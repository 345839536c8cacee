//! Error types for the check pipeline.
//!
//! `CheckError` covers everything that aborts a run with CRITICAL status.
//! `ProbeError` is the per-process, per-stat-group failure that the
//! aggregator recovers from by omitting the affected fields.

use std::io;

/// Fatal errors. Any of these ends the run with a CRITICAL status and no exposition.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("unable to evaluate expression {expression}: unknown comparison operator {operator:?}")]
    Comparator { expression: String, operator: String },

    #[error("failed to encode metric family {family}: {reason}")]
    Exposition { family: String, reason: String },

    #[error("failed to write check output: {0}")]
    Output(#[from] io::Error),

    #[error("failed to list processes under {root}: {source}")]
    Scan {
        root: String,
        #[source]
        source: io::Error,
    },
}

impl From<serde_json::Error> for CheckError {
    fn from(e: serde_json::Error) -> Self {
        CheckError::Configuration(format!("malformed search criteria: {e}"))
    }
}

/// Failure of a single stat probe for one process.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {what} from {path}")]
    Parse { what: &'static str, path: String },

    #[error("{what} not present in {path}")]
    Missing { what: &'static str, path: String },

    #[error("{0} is not available on this system")]
    Unsupported(&'static str),
}

impl ProbeError {
    pub(crate) fn io(path: impl Into<String>, source: io::Error) -> Self {
        ProbeError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(what: &'static str, path: impl Into<String>) -> Self {
        ProbeError::Parse {
            what,
            path: path.into(),
        }
    }

    pub(crate) fn missing(what: &'static str, path: impl Into<String>) -> Self {
        ProbeError::Missing {
            what,
            path: path.into(),
        }
    }
}
