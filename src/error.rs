//! Error taxonomy for ingest, reshaping and classification.
//!
//! Structural problems (missing columns, empty input, bad thresholds) abort the
//! whole operation. Per-row timestamp failures are recovered by dropping the
//! row and are only surfaced as `UnparseableTimestamp` from the row parser;
//! the reshaper counts them in its report instead of returning them.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("invalid thresholds for {scope}: {reason}")]
    InvalidThreshold { scope: String, reason: String },

    #[error("line {line}: cannot parse timestamp '{raw}'")]
    UnparseableTimestamp { line: usize, raw: String },

    #[error("header does not match declared schema: unexpected columns [{}]", .unexpected.join(", "))]
    SchemaMismatch { unexpected: Vec<String> },

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DetectorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DetectorError>;
