//! Typed failure kinds shared by the extraction and analysis tools.
//!
//! Per-file failures during batch log scanning are collected and reported
//! after the batch; everything else propagates to the CLI and exits non-zero.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the gramplex library.
#[derive(Debug, Error)]
pub enum Error {
    /// An expected marker or pattern was absent from a log file.
    #[error("parse error: {0}")]
    Parse(String),

    /// An expected column was missing from a table.
    #[error("schema error: missing column '{column}' in {table}")]
    Schema { column: String, table: String },

    /// Fewer rows than a statistic requires.
    #[error("insufficient data: need at least {needed} rows, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A filename does not match the expected naming convention.
    #[error("naming error: {path}: {reason}")]
    Naming { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Shorthand for [`Error::Parse`].
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
