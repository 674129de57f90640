//! Error types produced by the metadata crate.
//!
//! Every variant is a boot-time failure: the store is loaded once and a
//! broken source stops the service from becoming ready. Lookups never fail,
//! a missing id is reported as `None`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the metadata source.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The CSV file could not be opened or read.
    #[error("failed to read metadata source {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The header row lacks one of the required columns.
    #[error("metadata source is missing required column '{0}'")]
    MissingColumn(&'static str),
    /// A row could not be parsed.
    #[error("malformed metadata row {line}: {reason}")]
    Malformed { line: u64, reason: String },
    /// A row carries an empty identifier.
    #[error("empty paper id on line {0}")]
    EmptyId(u64),
    /// The same identifier appears on more than one row.
    #[error("duplicate paper id '{id}' on line {line}")]
    DuplicateId { id: String, line: u64 },
}

impl MetadataError {
    pub(crate) fn from_csv(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(source) => MetadataError::Malformed {
                line,
                reason: source.to_string(),
            },
            csv::ErrorKind::Utf8 { err, .. } => MetadataError::Malformed {
                line,
                reason: format!("invalid utf-8: {err}"),
            },
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => MetadataError::Malformed {
                line,
                reason: format!("expected {expected_len} fields, found {len}"),
            },
            csv::ErrorKind::Deserialize { err, .. } => MetadataError::Malformed {
                line,
                reason: err.to_string(),
            },
            other => MetadataError::Malformed {
                line,
                reason: format!("{other:?}"),
            },
        }
    }
}
