use std::path::PathBuf;

use polars::error::PolarsError;
use thiserror::Error;

use crate::cache::PayloadKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced by the cache, the assignment engine and the aggregator.
///
/// A cache miss and a source unit without overlap are not errors; they are
/// reported as `None` by the operations that produce them.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying storage could not be read or written.
    #[error("I/O failure on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache entry exists but cannot be decoded.
    #[error("cache entry {key:?} at {} is corrupt: {reason}", path.display())]
    Corrupt {
        key: String,
        path: PathBuf,
        reason: String,
    },

    /// A cache entry decoded fine but holds a different kind of payload.
    #[error("cache entry {key:?} holds a {found} payload, expected {expected}")]
    SchemaMismatch {
        key: String,
        expected: PayloadKind,
        found: PayloadKind,
    },

    #[error("coordinate reference systems differ: source is {source_crs}, target is {target_crs}")]
    CrsMismatch {
        source_crs: String,
        target_crs: String,
    },

    #[error("column {column:?} is missing from the {table} table")]
    MissingColumn {
        column: String,
        table: &'static str,
    },

    #[error("column {column:?} has non-numeric type {dtype}")]
    NonNumericColumn {
        column: String,
        dtype: String,
    },

    /// Integer values or their sums do not fit in 64-bit signed integers.
    #[error("column {column:?} overflows 64-bit integer sums")]
    Overflow {
        column: String,
    },

    /// An assignment was applied to tables it was not computed for.
    #[error("assignment does not fit the tables: {0}")]
    AssignmentMismatch(String),

    #[error("duplicate unit identifier {0:?}")]
    DuplicateId(String),

    #[error("invalid table: {0}")]
    InvalidTable(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
