//! Error types for loading experiment output files.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading or shaping an input file.
///
/// A file that does not exist is not an error: loaders report it as `Ok(None)`
/// so callers can warn and skip the affected series.
#[derive(Error, Debug)]
pub enum DataError {
    /// I/O error other than "not found"
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A token in a whitespace-delimited table is not a number
    #[error("{path}:{line}: cannot parse '{token}' as a number")]
    Parse {
        path: PathBuf,
        line: usize,
        token: String,
    },

    /// A row has a different column count than the first data row
    #[error("{path}:{line}: expected {expected} columns, found {found}")]
    Ragged {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A table has fewer columns than a consumer needs
    #[error("'{path}' has {found} columns, need at least {required}")]
    MissingColumn {
        path: PathBuf,
        required: usize,
        found: usize,
    },

    /// A map dump does not hold exactly N*N cells
    #[error("incorrect data length in '{path}': expected a {side}x{side} grid, found {found} rows")]
    GridSize {
        path: PathBuf,
        side: usize,
        found: usize,
    },

    /// CSV decoding failure (bad header, missing field, bad value)
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A value parsed but is not usable (negative thread count, etc.)
    #[error("{path}:{line}: {message}")]
    Invalid {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// Result alias for loader functions
pub type DataResult<T> = std::result::Result<T, DataError>;
