//! Error types for mcf-rec
//!
//! Loader, catalog and engine failures are hard errors returned to the
//! immediate caller. Scoring failures inside `recommend` are not represented
//! here; the engine downgrades them to an empty result.

use crate::model::ModelError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for mcf-rec
#[derive(Error, Debug)]
pub enum Error {
    /// Input file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Required header fields absent
    #[error("Schema error in {}: missing field(s) {missing:?} (available: {available:?})", .path.display())]
    Schema {
        path: PathBuf,
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// A row or value could not be coerced
    #[error("Parse error in {}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        /// 1-based line of the offending row, when one row is to blame
        line: Option<u64>,
        message: String,
    },

    /// Artist catalog used before a successful load
    #[error("Artist catalog not loaded; call load() first")]
    NotLoaded,

    /// Engine used before fit
    #[error("Recommendation engine has not been fitted yet")]
    NotFitted,

    /// User id outside the trained matrix rows
    #[error("user_id {user_id} is out of bounds (matrix has {rows} users)")]
    OutOfRange { user_id: i64, rows: usize },

    /// Training failure reported by the factorization model
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// mcf-common error
    #[error("Common error: {0}")]
    Common(#[from] mcf_common::Error),
}

/// Convenience Result type using mcf-rec Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn parse(path: &Path, line: Option<u64>, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Map a csv reader failure onto the taxonomy
    ///
    /// I/O failures stay I/O errors; everything else (bad UTF-8 in a header,
    /// unequal field counts) is a parse error at the reported position.
    pub(crate) fn from_csv(path: &Path, err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line());
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => Error::Io(io),
            _ => Error::parse(path, line, message),
        }
    }
}
