//! Common error types for MCF

use thiserror::Error;

/// Common result type for MCF operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by MCF crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested file or resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
