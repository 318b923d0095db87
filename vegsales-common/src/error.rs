//! Common error types for the sales pipeline

use thiserror::Error;

/// Common result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the pipeline crates
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or incomplete input record (rejects the whole batch)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Flat-file encoding error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected failure inside allocation or tagging
    #[error("Compute error: {0}")]
    Compute(String),
}

impl Error {
    /// True when the error was caused by the caller's input rather than the system
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
