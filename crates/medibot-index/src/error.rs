//! Error types for medibot-index.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for medibot-index operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, loading or querying an index.
#[derive(Error, Debug)]
pub enum Error {
    /// The index directory (or one of its files) does not exist.
    #[error("Index not found at {0}")]
    NotFound(PathBuf),

    /// The index already exists and overwriting was not requested.
    #[error("Index already exists at {0}")]
    AlreadyExists(PathBuf),

    /// Dimension mismatch between a vector and the index.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions.
        expected: usize,
        /// Actual dimensions provided.
        actual: usize,
    },

    /// Invalid vector (e.g., empty, contains NaN).
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// The on-disk data is unreadable or inconsistent.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
