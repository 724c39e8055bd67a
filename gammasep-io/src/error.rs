//! I/O error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The hit record source could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// Malformed text record.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Chart rendering error.
    #[error("render error: {0}")]
    Render(String),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] gammasep_core::Error),
}
