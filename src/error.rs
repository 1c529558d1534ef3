//! Error handling

use std::path::PathBuf;

pub type ShapeResult<T> = Result<T, ShapeError>;

#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    /// Caller passed an invalid parameter (e.g. k <= 0 for FPF).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Compressor failed on well-formed input. Indicates a corrupted
    /// prototype store; fatal.
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("prototype store error at {path}: {message}")]
    StoreError { path: PathBuf, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
