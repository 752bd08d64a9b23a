//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    #[error("uploaded file is empty")]
    EmptyUpload,

    #[error("uploaded file is too large: {size} bytes (limit {max})")]
    UploadTooLarge { size: u64, max: u64 },

    #[error("invalid digest: {0}")]
    InvalidDigest(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
