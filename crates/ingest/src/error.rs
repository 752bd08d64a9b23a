//! Ingestion error types.

use thiserror::Error;

/// Errors raised while parsing uploaded archives and manifests.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The container could not be parsed (truncated header, bad magic bytes,
    /// inconsistent size fields).
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// The manifest payload is not a readable workbook, or has no sheets.
    #[error("invalid spreadsheet: {0}")]
    InvalidSpreadsheet(String),

    #[error(transparent)]
    Core(#[from] dialcenter_core::Error),
}

/// Result type for ingestion operations.
pub type IngestResult<T> = std::result::Result<T, IngestError>;
