//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dialcenter_ingest::IngestError;
use dialcenter_metadata::MetadataError;
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("case set {name} {version} already exists; pass overwrite=true to replace it")]
    DuplicateNameVersion { name: String, version: String },

    #[error("a package named {0} already exists")]
    DuplicateFileName(String),

    #[error("a package with identical content already exists: {0}")]
    DuplicateContent(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("{0}")]
    Core(#[from] dialcenter_core::Error),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::DuplicateNameVersion { .. } => "duplicate_name_version",
            Self::DuplicateFileName(_) => "duplicate_file_name",
            Self::DuplicateContent(_) => "duplicate_content",
            Self::Internal(_) => "internal_error",
            Self::Metadata(e) => match e {
                MetadataError::NotFound(_) => "not_found",
                MetadataError::AlreadyExists(_) | MetadataError::Constraint(_) => "conflict",
                _ => "metadata_error",
            },
            Self::Ingest(e) => match e {
                IngestError::CorruptArchive(_) => "corrupt_archive",
                IngestError::InvalidSpreadsheet(_) => "invalid_spreadsheet",
                IngestError::Core(e) => core_error_code(e),
            },
            Self::Core(e) => core_error_code(e),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateNameVersion { .. } => StatusCode::CONFLICT,
            Self::DuplicateFileName(_) => StatusCode::CONFLICT,
            Self::DuplicateContent(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Metadata(e) => match e {
                MetadataError::NotFound(_) => StatusCode::NOT_FOUND,
                MetadataError::AlreadyExists(_) | MetadataError::Constraint(_) => {
                    StatusCode::CONFLICT
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Ingest(IngestError::Core(e)) | Self::Core(e) => core_status_code(e),
            Self::Ingest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

fn core_error_code(e: &dialcenter_core::Error) -> &'static str {
    match e {
        dialcenter_core::Error::UnsupportedFormat(_) => "unsupported_format",
        dialcenter_core::Error::InvalidFileName(_) => "invalid_file_name",
        dialcenter_core::Error::EmptyUpload => "empty_upload",
        dialcenter_core::Error::UploadTooLarge { .. } => "upload_too_large",
        dialcenter_core::Error::InvalidDigest(_) => "invalid_digest",
    }
}

fn core_status_code(e: &dialcenter_core::Error) -> StatusCode {
    match e {
        dialcenter_core::Error::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
