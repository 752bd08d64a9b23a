//! HTTP API server for the DialCenter backend.
//!
//! This crate provides the HTTP control plane:
//! - Case-set upload with ingestion and reconciliation
//! - Case-set queries, archive download, and deletion
//! - Software package upload with dual dedup checks
//! - Batch package import from an archive

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
