//! Core domain types and shared logic for the DialCenter backend.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Content digests for package deduplication
//! - Upload file-name parsing (logical name, version, archive format)
//! - Test case records and script reconciliation
//! - Configuration types

pub mod case;
pub mod config;
pub mod digest;
pub mod error;
pub mod package;
pub mod reconcile;
pub mod upload;

pub use case::CaseRecord;
pub use digest::ContentDigest;
pub use error::{Error, Result};
pub use package::{PackageFileName, PackageFormat};
pub use reconcile::{
    ReconciliationResult, has_script_for_case, reconcile, script_file_name_for_case,
};
pub use upload::{ArchiveFormat, UploadFileName, check_payload_size};

/// Reserved manifest entry name inside a case-set archive.
pub const MANIFEST_FILE_NAME: &str = "cases.xlsx";

/// Reserved script directory prefix inside a case-set archive.
pub const SCRIPTS_DIR_PREFIX: &str = "scripts/";

/// File extension recognized for automation scripts.
pub const SCRIPT_EXTENSION: &str = ".py";

/// Default maximum case-set archive size: 100 MiB.
pub const DEFAULT_MAX_ARCHIVE_SIZE: u64 = 100 * 1024 * 1024;

/// Default maximum single package size: 500 MiB.
pub const DEFAULT_MAX_PACKAGE_SIZE: u64 = 500 * 1024 * 1024;

/// Default maximum batch-import archive size: 1 GiB.
pub const DEFAULT_MAX_IMPORT_ARCHIVE_SIZE: u64 = 1024 * 1024 * 1024;
