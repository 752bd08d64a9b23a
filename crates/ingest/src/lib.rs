//! Archive and manifest ingestion for the DialCenter backend.
//!
//! This crate turns raw uploaded archive bytes into structured case-set
//! data:
//! - Forward-only entry scanning over ZIP and TAR+GZIP containers
//! - Manifest and script-name extraction
//! - Manifest spreadsheet parsing
//! - The pipeline assembling a persistable case-set aggregate

pub mod archive;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod spreadsheet;

pub use archive::{ArchiveEntry, ScanControl, scan_entries};
pub use error::{IngestError, IngestResult};
pub use extract::{ArchiveStructure, extract_manifest, extract_script_names, validate_structure};
pub use pipeline::{IngestedCase, IngestedCaseSet, ingest_case_set};
pub use spreadsheet::{CellValue, parse_manifest};
