//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Case-set aggregates
// =============================================================================

/// Case-set aggregate header, including the raw archive payload.
///
/// The full row is only materialized for inserts and archive downloads;
/// listings use [`CaseSetSummaryRow`] to avoid dragging the payload around.
#[derive(Debug, Clone, FromRow)]
pub struct CaseSetRow {
    pub case_set_id: Uuid,
    pub set_name: String,
    pub set_version: String,
    /// Archive container format tag ("zip" or "tar.gz").
    pub format: String,
    /// Lowercase hex SHA-512 digest of the raw archive bytes.
    pub digest_hex: String,
    pub raw_archive: Vec<u8>,
    pub has_manifest: bool,
    pub has_script_dir: bool,
    pub case_count: i64,
    pub missing_script_count: i64,
    pub created_at: OffsetDateTime,
}

/// Case-set header without the archive payload.
#[derive(Debug, Clone, FromRow)]
pub struct CaseSetSummaryRow {
    pub case_set_id: Uuid,
    pub set_name: String,
    pub set_version: String,
    pub format: String,
    pub digest_hex: String,
    /// Size of the stored archive in bytes.
    pub archive_size: i64,
    pub has_manifest: bool,
    pub has_script_dir: bool,
    pub case_count: i64,
    pub missing_script_count: i64,
    pub created_at: OffsetDateTime,
}

/// One persisted test case row.
///
/// `position` preserves manifest row order within the set; `script_exists`
/// is the reconciliation flag computed at ingestion time.
#[derive(Debug, Clone, FromRow)]
pub struct CaseRow {
    pub case_set_id: Uuid,
    pub position: i32,
    pub case_name: String,
    pub case_number: String,
    pub network_topology: String,
    pub business_category: String,
    pub app_name: String,
    pub test_steps: String,
    pub expected_result: String,
    pub script_exists: bool,
}

// =============================================================================
// Software packages
// =============================================================================

/// Software package record, including the binary payload.
#[derive(Debug, Clone, FromRow)]
pub struct PackageRow {
    pub package_id: Uuid,
    /// Logical package name (the full upload file name, extension included).
    pub software_name: String,
    /// Target platform ("android" or "ios").
    pub platform: String,
    /// Package format tag ("apk" or "ipa").
    pub format: String,
    /// Lowercase hex SHA-512 digest of the payload, the dedup authority.
    pub digest_hex: String,
    pub size_bytes: i64,
    pub payload: Vec<u8>,
    pub created_at: OffsetDateTime,
}

/// Package record without the binary payload.
#[derive(Debug, Clone, FromRow)]
pub struct PackageSummaryRow {
    pub package_id: Uuid,
    pub software_name: String,
    pub platform: String,
    pub format: String,
    pub digest_hex: String,
    pub size_bytes: i64,
    pub created_at: OffsetDateTime,
}
