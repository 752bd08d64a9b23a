//! Case-set aggregate repository trait.

use crate::error::MetadataResult;
use crate::models::{CaseRow, CaseSetRow, CaseSetSummaryRow};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for case-set aggregates (header plus child case rows).
#[async_trait]
pub trait CaseSetRepo: Send + Sync {
    /// Whether a case set with this name and version already exists.
    async fn exists_by_name_and_version(&self, name: &str, version: &str)
    -> MetadataResult<bool>;

    /// Get a case set's summary by name and version.
    async fn find_by_name_and_version(
        &self,
        name: &str,
        version: &str,
    ) -> MetadataResult<Option<CaseSetSummaryRow>>;

    /// Insert a case-set header and all its case rows in one transaction.
    ///
    /// Either the header and every case row are persisted, or nothing is.
    /// A concurrent insert of the same (name, version) surfaces as a
    /// constraint violation from the unique index.
    async fn insert_case_set(
        &self,
        header: &CaseSetRow,
        cases: &[CaseRow],
    ) -> MetadataResult<()>;

    /// List all case sets, newest first.
    async fn list_case_sets(&self) -> MetadataResult<Vec<CaseSetSummaryRow>>;

    /// Get a case set's summary by ID.
    async fn get_case_set(&self, case_set_id: Uuid) -> MetadataResult<Option<CaseSetSummaryRow>>;

    /// Get a case set including its raw archive payload.
    async fn get_case_set_archive(&self, case_set_id: Uuid)
    -> MetadataResult<Option<CaseSetRow>>;

    /// Delete a case set and all its case rows in one transaction.
    async fn delete_case_set(&self, case_set_id: Uuid) -> MetadataResult<()>;
}
