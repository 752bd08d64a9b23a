//! Test case row repository trait.

use crate::error::MetadataResult;
use crate::models::CaseRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for the case rows belonging to a case set.
#[async_trait]
pub trait CaseRepo: Send + Sync {
    /// List a set's case rows in manifest order.
    async fn list_cases(&self, case_set_id: Uuid) -> MetadataResult<Vec<CaseRow>>;

    /// List a set's case rows that have no matching script, in manifest order.
    async fn list_missing_script_cases(&self, case_set_id: Uuid)
    -> MetadataResult<Vec<CaseRow>>;

    /// Count a set's case rows that have no matching script.
    async fn count_missing_scripts(&self, case_set_id: Uuid) -> MetadataResult<u64>;
}
