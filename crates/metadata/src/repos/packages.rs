//! Software package repository trait.

use crate::error::MetadataResult;
use crate::models::{PackageRow, PackageSummaryRow};
use async_trait::async_trait;
use uuid::Uuid;

/// Outcome of the two independent package dedup checks.
///
/// File-name and content-digest collisions are distinct conditions; either
/// one alone is sufficient grounds for rejecting an upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageDedup {
    /// A package with the same file name already exists.
    pub by_file_name: bool,
    /// A package with identical content already exists.
    pub by_digest: bool,
}

impl PackageDedup {
    /// True when either uniqueness check collides.
    pub fn is_duplicate(&self) -> bool {
        self.by_file_name || self.by_digest
    }
}

/// Repository for uploaded software packages.
#[async_trait]
pub trait PackageRepo: Send + Sync {
    /// Run both dedup checks for a candidate upload.
    async fn check_duplicate(
        &self,
        software_name: &str,
        digest_hex: &str,
    ) -> MetadataResult<PackageDedup>;

    /// Insert a package record.
    async fn insert_package(&self, package: &PackageRow) -> MetadataResult<()>;

    /// List all packages, newest first.
    async fn list_packages(&self) -> MetadataResult<Vec<PackageSummaryRow>>;

    /// Get a package's summary by ID.
    async fn get_package(&self, package_id: Uuid) -> MetadataResult<Option<PackageSummaryRow>>;

    /// Get a package including its binary payload.
    async fn get_package_payload(&self, package_id: Uuid)
    -> MetadataResult<Option<PackageRow>>;

    /// Delete a package by ID.
    async fn delete_package(&self, package_id: Uuid) -> MetadataResult<()>;
}
