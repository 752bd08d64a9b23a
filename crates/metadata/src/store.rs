//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult, constraint_violation};
use crate::repos::{CaseRepo, CaseSetRepo, PackageRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: CaseSetRepo + CaseRepo + PackageRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store, running migrations.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under test/axum concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Summary columns shared by the list/get queries; the archive payload stays
// in the database and only its size is reported.
const CASE_SET_SUMMARY_COLUMNS: &str = "case_set_id, set_name, set_version, format, digest_hex, \
     length(raw_archive) AS archive_size, has_manifest, has_script_dir, \
     case_count, missing_script_count, created_at";

// Implement the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use crate::repos::PackageDedup;
    use uuid::Uuid;

    #[async_trait]
    impl CaseSetRepo for SqliteStore {
        async fn exists_by_name_and_version(
            &self,
            name: &str,
            version: &str,
        ) -> MetadataResult<bool> {
            let row: Option<(i32,)> = sqlx::query_as(
                "SELECT 1 FROM case_sets WHERE set_name = ? AND set_version = ?",
            )
            .bind(name)
            .bind(version)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.is_some())
        }

        async fn find_by_name_and_version(
            &self,
            name: &str,
            version: &str,
        ) -> MetadataResult<Option<CaseSetSummaryRow>> {
            let query = format!(
                "SELECT {CASE_SET_SUMMARY_COLUMNS} FROM case_sets \
                 WHERE set_name = ? AND set_version = ?"
            );
            let row = sqlx::query_as::<_, CaseSetSummaryRow>(&query)
                .bind(name)
                .bind(version)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn insert_case_set(
            &self,
            header: &CaseSetRow,
            cases: &[CaseRow],
        ) -> MetadataResult<()> {
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                r#"
                INSERT INTO case_sets (
                    case_set_id, set_name, set_version, format, digest_hex,
                    raw_archive, has_manifest, has_script_dir, case_count,
                    missing_script_count, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(header.case_set_id)
            .bind(&header.set_name)
            .bind(&header.set_version)
            .bind(&header.format)
            .bind(&header.digest_hex)
            .bind(&header.raw_archive)
            .bind(header.has_manifest)
            .bind(header.has_script_dir)
            .bind(header.case_count)
            .bind(header.missing_script_count)
            .bind(header.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                constraint_violation(
                    e,
                    &format!(
                        "case set {} {} already exists",
                        header.set_name, header.set_version
                    ),
                )
            })?;

            for case in cases {
                sqlx::query(
                    r#"
                    INSERT INTO cases (
                        case_set_id, position, case_name, case_number,
                        network_topology, business_category, app_name,
                        test_steps, expected_result, script_exists
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(case.case_set_id)
                .bind(case.position)
                .bind(&case.case_name)
                .bind(&case.case_number)
                .bind(&case.network_topology)
                .bind(&case.business_category)
                .bind(&case.app_name)
                .bind(&case.test_steps)
                .bind(&case.expected_result)
                .bind(case.script_exists)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            Ok(())
        }

        async fn list_case_sets(&self) -> MetadataResult<Vec<CaseSetSummaryRow>> {
            let query = format!(
                "SELECT {CASE_SET_SUMMARY_COLUMNS} FROM case_sets ORDER BY created_at DESC"
            );
            let rows = sqlx::query_as::<_, CaseSetSummaryRow>(&query)
                .fetch_all(&self.pool)
                .await?;
            Ok(rows)
        }

        async fn get_case_set(
            &self,
            case_set_id: Uuid,
        ) -> MetadataResult<Option<CaseSetSummaryRow>> {
            let query = format!(
                "SELECT {CASE_SET_SUMMARY_COLUMNS} FROM case_sets WHERE case_set_id = ?"
            );
            let row = sqlx::query_as::<_, CaseSetSummaryRow>(&query)
                .bind(case_set_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn get_case_set_archive(
            &self,
            case_set_id: Uuid,
        ) -> MetadataResult<Option<CaseSetRow>> {
            let row = sqlx::query_as::<_, CaseSetRow>(
                "SELECT * FROM case_sets WHERE case_set_id = ?",
            )
            .bind(case_set_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn delete_case_set(&self, case_set_id: Uuid) -> MetadataResult<()> {
            // Rows then header; if either fails, both roll back.
            let mut tx = self.pool.begin().await?;

            sqlx::query("DELETE FROM cases WHERE case_set_id = ?")
                .bind(case_set_id)
                .execute(&mut *tx)
                .await?;

            let result = sqlx::query("DELETE FROM case_sets WHERE case_set_id = ?")
                .bind(case_set_id)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "case set {case_set_id} not found"
                )));
            }

            tx.commit().await?;
            Ok(())
        }
    }

    #[async_trait]
    impl CaseRepo for SqliteStore {
        async fn list_cases(&self, case_set_id: Uuid) -> MetadataResult<Vec<CaseRow>> {
            let rows = sqlx::query_as::<_, CaseRow>(
                "SELECT * FROM cases WHERE case_set_id = ? ORDER BY position",
            )
            .bind(case_set_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn list_missing_script_cases(
            &self,
            case_set_id: Uuid,
        ) -> MetadataResult<Vec<CaseRow>> {
            let rows = sqlx::query_as::<_, CaseRow>(
                "SELECT * FROM cases WHERE case_set_id = ? AND script_exists = 0 ORDER BY position",
            )
            .bind(case_set_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn count_missing_scripts(&self, case_set_id: Uuid) -> MetadataResult<u64> {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM cases WHERE case_set_id = ? AND script_exists = 0",
            )
            .bind(case_set_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(count as u64)
        }
    }

    #[async_trait]
    impl PackageRepo for SqliteStore {
        async fn check_duplicate(
            &self,
            software_name: &str,
            digest_hex: &str,
        ) -> MetadataResult<PackageDedup> {
            let by_file_name: Option<(i32,)> =
                sqlx::query_as("SELECT 1 FROM packages WHERE software_name = ?")
                    .bind(software_name)
                    .fetch_optional(&self.pool)
                    .await?;
            let by_digest: Option<(i32,)> =
                sqlx::query_as("SELECT 1 FROM packages WHERE digest_hex = ?")
                    .bind(digest_hex)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(PackageDedup {
                by_file_name: by_file_name.is_some(),
                by_digest: by_digest.is_some(),
            })
        }

        async fn insert_package(&self, package: &PackageRow) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO packages (
                    package_id, software_name, platform, format, digest_hex,
                    size_bytes, payload, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(package.package_id)
            .bind(&package.software_name)
            .bind(&package.platform)
            .bind(&package.format)
            .bind(&package.digest_hex)
            .bind(package.size_bytes)
            .bind(&package.payload)
            .bind(package.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                constraint_violation(
                    e,
                    &format!("package {} already exists", package.software_name),
                )
            })?;
            Ok(())
        }

        async fn list_packages(&self) -> MetadataResult<Vec<PackageSummaryRow>> {
            let rows = sqlx::query_as::<_, PackageSummaryRow>(
                "SELECT package_id, software_name, platform, format, digest_hex, \
                 size_bytes, created_at FROM packages ORDER BY created_at DESC",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn get_package(
            &self,
            package_id: Uuid,
        ) -> MetadataResult<Option<PackageSummaryRow>> {
            let row = sqlx::query_as::<_, PackageSummaryRow>(
                "SELECT package_id, software_name, platform, format, digest_hex, \
                 size_bytes, created_at FROM packages WHERE package_id = ?",
            )
            .bind(package_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn get_package_payload(
            &self,
            package_id: Uuid,
        ) -> MetadataResult<Option<PackageRow>> {
            let row =
                sqlx::query_as::<_, PackageRow>("SELECT * FROM packages WHERE package_id = ?")
                    .bind(package_id)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(row)
        }

        async fn delete_package(&self, package_id: Uuid) -> MetadataResult<()> {
            let result = sqlx::query("DELETE FROM packages WHERE package_id = ?")
                .bind(package_id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "package {package_id} not found"
                )));
            }
            Ok(())
        }
    }
}

impl std::convert::From<std::io::Error> for MetadataError {
    fn from(e: std::io::Error) -> Self {
        MetadataError::Config(e.to_string())
    }
}

const SCHEMA_SQL: &str = r#"
-- Case-set aggregates
CREATE TABLE IF NOT EXISTS case_sets (
    case_set_id BLOB PRIMARY KEY,
    set_name TEXT NOT NULL,
    set_version TEXT NOT NULL,
    format TEXT NOT NULL,
    digest_hex TEXT NOT NULL,
    raw_archive BLOB NOT NULL,
    has_manifest INTEGER NOT NULL DEFAULT 0,
    has_script_dir INTEGER NOT NULL DEFAULT 0,
    case_count INTEGER NOT NULL DEFAULT 0,
    missing_script_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
-- Final backstop for concurrent uploads of the same set: the application's
-- existence check and insert are not atomic.
CREATE UNIQUE INDEX IF NOT EXISTS idx_case_sets_name_version ON case_sets(set_name, set_version);
CREATE INDEX IF NOT EXISTS idx_case_sets_created ON case_sets(created_at);

-- Case rows
CREATE TABLE IF NOT EXISTS cases (
    case_set_id BLOB NOT NULL,
    position INTEGER NOT NULL,
    case_name TEXT NOT NULL,
    case_number TEXT NOT NULL,
    network_topology TEXT NOT NULL DEFAULT '',
    business_category TEXT NOT NULL DEFAULT '',
    app_name TEXT NOT NULL DEFAULT '',
    test_steps TEXT NOT NULL DEFAULT '',
    expected_result TEXT NOT NULL DEFAULT '',
    script_exists INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (case_set_id, position),
    FOREIGN KEY (case_set_id) REFERENCES case_sets(case_set_id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_cases_missing ON cases(case_set_id, script_exists);

-- Software packages
CREATE TABLE IF NOT EXISTS packages (
    package_id BLOB PRIMARY KEY,
    software_name TEXT NOT NULL UNIQUE,
    platform TEXT NOT NULL,
    format TEXT NOT NULL,
    digest_hex TEXT NOT NULL UNIQUE,
    size_bytes INTEGER NOT NULL,
    payload BLOB NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_packages_created ON packages(created_at);
"#;
