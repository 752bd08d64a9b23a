//! PostgreSQL-based metadata store implementation.

use crate::error::{MetadataError, MetadataResult, constraint_violation};
use crate::models::*;
use crate::repos::{CaseRepo, CaseSetRepo, PackageDedup, PackageRepo};
use crate::store::MetadataStore;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use uuid::Uuid;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

// Summary columns shared by the list/get queries. Postgres length() returns
// INTEGER, so the archive size is cast to match the row type.
const CASE_SET_SUMMARY_COLUMNS: &str = "case_set_id, set_name, set_version, format, digest_hex, \
     length(raw_archive)::bigint AS archive_size, has_manifest, has_script_dir, \
     case_count, missing_script_count, created_at";

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(url: &str, max_connections: u32) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections).await
    }

    /// Create a new PostgreSQL store from individual connection parameters.
    ///
    /// This allows credentials to be passed separately, enabling better
    /// secret management (e.g., passwords via environment variables).
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        max_connections: u32,
    ) -> MetadataResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        // Log connection info without password
        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            "Connecting to PostgreSQL with individual parameters"
        );

        Self::connect(opts, max_connections).await
    }

    async fn connect(opts: PgConnectOptions, max_connections: u32) -> MetadataResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn migrate(&self) -> MetadataResult<()> {
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CaseSetRepo for PostgresStore {
    async fn exists_by_name_and_version(
        &self,
        name: &str,
        version: &str,
    ) -> MetadataResult<bool> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM case_sets WHERE set_name = $1 AND set_version = $2",
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
             WHERE set_name = $1 AND set_version = $2"
        );
        let row = sqlx::query_as::<_, CaseSetSummaryRow>(&query)
            .bind(name)
            .bind(version)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_case_set(&self, header: &CaseSetRow, cases: &[CaseRow]) -> MetadataResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO case_sets (
                case_set_id, set_name, set_version, format, digest_hex,
                raw_archive, has_manifest, has_script_dir, case_count,
                missing_script_count, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
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
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
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

    async fn get_case_set(&self, case_set_id: Uuid) -> MetadataResult<Option<CaseSetSummaryRow>> {
        let query =
            format!("SELECT {CASE_SET_SUMMARY_COLUMNS} FROM case_sets WHERE case_set_id = $1");
        let row = sqlx::query_as::<_, CaseSetSummaryRow>(&query)
            .bind(case_set_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_case_set_archive(&self, case_set_id: Uuid) -> MetadataResult<Option<CaseSetRow>> {
        let row =
            sqlx::query_as::<_, CaseSetRow>("SELECT * FROM case_sets WHERE case_set_id = $1")
                .bind(case_set_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn delete_case_set(&self, case_set_id: Uuid) -> MetadataResult<()> {
        // Rows then header; if either fails, both roll back.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cases WHERE case_set_id = $1")
            .bind(case_set_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM case_sets WHERE case_set_id = $1")
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
impl CaseRepo for PostgresStore {
    async fn list_cases(&self, case_set_id: Uuid) -> MetadataResult<Vec<CaseRow>> {
        let rows = sqlx::query_as::<_, CaseRow>(
            "SELECT * FROM cases WHERE case_set_id = $1 ORDER BY position",
        )
        .bind(case_set_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_missing_script_cases(&self, case_set_id: Uuid) -> MetadataResult<Vec<CaseRow>> {
        let rows = sqlx::query_as::<_, CaseRow>(
            "SELECT * FROM cases WHERE case_set_id = $1 AND script_exists = FALSE ORDER BY position",
        )
        .bind(case_set_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_missing_scripts(&self, case_set_id: Uuid) -> MetadataResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cases WHERE case_set_id = $1 AND script_exists = FALSE",
        )
        .bind(case_set_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl PackageRepo for PostgresStore {
    async fn check_duplicate(
        &self,
        software_name: &str,
        digest_hex: &str,
    ) -> MetadataResult<PackageDedup> {
        let by_file_name: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM packages WHERE software_name = $1")
                .bind(software_name)
                .fetch_optional(&self.pool)
                .await?;
        let by_digest: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM packages WHERE digest_hex = $1")
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
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
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

    async fn get_package(&self, package_id: Uuid) -> MetadataResult<Option<PackageSummaryRow>> {
        let row = sqlx::query_as::<_, PackageSummaryRow>(
            "SELECT package_id, software_name, platform, format, digest_hex, \
             size_bytes, created_at FROM packages WHERE package_id = $1",
        )
        .bind(package_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_package_payload(&self, package_id: Uuid) -> MetadataResult<Option<PackageRow>> {
        let row = sqlx::query_as::<_, PackageRow>("SELECT * FROM packages WHERE package_id = $1")
            .bind(package_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_package(&self, package_id: Uuid) -> MetadataResult<()> {
        let result = sqlx::query("DELETE FROM packages WHERE package_id = $1")
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
