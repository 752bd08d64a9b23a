//! Software package endpoints: upload with dual dedup, batch import,
//! queries, download, deletion.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::format_timestamp;
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use dialcenter_core::{ArchiveFormat, ContentDigest, PackageFileName, check_payload_size};
use dialcenter_ingest::{ScanControl, scan_entries};
use dialcenter_metadata::models::{PackageRow, PackageSummaryRow};
use dialcenter_metadata::repos::PackageRepo;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Query parameters for the package upload endpoint.
#[derive(Debug, Deserialize)]
pub struct UploadPackageParams {
    /// Original upload file name; used verbatim as the package name.
    pub file_name: String,
}

/// Package record as returned by upload/list/get.
#[derive(Debug, Serialize)]
pub struct PackageResponse {
    pub package_id: String,
    pub software_name: String,
    pub platform: String,
    pub format: String,
    pub digest: String,
    pub size_bytes: i64,
    pub created_at: String,
}

/// List response wrapper.
#[derive(Debug, Serialize)]
pub struct ListPackagesResponse {
    pub packages: Vec<PackageResponse>,
}

/// One entry skipped during a batch import.
#[derive(Debug, Serialize)]
pub struct SkippedImportEntry {
    pub file_name: String,
    pub reason: String,
}

/// Batch import response.
#[derive(Debug, Serialize)]
pub struct ImportPackagesResponse {
    pub imported: Vec<PackageResponse>,
    pub skipped: Vec<SkippedImportEntry>,
}

fn package_response(row: PackageSummaryRow) -> ApiResult<PackageResponse> {
    Ok(PackageResponse {
        package_id: row.package_id.to_string(),
        software_name: row.software_name,
        platform: row.platform,
        format: row.format,
        digest: row.digest_hex,
        size_bytes: row.size_bytes,
        created_at: format_timestamp(row.created_at)?,
    })
}

fn parse_package_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("invalid package ID: {e}")))
}

/// Persist one validated package payload.
async fn store_package(
    state: &AppState,
    file_name: &PackageFileName,
    digest: &ContentDigest,
    payload: &[u8],
) -> ApiResult<PackageResponse> {
    let package_id = Uuid::new_v4();
    let now = OffsetDateTime::now_utc();
    let row = PackageRow {
        package_id,
        software_name: file_name.software_name().to_string(),
        platform: file_name.format().platform().to_string(),
        format: file_name.format().as_str().to_string(),
        digest_hex: digest.to_hex(),
        size_bytes: payload.len() as i64,
        payload: payload.to_vec(),
        created_at: now,
    };
    state.metadata.insert_package(&row).await?;

    Ok(PackageResponse {
        package_id: package_id.to_string(),
        software_name: row.software_name,
        platform: row.platform,
        format: row.format,
        digest: row.digest_hex,
        size_bytes: row.size_bytes,
        created_at: format_timestamp(now)?,
    })
}

/// POST /v1/packages - Upload a single software package.
///
/// Two independent uniqueness checks run before the insert: an exact
/// file-name collision and an exact content collision. Either alone rejects
/// the upload, and the two are reported as distinct error conditions.
pub async fn upload_package(
    State(state): State<AppState>,
    Query(params): Query<UploadPackageParams>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<PackageResponse>)> {
    check_payload_size(body.len() as u64, state.config.ingest.max_package_size)?;
    let file_name = PackageFileName::parse(&params.file_name)?;

    let digest = ContentDigest::compute(&body);
    let dedup = state
        .metadata
        .check_duplicate(file_name.software_name(), &digest.to_hex())
        .await?;
    if dedup.by_file_name {
        return Err(ApiError::DuplicateFileName(
            file_name.software_name().to_string(),
        ));
    }
    if dedup.by_digest {
        return Err(ApiError::DuplicateContent(
            file_name.software_name().to_string(),
        ));
    }

    let response = store_package(&state, &file_name, &digest, &body).await?;
    tracing::info!(
        software_name = %response.software_name,
        platform = %response.platform,
        size = response.size_bytes,
        "package uploaded"
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /v1/packages/import - Batch import packages from a ZIP archive.
///
/// Every non-directory entry carrying a recognized package extension becomes
/// a candidate; duplicates and empty entries are skipped with a warning
/// rather than failing the whole batch.
pub async fn import_packages(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ImportPackagesResponse>> {
    check_payload_size(
        body.len() as u64,
        state.config.ingest.max_import_archive_size,
    )?;

    // Collect candidates in one forward scan; dedup and insert run after,
    // since the scan callback is synchronous.
    let mut candidates: Vec<(PackageFileName, Vec<u8>)> = Vec::new();
    scan_entries(&body, ArchiveFormat::Zip, |entry| {
        if entry.is_dir() {
            return Ok(ScanControl::Continue);
        }
        let base_name = entry.name().rsplit('/').next().unwrap_or(entry.name());
        if let Ok(file_name) = PackageFileName::parse(base_name) {
            let content = entry.read_content()?;
            candidates.push((file_name, content));
        }
        Ok(ScanControl::Continue)
    })?;

    let mut imported = Vec::new();
    let mut skipped = Vec::new();
    for (file_name, content) in candidates {
        if content.is_empty() {
            tracing::warn!(
                software_name = file_name.software_name(),
                "skipping empty package entry in import archive"
            );
            skipped.push(SkippedImportEntry {
                file_name: file_name.software_name().to_string(),
                reason: "empty entry".to_string(),
            });
            continue;
        }

        let digest = ContentDigest::compute(&content);
        let dedup = state
            .metadata
            .check_duplicate(file_name.software_name(), &digest.to_hex())
            .await?;
        if dedup.is_duplicate() {
            let reason = if dedup.by_file_name {
                "duplicate file name"
            } else {
                "duplicate content"
            };
            tracing::warn!(
                software_name = file_name.software_name(),
                reason,
                "skipping duplicate package in import archive"
            );
            skipped.push(SkippedImportEntry {
                file_name: file_name.software_name().to_string(),
                reason: reason.to_string(),
            });
            continue;
        }

        let response = store_package(&state, &file_name, &digest, &content).await?;
        imported.push(response);
    }

    tracing::info!(
        imported = imported.len(),
        skipped = skipped.len(),
        "package import finished"
    );
    Ok(Json(ImportPackagesResponse { imported, skipped }))
}

/// GET /v1/packages - List all packages, newest first.
pub async fn list_packages(
    State(state): State<AppState>,
) -> ApiResult<Json<ListPackagesResponse>> {
    let rows = state.metadata.list_packages().await?;
    let packages = rows
        .into_iter()
        .map(package_response)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(ListPackagesResponse { packages }))
}

/// GET /v1/packages/{package_id} - Get a package's summary.
pub async fn get_package(
    State(state): State<AppState>,
    Path(package_id): Path<String>,
) -> ApiResult<Json<PackageResponse>> {
    let package_id = parse_package_id(&package_id)?;
    let row = state
        .metadata
        .get_package(package_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("package not found".to_string()))?;
    Ok(Json(package_response(row)?))
}

/// GET /v1/packages/{package_id}/download - Download the binary payload.
pub async fn download_package(
    State(state): State<AppState>,
    Path(package_id): Path<String>,
) -> ApiResult<Response> {
    let package_id = parse_package_id(&package_id)?;
    let row = state
        .metadata
        .get_package_payload(package_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("package not found".to_string()))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", row.software_name),
            ),
        ],
        row.payload,
    )
        .into_response())
}

/// DELETE /v1/packages/{package_id} - Delete a package.
pub async fn delete_package(
    State(state): State<AppState>,
    Path(package_id): Path<String>,
) -> ApiResult<StatusCode> {
    let package_id = parse_package_id(&package_id)?;
    state.metadata.delete_package(package_id).await?;
    tracing::info!(package_id = %package_id, "package deleted");
    Ok(StatusCode::NO_CONTENT)
}
