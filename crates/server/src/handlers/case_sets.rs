//! Case-set endpoints: upload, queries, archive download, deletion.
//!
//! The upload handler carries the stages the ingestion pipeline leaves to its
//! caller: the cheap payload checks, the duplicate/overwrite policy, and the
//! atomic persistence of the assembled aggregate.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::format_timestamp;
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use dialcenter_core::{ArchiveFormat, UploadFileName, check_payload_size};
use dialcenter_ingest::ingest_case_set;
use dialcenter_metadata::models::{CaseRow, CaseSetRow, CaseSetSummaryRow};
use dialcenter_metadata::repos::{CaseRepo, CaseSetRepo};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Query parameters for the case-set upload endpoint.
#[derive(Debug, Deserialize)]
pub struct UploadCaseSetParams {
    /// Original upload file name (`<name>_<version>.zip` or `.tar.gz`).
    pub file_name: String,
    /// Replace an existing set with the same name and version.
    #[serde(default)]
    pub overwrite: bool,
}

/// Case-set upload response.
#[derive(Debug, Serialize)]
pub struct UploadCaseSetResponse {
    pub case_set_id: String,
    pub set_name: String,
    pub set_version: String,
    pub format: String,
    pub digest: String,
    pub has_manifest: bool,
    pub has_script_dir: bool,
    pub case_count: usize,
    pub matched_count: usize,
    pub missing_script_count: usize,
    pub missing_scripts: Vec<String>,
    pub extra_scripts: Vec<String>,
    pub overwritten: bool,
    pub created_at: String,
}

/// Case-set summary as returned by list/get.
#[derive(Debug, Serialize)]
pub struct CaseSetResponse {
    pub case_set_id: String,
    pub set_name: String,
    pub set_version: String,
    pub format: String,
    pub digest: String,
    pub archive_size: i64,
    pub has_manifest: bool,
    pub has_script_dir: bool,
    pub case_count: i64,
    pub missing_script_count: i64,
    pub created_at: String,
}

/// List response wrapper.
#[derive(Debug, Serialize)]
pub struct ListCaseSetsResponse {
    pub case_sets: Vec<CaseSetResponse>,
}

/// One case row as returned by the case queries.
#[derive(Debug, Serialize)]
pub struct CaseResponse {
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

/// Case list response wrapper.
#[derive(Debug, Serialize)]
pub struct ListCasesResponse {
    pub cases: Vec<CaseResponse>,
}

/// Missing-script query response.
#[derive(Debug, Serialize)]
pub struct MissingScriptsResponse {
    pub missing_script_count: u64,
    pub cases: Vec<CaseResponse>,
}

fn case_set_response(row: CaseSetSummaryRow) -> ApiResult<CaseSetResponse> {
    Ok(CaseSetResponse {
        case_set_id: row.case_set_id.to_string(),
        set_name: row.set_name,
        set_version: row.set_version,
        format: row.format,
        digest: row.digest_hex,
        archive_size: row.archive_size,
        has_manifest: row.has_manifest,
        has_script_dir: row.has_script_dir,
        case_count: row.case_count,
        missing_script_count: row.missing_script_count,
        created_at: format_timestamp(row.created_at)?,
    })
}

fn case_response(row: CaseRow) -> CaseResponse {
    CaseResponse {
        position: row.position,
        case_name: row.case_name,
        case_number: row.case_number,
        network_topology: row.network_topology,
        business_category: row.business_category,
        app_name: row.app_name,
        test_steps: row.test_steps,
        expected_result: row.expected_result,
        script_exists: row.script_exists,
    }
}

fn parse_case_set_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("invalid case set ID: {e}")))
}

/// POST /v1/case-sets - Upload and ingest a case-set archive.
///
/// The archive travels in the request body; the original file name and the
/// overwrite flag travel as query parameters. Cheap validations run strictly
/// before any archive parsing; a duplicate (name, version) is rejected unless
/// overwrite is requested, in which case the prior aggregate and all its case
/// rows are deleted before the new one is inserted.
pub async fn upload_case_set(
    State(state): State<AppState>,
    Query(params): Query<UploadCaseSetParams>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<UploadCaseSetResponse>)> {
    check_payload_size(body.len() as u64, state.config.ingest.max_archive_size)?;
    let upload = UploadFileName::parse(&params.file_name)?;

    let mut overwritten = false;
    if let Some(existing) = state
        .metadata
        .find_by_name_and_version(upload.name(), upload.version())
        .await?
    {
        if !params.overwrite {
            return Err(ApiError::DuplicateNameVersion {
                name: upload.name().to_string(),
                version: upload.version().to_string(),
            });
        }
        // Full replace, not merge: the old aggregate and its case rows go
        // before the new insert.
        state
            .metadata
            .delete_case_set(existing.case_set_id)
            .await?;
        overwritten = true;
        tracing::info!(
            case_set_id = %existing.case_set_id,
            set_name = upload.name(),
            set_version = upload.version(),
            "deleted existing case set for overwrite"
        );
    }

    let set = ingest_case_set(&upload, &body)?;

    let case_set_id = Uuid::new_v4();
    let now = OffsetDateTime::now_utc();
    let header = CaseSetRow {
        case_set_id,
        set_name: set.name.clone(),
        set_version: set.version.clone(),
        format: set.format.as_str().to_string(),
        digest_hex: set.digest.to_hex(),
        raw_archive: body.to_vec(),
        has_manifest: set.structure.has_manifest,
        has_script_dir: set.structure.has_script_dir,
        case_count: set.cases.len() as i64,
        missing_script_count: set.missing_script_count() as i64,
        created_at: now,
    };
    let case_rows: Vec<CaseRow> = set
        .cases
        .iter()
        .enumerate()
        .map(|(index, case)| CaseRow {
            case_set_id,
            position: index as i32,
            case_name: case.record.case_name.clone(),
            case_number: case.record.case_number.clone(),
            network_topology: case.record.network_topology.clone(),
            business_category: case.record.business_category.clone(),
            app_name: case.record.app_name.clone(),
            test_steps: case.record.test_steps.clone(),
            expected_result: case.record.expected_result.clone(),
            script_exists: case.script_exists,
        })
        .collect();

    // Header and case rows land in one transaction; a concurrent upload of
    // the same (name, version) loses against the unique index and surfaces
    // as a conflict.
    state.metadata.insert_case_set(&header, &case_rows).await?;

    let response = UploadCaseSetResponse {
        case_set_id: case_set_id.to_string(),
        set_name: set.name.clone(),
        set_version: set.version.clone(),
        format: set.format.as_str().to_string(),
        digest: set.digest.to_hex(),
        has_manifest: set.structure.has_manifest,
        has_script_dir: set.structure.has_script_dir,
        case_count: set.cases.len(),
        matched_count: set.reconciliation.matched_count(),
        missing_script_count: set.missing_script_count(),
        missing_scripts: set.reconciliation.missing_scripts().to_vec(),
        extra_scripts: set.reconciliation.extra_scripts().to_vec(),
        overwritten,
        created_at: format_timestamp(now)?,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /v1/case-sets - List all case sets, newest first.
pub async fn list_case_sets(
    State(state): State<AppState>,
) -> ApiResult<Json<ListCaseSetsResponse>> {
    let rows = state.metadata.list_case_sets().await?;
    let case_sets = rows
        .into_iter()
        .map(case_set_response)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(ListCaseSetsResponse { case_sets }))
}

/// GET /v1/case-sets/{case_set_id} - Get a case set's summary.
pub async fn get_case_set(
    State(state): State<AppState>,
    Path(case_set_id): Path<String>,
) -> ApiResult<Json<CaseSetResponse>> {
    let case_set_id = parse_case_set_id(&case_set_id)?;
    let row = state
        .metadata
        .get_case_set(case_set_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("case set not found".to_string()))?;
    Ok(Json(case_set_response(row)?))
}

/// GET /v1/case-sets/{case_set_id}/archive - Download the raw archive.
pub async fn download_case_set(
    State(state): State<AppState>,
    Path(case_set_id): Path<String>,
) -> ApiResult<Response> {
    let case_set_id = parse_case_set_id(&case_set_id)?;
    let row = state
        .metadata
        .get_case_set_archive(case_set_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("case set not found".to_string()))?;

    let format = ArchiveFormat::parse(&row.format)
        .map_err(|e| ApiError::Internal(format!("stored format tag is invalid: {e}")))?;
    let file_name = format!("{}_{}{}", row.set_name, row.set_version, format.extension());

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        row.raw_archive,
    )
        .into_response())
}

/// GET /v1/case-sets/{case_set_id}/cases - List a set's cases in manifest order.
pub async fn list_cases(
    State(state): State<AppState>,
    Path(case_set_id): Path<String>,
) -> ApiResult<Json<ListCasesResponse>> {
    let case_set_id = parse_case_set_id(&case_set_id)?;
    if state.metadata.get_case_set(case_set_id).await?.is_none() {
        return Err(ApiError::NotFound("case set not found".to_string()));
    }
    let rows = state.metadata.list_cases(case_set_id).await?;
    Ok(Json(ListCasesResponse {
        cases: rows.into_iter().map(case_response).collect(),
    }))
}

/// GET /v1/case-sets/{case_set_id}/missing-scripts - Cases with no script.
///
/// Ingestion succeeds even when scripts are missing; this dedicated query is
/// where the mismatch detail lives.
pub async fn list_missing_scripts(
    State(state): State<AppState>,
    Path(case_set_id): Path<String>,
) -> ApiResult<Json<MissingScriptsResponse>> {
    let case_set_id = parse_case_set_id(&case_set_id)?;
    if state.metadata.get_case_set(case_set_id).await?.is_none() {
        return Err(ApiError::NotFound("case set not found".to_string()));
    }
    let count = state.metadata.count_missing_scripts(case_set_id).await?;
    let rows = state
        .metadata
        .list_missing_script_cases(case_set_id)
        .await?;
    Ok(Json(MissingScriptsResponse {
        missing_script_count: count,
        cases: rows.into_iter().map(case_response).collect(),
    }))
}

/// DELETE /v1/case-sets/{case_set_id} - Delete a set and its case rows.
pub async fn delete_case_set(
    State(state): State<AppState>,
    Path(case_set_id): Path<String>,
) -> ApiResult<StatusCode> {
    let case_set_id = parse_case_set_id(&case_set_id)?;
    state.metadata.delete_case_set(case_set_id).await?;
    tracing::info!(case_set_id = %case_set_id, "case set deleted");
    Ok(StatusCode::NO_CONTENT)
}
