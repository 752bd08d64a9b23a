//! Case-set ingestion pipeline.
//!
//! Orchestrates the per-upload stages: structure validation, extraction,
//! manifest parsing, and reconciliation. The cheap payload checks and the
//! duplicate/overwrite policy run before this pipeline, and persistence runs
//! after it; both stay with the caller.

use crate::error::IngestResult;
use crate::extract::{ArchiveStructure, extract_manifest, extract_script_names, validate_structure};
use crate::spreadsheet::parse_manifest;
use dialcenter_core::{
    ArchiveFormat, CaseRecord, ContentDigest, ReconciliationResult, UploadFileName, reconcile,
};
use std::collections::HashSet;

/// One case record annotated with its script-existence flag.
#[derive(Clone, Debug)]
pub struct IngestedCase {
    /// The parsed manifest row.
    pub record: CaseRecord,
    /// Whether a script matching the case number was found in the archive.
    pub script_exists: bool,
}

/// The assembled result of ingesting one case-set archive.
#[derive(Debug)]
pub struct IngestedCaseSet {
    /// Logical set name derived from the upload file name.
    pub name: String,
    /// Set version derived from the upload file name.
    pub version: String,
    /// Archive container format.
    pub format: ArchiveFormat,
    /// SHA-512 digest of the raw archive bytes.
    pub digest: ContentDigest,
    /// Structure flags from the pre-flight scan.
    pub structure: ArchiveStructure,
    /// Parsed cases with their script-existence flags.
    pub cases: Vec<IngestedCase>,
    /// Full reconciliation outcome, including extra-script diagnostics.
    pub reconciliation: ReconciliationResult,
}

impl IngestedCaseSet {
    /// Number of cases without a matching script.
    pub fn missing_script_count(&self) -> usize {
        self.reconciliation.missing_count()
    }
}

/// Run the extraction, parsing, and reconciliation stages over an uploaded
/// archive.
///
/// A missing manifest or script directory is not fatal: a case-set may
/// legitimately ship only packaged scripts without a manifest, or vice
/// versa. The pipeline proceeds with zero case records or zero scripts and
/// reports the structure flags so callers can tell the two situations apart.
pub fn ingest_case_set(upload: &UploadFileName, bytes: &[u8]) -> IngestResult<IngestedCaseSet> {
    let format = upload.format();

    let structure = validate_structure(bytes, format)?;
    if !structure.has_manifest && !structure.has_script_dir {
        tracing::warn!(
            name = upload.name(),
            version = upload.version(),
            "archive has neither a manifest nor a script directory"
        );
    }

    let records = match extract_manifest(bytes, format)? {
        Some(manifest) => parse_manifest(&manifest)?,
        None => Vec::new(),
    };

    let script_names = extract_script_names(bytes, format)?;

    let case_numbers: Vec<String> = records
        .iter()
        .map(|record| record.case_number.clone())
        .collect();
    log_duplicate_case_numbers(&case_numbers);

    let reconciliation = reconcile(&case_numbers, &script_names);
    let cases = records
        .into_iter()
        .map(|record| {
            let script_exists = reconciliation.script_exists(&record.case_number);
            IngestedCase {
                record,
                script_exists,
            }
        })
        .collect();

    let digest = ContentDigest::compute(bytes);

    let set = IngestedCaseSet {
        name: upload.name().to_string(),
        version: upload.version().to_string(),
        format,
        digest,
        structure,
        cases,
        reconciliation,
    };
    tracing::info!(
        name = %set.name,
        version = %set.version,
        format = %set.format,
        cases = set.cases.len(),
        matched = set.reconciliation.matched_count(),
        missing = set.reconciliation.missing_count(),
        extra = set.reconciliation.extra_count(),
        "case-set ingestion assembled"
    );
    Ok(set)
}

fn log_duplicate_case_numbers(case_numbers: &[String]) {
    let mut seen = HashSet::new();
    for case_number in case_numbers {
        if !seen.insert(case_number.as_str()) {
            tracing::debug!(case_number = %case_number, "duplicate case number in manifest");
        }
    }
}
