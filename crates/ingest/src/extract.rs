//! Manifest and script extraction from case-set archives.
//!
//! Each extraction opens a fresh forward-only scan over the archive bytes
//! (see [`crate::archive::scan_entries`]); nothing here retains entries
//! beyond a single visit.

use crate::archive::{ScanControl, scan_entries};
use crate::error::IngestResult;
use dialcenter_core::{ArchiveFormat, MANIFEST_FILE_NAME, SCRIPT_EXTENSION, SCRIPTS_DIR_PREFIX};

/// Structure report from a single pre-flight scan of an archive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArchiveStructure {
    /// Whether the reserved manifest entry is present.
    pub has_manifest: bool,
    /// Whether any entry lives under the reserved script directory.
    pub has_script_dir: bool,
    /// Number of qualifying script entries.
    pub script_count: usize,
}

impl ArchiveStructure {
    /// True when both the manifest and the script directory are present.
    pub fn is_complete(&self) -> bool {
        self.has_manifest && self.has_script_dir
    }
}

fn is_script_entry(name: &str) -> bool {
    name.starts_with(SCRIPTS_DIR_PREFIX) && name.to_lowercase().ends_with(SCRIPT_EXTENSION)
}

/// Extract the raw bytes of the reserved manifest entry.
///
/// Returns `None` when the archive carries no manifest; absence is a
/// reportable outcome, not an error.
pub fn extract_manifest(bytes: &[u8], format: ArchiveFormat) -> IngestResult<Option<Vec<u8>>> {
    let mut manifest = None;
    scan_entries(bytes, format, |entry| {
        if !entry.is_dir() && entry.name() == MANIFEST_FILE_NAME {
            manifest = Some(entry.read_content()?);
            return Ok(ScanControl::Stop);
        }
        Ok(ScanControl::Continue)
    })?;

    match &manifest {
        Some(content) => {
            tracing::debug!(size = content.len(), "found manifest entry in archive")
        }
        None => tracing::warn!("manifest entry not found in archive"),
    }
    Ok(manifest)
}

/// Collect script file names under the reserved script directory.
///
/// Names are returned with the directory prefix stripped, in archive scan
/// order (not sorted). Only entries carrying the recognized script extension
/// qualify; the extension is matched case-insensitively.
pub fn extract_script_names(bytes: &[u8], format: ArchiveFormat) -> IngestResult<Vec<String>> {
    let mut scripts = Vec::new();
    scan_entries(bytes, format, |entry| {
        if !entry.is_dir() && is_script_entry(entry.name()) {
            scripts.push(entry.name()[SCRIPTS_DIR_PREFIX.len()..].to_string());
        }
        Ok(ScanControl::Continue)
    })?;

    tracing::debug!(count = scripts.len(), "collected script entries");
    Ok(scripts)
}

/// Report the archive structure in a single combined scan.
///
/// Used as a pre-flight gate before the heavier parse steps run.
pub fn validate_structure(bytes: &[u8], format: ArchiveFormat) -> IngestResult<ArchiveStructure> {
    let mut structure = ArchiveStructure::default();
    scan_entries(bytes, format, |entry| {
        if entry.name() == MANIFEST_FILE_NAME {
            structure.has_manifest = true;
        } else if entry.name().starts_with(SCRIPTS_DIR_PREFIX) {
            structure.has_script_dir = true;
            if !entry.is_dir() && is_script_entry(entry.name()) {
                structure.script_count += 1;
            }
        }
        Ok(ScanControl::Continue)
    })?;
    Ok(structure)
}
