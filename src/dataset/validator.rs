use super::manifest::{AUDIO_EXT, METADATA_FILE, WAVS_DIR};
use crate::error::{Result, SuiteError, MISSING_IDS_SHOWN};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Manifest rows inspected per validation run
pub const MAX_SCANNED_ROWS: usize = 2000;

/// Outcome of a successful validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Rows actually checked (capped at [`MAX_SCANNED_ROWS`])
    pub scanned_rows: usize,
    /// Rows present in the manifest
    pub total_rows: usize,
}

/// Structural check of a built dataset
///
/// Confirms the manifest and audio directory exist, that scanned rows have
/// at least two fields, and that each scanned id has an audio file. Audio
/// content is never decoded.
pub fn validate(dataset_dir: &Path) -> Result<ValidationReport> {
    let manifest = dataset_dir.join(METADATA_FILE);
    let wavs_dir = dataset_dir.join(WAVS_DIR);

    if !manifest.is_file() {
        return Err(SuiteError::ManifestMissing(manifest));
    }
    if !wavs_dir.is_dir() {
        return Err(SuiteError::AudioDirMissing(wavs_dir));
    }

    let content = fs::read_to_string(&manifest).map_err(SuiteError::storage(&manifest))?;
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        return Err(SuiteError::EmptyManifest(manifest));
    }

    let mut missing = Vec::new();
    for (i, line) in lines.iter().take(MAX_SCANNED_ROWS).enumerate() {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < 2 {
            return Err(SuiteError::MalformedRow {
                line: i + 1,
                row: line.to_string(),
            });
        }

        let id = fields[0];
        if !wavs_dir.join(format!("{id}.{AUDIO_EXT}")).is_file() {
            missing.push(id.to_string());
        }
    }

    if !missing.is_empty() {
        let total = missing.len();
        missing.truncate(MISSING_IDS_SHOWN);
        return Err(SuiteError::MissingAudioFiles { ids: missing, total });
    }

    let report = ValidationReport {
        scanned_rows: lines.len().min(MAX_SCANNED_ROWS),
        total_rows: lines.len(),
    };

    info!(
        "Dataset looks OK: {} (rows={}, scanned={})",
        dataset_dir.display(),
        report.total_rows,
        report.scanned_rows
    );

    Ok(report)
}
