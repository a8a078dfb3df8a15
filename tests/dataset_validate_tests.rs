// Integration tests for dataset validation

use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use voice_suite::dataset::{validate, MAX_SCANNED_ROWS, METADATA_FILE, WAVS_DIR};
use voice_suite::error::SuiteError;

fn write_dataset(dir: &Path, rows: &[&str], wavs: &[&str]) -> Result<()> {
    let wavs_dir = dir.join(WAVS_DIR);
    fs::create_dir_all(&wavs_dir)?;
    for id in wavs {
        fs::write(wavs_dir.join(format!("{}.wav", id)), b"RIFF")?;
    }
    let mut manifest = String::new();
    for row in rows {
        manifest.push_str(row);
        manifest.push('\n');
    }
    fs::write(dir.join(METADATA_FILE), manifest)?;
    Ok(())
}

#[test]
fn test_validate_ok() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_dataset(
        temp_dir.path(),
        &["000001|hello|hello", "000002|world|world"],
        &["000001", "000002"],
    )?;

    let report = validate(temp_dir.path())?;
    assert_eq!(report.scanned_rows, 2);
    assert_eq!(report.total_rows, 2);

    Ok(())
}

#[test]
fn test_validate_reports_missing_audio() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_dataset(
        temp_dir.path(),
        &["000001|hello|hello", "000002|world|world"],
        &["000001"],
    )?;

    match validate(temp_dir.path()) {
        Err(SuiteError::MissingAudioFiles { ids, total }) => {
            assert_eq!(ids, vec!["000002".to_string()]);
            assert_eq!(total, 1);
        }
        other => panic!("Expected MissingAudioFiles, got {other:?}"),
    }

    Ok(())
}

#[test]
fn test_validate_lists_at_most_twenty_missing_ids() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let rows: Vec<String> = (0..30).map(|i| format!("{:06}|t|t", i)).collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    write_dataset(temp_dir.path(), &rows, &[])?;

    match validate(temp_dir.path()) {
        Err(SuiteError::MissingAudioFiles { ids, total }) => {
            assert_eq!(ids.len(), 20);
            assert_eq!(ids[0], "000000");
            assert_eq!(total, 30);
        }
        other => panic!("Expected MissingAudioFiles, got {other:?}"),
    }

    Ok(())
}

#[test]
fn test_validate_missing_manifest() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::create_dir_all(temp_dir.path().join(WAVS_DIR))?;

    let err = validate(temp_dir.path()).unwrap_err();
    assert!(matches!(err, SuiteError::ManifestMissing(_)), "got {err:?}");

    Ok(())
}

#[test]
fn test_validate_missing_wavs_dir() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join(METADATA_FILE), "000001|a|a\n")?;

    let err = validate(temp_dir.path()).unwrap_err();
    assert!(matches!(err, SuiteError::AudioDirMissing(_)), "got {err:?}");

    Ok(())
}

#[test]
fn test_validate_empty_manifest() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_dataset(temp_dir.path(), &[], &[])?;

    let err = validate(temp_dir.path()).unwrap_err();
    assert!(matches!(err, SuiteError::EmptyManifest(_)), "got {err:?}");

    Ok(())
}

#[test]
fn test_validate_malformed_row() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_dataset(
        temp_dir.path(),
        &["000001|hello|hello", "no delimiter here"],
        &["000001"],
    )?;

    match validate(temp_dir.path()) {
        Err(SuiteError::MalformedRow { line, row }) => {
            assert_eq!(line, 2);
            assert_eq!(row, "no delimiter here");
        }
        other => panic!("Expected MalformedRow, got {other:?}"),
    }

    Ok(())
}

#[test]
fn test_validate_scans_a_bounded_prefix() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let total = MAX_SCANNED_ROWS + 5;
    let rows: Vec<String> = (0..total).map(|i| format!("{:06}|t|t", i)).collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();

    // Only the scanned prefix has audio; rows past the cap are not checked
    let ids: Vec<String> = (0..MAX_SCANNED_ROWS).map(|i| format!("{:06}", i)).collect();
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    write_dataset(temp_dir.path(), &rows, &ids)?;

    let report = validate(temp_dir.path())?;
    assert_eq!(report.scanned_rows, MAX_SCANNED_ROWS);
    assert_eq!(report.total_rows, total);

    Ok(())
}
