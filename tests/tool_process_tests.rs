// Integration tests for external tool discovery and invocation
#![cfg(unix)]

use anyhow::Result;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use voice_suite::audio::{AudioNormalizer, AudioSettings, FfmpegNormalizer, NormalizeJob};
use voice_suite::error::SuiteError;
use voice_suite::tools::{PathLocator, ToolCommand, Toolbox};

fn write_script(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
    let mut perms = fs::metadata(&path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms)?;
    Ok(path)
}

#[tokio::test]
async fn test_run_captures_stdout() -> Result<()> {
    let output = ToolCommand::new("/bin/sh")
        .args(["-c", "echo hello"])
        .run(None)
        .await?;

    assert_eq!(output.stdout.trim(), "hello");
    Ok(())
}

#[tokio::test]
async fn test_non_zero_exit_is_reported() -> Result<()> {
    let err = ToolCommand::new("/bin/sh")
        .args(["-c", "echo broken >&2; exit 3"])
        .run(None)
        .await
        .unwrap_err();

    match err {
        SuiteError::ExternalProcessFailure { status, output, .. } => {
            assert_eq!(status, "3");
            assert!(output.contains("broken"));
        }
        other => panic!("Expected ExternalProcessFailure, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_deadline_kills_slow_process() -> Result<()> {
    let err = ToolCommand::new("/bin/sh")
        .args(["-c", "sleep 5"])
        .run(Some(Duration::from_millis(200)))
        .await
        .unwrap_err();

    assert!(matches!(err, SuiteError::Timeout { .. }), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn test_spawn_failure_is_reported() -> Result<()> {
    let err = ToolCommand::new("/nonexistent/tool")
        .run(None)
        .await
        .unwrap_err();

    assert!(matches!(err, SuiteError::ExternalProcessFailure { .. }), "got {err:?}");
    Ok(())
}

#[test]
fn test_path_locator_reports_all_missing_tools() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_script(temp_dir.path(), "ffmpeg", "exit 0")?;
    // Present but not executable
    fs::write(temp_dir.path().join("python"), "")?;

    let locator = PathLocator::from_path_var(temp_dir.path().as_os_str());

    let tools = Toolbox::resolve(&locator, &["ffmpeg"])?;
    assert_eq!(tools.path("ffmpeg")?, temp_dir.path().join("ffmpeg").as_path());

    match Toolbox::resolve(&locator, &["ffmpeg", "python", "bash"]) {
        Err(SuiteError::MissingTools(missing)) => {
            assert_eq!(missing, vec!["python".to_string(), "bash".to_string()]);
        }
        other => panic!("Expected MissingTools, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_ffmpeg_normalizer_runs_resolved_binary() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let bin = temp_dir.path().join("bin");
    fs::create_dir_all(&bin)?;
    // Copies the input (after `-y -i`) to the last argument
    let ffmpeg = write_script(&bin, "ffmpeg", "for last; do :; done\ncp \"$3\" \"$last\"")?;

    let input = temp_dir.path().join("0.wav");
    let output = temp_dir.path().join("000000.wav");
    fs::write(&input, b"take")?;

    let normalizer = FfmpegNormalizer::new(ffmpeg, Some(Duration::from_secs(10)));
    normalizer
        .normalize(&NormalizeJob {
            input,
            output: output.clone(),
            settings: AudioSettings::default(),
        })
        .await?;

    assert_eq!(fs::read(&output)?, b"take");
    assert_eq!(normalizer.name(), "ffmpeg");
    Ok(())
}

#[tokio::test]
async fn test_ffmpeg_failure_carries_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let ffmpeg = write_script(
        temp_dir.path(),
        "ffmpeg",
        "echo 'Invalid data found when processing input' >&2\nexit 1",
    )?;

    let err = FfmpegNormalizer::new(ffmpeg, None)
        .normalize(&NormalizeJob {
            input: temp_dir.path().join("1.wav"),
            output: temp_dir.path().join("000001.wav"),
            settings: AudioSettings::default(),
        })
        .await
        .unwrap_err();

    match err {
        SuiteError::ExternalProcessFailure { output, .. } => {
            assert!(output.contains("Invalid data found"));
        }
        other => panic!("Expected ExternalProcessFailure, got {other:?}"),
    }
    Ok(())
}
