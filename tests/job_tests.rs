// Integration tests for training and export jobs
//
// The external repositories are stand-in shell scripts; the interpreters are
// pinned to /bin/sh through a static locator.
#![cfg(unix)]

use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use voice_suite::error::SuiteError;
use voice_suite::jobs::{
    export_voice, train_voice, ExportFlavor, ExportJob, InferenceDefaults, TrainingFlavor,
    TrainingJob, VoiceMetadata,
};
use voice_suite::tools::{StaticLocator, Toolbox};

fn toolbox() -> Result<Toolbox> {
    let locator = StaticLocator::new()
        .with("bash", "/bin/sh")
        .with("python", "/bin/sh");
    Ok(Toolbox::resolve(&locator, &["bash", "python"])?)
}

fn training_job(repo: &Path, root: &Path, flavor: TrainingFlavor) -> TrainingJob {
    TrainingJob {
        flavor,
        repo: repo.to_path_buf(),
        dataset_dir: root.join("dataset"),
        voice_id: "test_voice".to_string(),
        epochs: 3,
        batch_size: 4,
        learning_rate: 0.0002,
        checkpoint_dir: root.join("checkpoints"),
        use_cuda: false,
        timeout: None,
    }
}

#[test]
fn test_unknown_flavors_are_rejected() {
    let err = "train_rs".parse::<TrainingFlavor>().unwrap_err();
    assert!(matches!(err, SuiteError::UnsupportedTrainingRepoLayout(_)));

    let err = "export_tflite".parse::<ExportFlavor>().unwrap_err();
    assert!(matches!(err, SuiteError::UnsupportedTrainingRepoLayout(_)));
}

#[test]
fn test_train_py_command_line() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let repo = temp_dir.path().join("repo");
    fs::create_dir_all(&repo)?;
    fs::write(repo.join("train.py"), "")?;

    let job = training_job(&repo, temp_dir.path(), TrainingFlavor::TrainPy);
    let cmd = job.command(&toolbox()?)?;

    let args: Vec<String> = cmd
        .get_args()
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let root = temp_dir.path().display();
    assert_eq!(
        args,
        vec![
            format!("{}/repo/train.py", root),
            "--dataset".to_string(),
            format!("{}/dataset", root),
            "--voice-id".to_string(),
            "test_voice".to_string(),
            "--epochs".to_string(),
            "3".to_string(),
            "--batch-size".to_string(),
            "4".to_string(),
            "--learning-rate".to_string(),
            "0.0002".to_string(),
            "--out".to_string(),
            format!("{}/checkpoints", root),
        ]
    );
    assert_eq!(cmd.get_current_dir(), Some(repo.as_path()));
    assert!(cmd
        .get_envs()
        .iter()
        .any(|(k, v)| k == "CUDA_VISIBLE_DEVICES" && v.is_empty()));

    Ok(())
}

#[test]
fn test_training_requires_flavor_script() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let repo = temp_dir.path().join("repo");
    fs::create_dir_all(&repo)?;
    fs::write(repo.join("train.py"), "")?;

    let job = training_job(&repo, temp_dir.path(), TrainingFlavor::TrainSh);
    let err = job.command(&toolbox()?).unwrap_err();
    assert!(matches!(err, SuiteError::UnsupportedTrainingRepoLayout(_)), "got {err:?}");

    let job = training_job(&temp_dir.path().join("missing"), temp_dir.path(), TrainingFlavor::TrainPy);
    let err = job.command(&toolbox()?).unwrap_err();
    assert!(matches!(err, SuiteError::InvalidInput(_)), "got {err:?}");

    Ok(())
}

#[tokio::test]
async fn test_train_sh_runs_in_repo() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let repo = temp_dir.path().join("repo");
    fs::create_dir_all(&repo)?;
    // Positional schema: dataset voice epochs batch lr checkpoint_dir
    fs::write(
        repo.join("train.sh"),
        "echo \"$2 $3 $4 $5 cuda=[$CUDA_VISIBLE_DEVICES]\" > \"$6/args.txt\"\npwd > \"$6/cwd.txt\"\n",
    )?;

    let job = training_job(&repo, temp_dir.path(), TrainingFlavor::TrainSh);
    let checkpoints = train_voice(&job, &toolbox()?).await?;

    assert_eq!(checkpoints, temp_dir.path().join("checkpoints"));
    assert_eq!(
        fs::read_to_string(checkpoints.join("args.txt"))?.trim(),
        "test_voice 3 4 0.0002 cuda=[]"
    );
    let cwd = fs::read_to_string(checkpoints.join("cwd.txt"))?;
    assert_eq!(Path::new(cwd.trim()).canonicalize()?, repo.canonicalize()?);

    Ok(())
}

#[tokio::test]
async fn test_train_failure_surfaces_exit_status() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let repo = temp_dir.path().join("repo");
    fs::create_dir_all(&repo)?;
    fs::write(repo.join("train.sh"), "echo 'CUDA out of memory' >&2\nexit 2\n")?;

    let job = training_job(&repo, temp_dir.path(), TrainingFlavor::TrainSh);
    match train_voice(&job, &toolbox()?).await {
        Err(SuiteError::ExternalProcessFailure { status, output, .. }) => {
            assert_eq!(status, "2");
            assert!(output.contains("out of memory"));
        }
        other => panic!("Expected ExternalProcessFailure, got {other:?}"),
    }

    Ok(())
}

fn export_job(repo: &Path, root: &Path) -> ExportJob {
    ExportJob {
        flavor: ExportFlavor::ExportOnnxPy,
        repo: repo.to_path_buf(),
        checkpoint_dir: root.join("checkpoints"),
        out_dir: root.join("voices").join("test_voice"),
        opset: 17,
        simplify: true,
        metadata: VoiceMetadata {
            voice_id: "test_voice".to_string(),
            language: "en_US".to_string(),
            sample_rate: 22050,
            inference: InferenceDefaults::default(),
        },
        timeout: None,
    }
}

#[tokio::test]
async fn test_export_writes_model_and_metadata() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let repo = temp_dir.path().join("repo");
    fs::create_dir_all(&repo)?;
    fs::create_dir_all(temp_dir.path().join("checkpoints"))?;
    // --checkpoint-dir C --output-onnx OUT --opset N
    fs::write(repo.join("export_onnx.py"), "echo \"opset $6\" > \"$4\"\n")?;

    // The simplification pass has no onnxsim to run and must not fail the export
    let job = export_job(&repo, temp_dir.path());
    let artifacts = export_voice(&job, &toolbox()?).await?;

    assert_eq!(artifacts.onnx, job.out_dir.join("model.onnx"));
    assert_eq!(fs::read_to_string(&artifacts.onnx)?.trim(), "opset 17");

    let metadata: serde_json::Value = serde_json::from_str(&fs::read_to_string(&artifacts.metadata)?)?;
    assert_eq!(metadata["voice_id"], "test_voice");
    assert_eq!(metadata["language"], "en_US");
    assert_eq!(metadata["sample_rate"], 22050);
    assert_eq!(metadata["inference"]["noise_scale"].as_f64().map(|v| (v * 1000.0).round()), Some(667.0));

    Ok(())
}

#[tokio::test]
async fn test_export_requires_checkpoint_dir() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let repo = temp_dir.path().join("repo");
    fs::create_dir_all(&repo)?;
    fs::write(repo.join("export_onnx.py"), "")?;

    let err = export_voice(&export_job(&repo, temp_dir.path()), &toolbox()?)
        .await
        .unwrap_err();
    assert!(matches!(err, SuiteError::InvalidInput(_)), "got {err:?}");

    Ok(())
}

#[test]
fn test_export_requires_repo() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::create_dir_all(temp_dir.path().join("checkpoints"))?;

    let job = export_job(&temp_dir.path().join("missing"), temp_dir.path());
    let err = job.command(&toolbox()?).unwrap_err();
    assert!(matches!(err, SuiteError::InvalidInput(_)), "got {err:?}");

    Ok(())
}
