use crate::config::Config;
use crate::error::{Result, SuiteError};
use crate::session::write_atomic;
use crate::tools::{ToolCommand, Toolbox};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

pub const ONNX_FILE: &str = "model.onnx";
pub const METADATA_FILE: &str = "model.onnx.json";

/// Argument schema of a training repository's export entry point
///
/// Schema v1, `export_onnx_py`: `python export_onnx.py --checkpoint-dir C
/// --output-onnx OUT --opset N`, optionally followed by
/// `python -m onnxsim OUT OUT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFlavor {
    ExportOnnxPy,
}

impl ExportFlavor {
    pub fn script(&self) -> &'static str {
        match self {
            ExportFlavor::ExportOnnxPy => "export_onnx.py",
        }
    }

    pub fn interpreter(&self) -> &'static str {
        "python"
    }
}

impl FromStr for ExportFlavor {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "export_onnx_py" => Ok(ExportFlavor::ExportOnnxPy),
            other => Err(SuiteError::UnsupportedTrainingRepoLayout(format!(
                "unknown export flavor '{other}' (expected export_onnx_py)"
            ))),
        }
    }
}

/// Inference knobs written alongside the exported model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceDefaults {
    pub length_scale: f32,
    pub noise_scale: f32,
    pub noise_w: f32,
}

impl Default for InferenceDefaults {
    fn default() -> Self {
        Self {
            length_scale: 1.0,
            noise_scale: 0.667,
            noise_w: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceMetadata {
    pub voice_id: String,
    pub language: String,
    pub sample_rate: u32,
    pub inference: InferenceDefaults,
}

#[derive(Debug, Clone)]
pub struct ExportJob {
    pub flavor: ExportFlavor,
    pub repo: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub out_dir: PathBuf,
    pub opset: u32,
    pub simplify: bool,
    pub metadata: VoiceMetadata,
    pub timeout: Option<Duration>,
}

/// Files produced by an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifacts {
    pub onnx: PathBuf,
    pub metadata: PathBuf,
}

impl ExportJob {
    pub fn from_config(cfg: &Config, checkpoint_dir: PathBuf) -> Result<Self> {
        let repo = cfg
            .training
            .repo_path
            .clone()
            .ok_or_else(|| SuiteError::InvalidInput("training.repo_path is not set".to_string()))?;

        Ok(Self {
            flavor: cfg.export.flavor.parse()?,
            repo,
            checkpoint_dir,
            out_dir: cfg.paths.out_dir.join(&cfg.voice_id),
            opset: cfg.export.onnx_opset,
            simplify: cfg.export.simplify_onnx,
            metadata: VoiceMetadata {
                voice_id: cfg.voice_id.clone(),
                language: cfg.language.clone(),
                sample_rate: cfg.sample_rate,
                inference: InferenceDefaults::default(),
            },
            timeout: cfg.export.timeout(),
        })
    }

    pub fn onnx_path(&self) -> PathBuf {
        self.out_dir.join(ONNX_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.out_dir.join(METADATA_FILE)
    }

    pub fn command(&self, tools: &Toolbox) -> Result<ToolCommand> {
        if !self.repo.is_dir() {
            return Err(SuiteError::InvalidInput(format!(
                "Training repo not found: {}",
                self.repo.display()
            )));
        }
        if !self.checkpoint_dir.is_dir() {
            return Err(SuiteError::InvalidInput(format!(
                "Checkpoint directory not found: {}",
                self.checkpoint_dir.display()
            )));
        }

        let script = self.repo.join(self.flavor.script());
        if !script.is_file() {
            return Err(SuiteError::UnsupportedTrainingRepoLayout(format!(
                "export script not found: {}",
                script.display()
            )));
        }

        Ok(ToolCommand::new(tools.path(self.flavor.interpreter())?)
            .arg(&script)
            .arg("--checkpoint-dir")
            .arg(&self.checkpoint_dir)
            .arg("--output-onnx")
            .arg(self.onnx_path())
            .arg("--opset")
            .arg(self.opset.to_string())
            .current_dir(&self.repo))
    }

    fn simplify_command(&self, tools: &Toolbox) -> Result<ToolCommand> {
        let onnx = self.onnx_path();
        Ok(ToolCommand::new(tools.path(self.flavor.interpreter())?)
            .args(["-m", "onnxsim"])
            .arg(&onnx)
            .arg(&onnx)
            .current_dir(&self.out_dir))
    }
}

/// Export a checkpoint to ONNX and write the voice metadata next to it
///
/// The simplification pass is best effort: its failure is logged and the
/// unsimplified model is kept.
pub async fn export_voice(job: &ExportJob, tools: &Toolbox) -> Result<ExportArtifacts> {
    let cmd = job.command(tools)?;
    fs::create_dir_all(&job.out_dir).map_err(SuiteError::storage(&job.out_dir))?;

    cmd.run(job.timeout).await?;

    if job.simplify {
        let simplified = match job.simplify_command(tools) {
            Ok(cmd) => cmd.run(job.timeout).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = simplified {
            warn!("onnxsim not available or failed (continuing): {}", e);
        }
    }

    let metadata_path = job.metadata_path();
    write_metadata(&metadata_path, &job.metadata)?;

    info!("Exported: {}", job.onnx_path().display());
    info!("Metadata: {}", metadata_path.display());

    Ok(ExportArtifacts {
        onnx: job.onnx_path(),
        metadata: metadata_path,
    })
}

fn write_metadata(path: &Path, metadata: &VoiceMetadata) -> Result<()> {
    let json = serde_json::to_vec_pretty(metadata).map_err(|e| SuiteError::storage(path)(e.into()))?;
    write_atomic(path, &json)
}
