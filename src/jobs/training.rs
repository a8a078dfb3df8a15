use crate::config::Config;
use crate::error::{Result, SuiteError};
use crate::tools::{ToolCommand, Toolbox};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Argument schema of a training repository entry point
///
/// Schema v1:
/// - `train_py`: `python train.py --dataset D --voice-id V --epochs E
///   --batch-size B --learning-rate LR --out CKPT`
/// - `train_sh`: `bash train.sh D V E B LR CKPT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingFlavor {
    TrainPy,
    TrainSh,
}

impl TrainingFlavor {
    pub fn script(&self) -> &'static str {
        match self {
            TrainingFlavor::TrainPy => "train.py",
            TrainingFlavor::TrainSh => "train.sh",
        }
    }

    /// Executable that runs the script
    pub fn interpreter(&self) -> &'static str {
        match self {
            TrainingFlavor::TrainPy => "python",
            TrainingFlavor::TrainSh => "bash",
        }
    }
}

impl FromStr for TrainingFlavor {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train_py" => Ok(TrainingFlavor::TrainPy),
            "train_sh" => Ok(TrainingFlavor::TrainSh),
            other => Err(SuiteError::UnsupportedTrainingRepoLayout(format!(
                "unknown training flavor '{other}' (expected train_py or train_sh)"
            ))),
        }
    }
}

impl fmt::Display for TrainingFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingFlavor::TrainPy => write!(f, "train_py"),
            TrainingFlavor::TrainSh => write!(f, "train_sh"),
        }
    }
}

/// Everything an external training run needs
#[derive(Debug, Clone)]
pub struct TrainingJob {
    pub flavor: TrainingFlavor,
    pub repo: PathBuf,
    pub dataset_dir: PathBuf,
    pub voice_id: String,
    pub epochs: u32,
    pub batch_size: u32,
    pub learning_rate: f64,
    pub checkpoint_dir: PathBuf,
    pub use_cuda: bool,
    pub timeout: Option<Duration>,
}

impl TrainingJob {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let training = &cfg.training;
        let repo = training
            .repo_path
            .clone()
            .ok_or_else(|| SuiteError::InvalidInput("training.repo_path is not set".to_string()))?;

        Ok(Self {
            flavor: training.flavor.parse()?,
            repo,
            dataset_dir: cfg.paths.dataset_dir.clone(),
            voice_id: cfg.voice_id.clone(),
            epochs: training.epochs,
            batch_size: training.batch_size,
            learning_rate: training.learning_rate,
            checkpoint_dir: cfg.checkpoint_dir(),
            use_cuda: training.use_cuda,
            timeout: training.timeout(),
        })
    }

    /// Command line for this job, after checking the repo matches the flavor
    pub fn command(&self, tools: &Toolbox) -> Result<ToolCommand> {
        if !self.repo.is_dir() {
            return Err(SuiteError::InvalidInput(format!(
                "Training repo not found: {}",
                self.repo.display()
            )));
        }

        let script = self.repo.join(self.flavor.script());
        if !script.is_file() {
            return Err(SuiteError::UnsupportedTrainingRepoLayout(format!(
                "flavor {} expects {}",
                self.flavor,
                script.display()
            )));
        }

        let interpreter = tools.path(self.flavor.interpreter())?;
        let mut cmd = ToolCommand::new(interpreter).arg(&script);

        cmd = match self.flavor {
            TrainingFlavor::TrainPy => cmd
                .arg("--dataset")
                .arg(&self.dataset_dir)
                .arg("--voice-id")
                .arg(&self.voice_id)
                .arg("--epochs")
                .arg(self.epochs.to_string())
                .arg("--batch-size")
                .arg(self.batch_size.to_string())
                .arg("--learning-rate")
                .arg(self.learning_rate.to_string())
                .arg("--out")
                .arg(&self.checkpoint_dir),
            TrainingFlavor::TrainSh => cmd
                .arg(&self.dataset_dir)
                .arg(&self.voice_id)
                .arg(self.epochs.to_string())
                .arg(self.batch_size.to_string())
                .arg(self.learning_rate.to_string())
                .arg(&self.checkpoint_dir),
        };

        cmd = cmd.current_dir(&self.repo);
        if !self.use_cuda {
            cmd = cmd.env("CUDA_VISIBLE_DEVICES", "");
        }

        Ok(cmd)
    }
}

/// Run the external trainer and return the checkpoint directory
pub async fn train_voice(job: &TrainingJob, tools: &Toolbox) -> Result<PathBuf> {
    let cmd = job.command(tools)?;

    fs::create_dir_all(&job.checkpoint_dir).map_err(SuiteError::storage(&job.checkpoint_dir))?;

    info!(
        "Training {} ({}) from {}",
        job.voice_id,
        job.flavor,
        job.dataset_dir.display()
    );

    let output = cmd.run(job.timeout).await?;
    if !output.stdout.trim().is_empty() {
        info!("{}", output.stdout.trim_end());
    }

    info!("Training complete. Checkpoints: {}", job.checkpoint_dir.display());

    Ok(job.checkpoint_dir.clone())
}
