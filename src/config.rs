use crate::audio::AudioSettings;
use crate::prompts::DEFAULT_SEED;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub voice_id: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    pub paths: PathsConfig,
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub studio: StudioConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub work_dir: PathBuf,
    pub recordings_dir: PathBuf,
    pub dataset_dir: PathBuf,
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptsConfig {
    pub file: PathBuf,
    #[serde(default = "default_prompt_count")]
    pub count: i64,
    #[serde(default = "default_true")]
    pub randomize: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Which normalization engine the dataset build uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEngine {
    #[default]
    Ffmpeg,
    Native,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub target_sample_rate: u32,
    #[serde(default = "default_channels")]
    pub target_channels: u16,
    #[serde(default = "default_true")]
    pub normalize: bool,
    #[serde(default = "default_true")]
    pub trim_silence: bool,
    #[serde(default)]
    pub engine: AudioEngine,
    /// Concurrent normalizations; 0 = one per CPU
    #[serde(default)]
    pub workers: usize,
    /// Per-take deadline in seconds; 0 disables it
    #[serde(default = "default_normalize_timeout")]
    pub timeout_secs: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: default_sample_rate(),
            target_channels: default_channels(),
            normalize: true,
            trim_silence: true,
            engine: AudioEngine::default(),
            workers: 0,
            timeout_secs: default_normalize_timeout(),
        }
    }
}

impl AudioConfig {
    pub fn settings(&self) -> AudioSettings {
        AudioSettings {
            target_sample_rate: self.target_sample_rate,
            target_channels: self.target_channels,
            normalize: self.normalize,
            trim_silence: self.trim_silence,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudioConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Checkout of the external training repository
    pub repo_path: Option<PathBuf>,
    #[serde(default = "default_training_flavor")]
    pub flavor: String,
    #[serde(default = "default_epochs")]
    pub epochs: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_true")]
    pub use_cuda: bool,
    #[serde(default)]
    pub timeout_secs: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            repo_path: None,
            flavor: default_training_flavor(),
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            learning_rate: default_learning_rate(),
            use_cuda: true,
            timeout_secs: 0,
        }
    }
}

impl TrainingConfig {
    pub fn timeout(&self) -> Option<Duration> {
        secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_flavor")]
    pub flavor: String,
    #[serde(default = "default_onnx_opset")]
    pub onnx_opset: u32,
    #[serde(default = "default_true")]
    pub simplify_onnx: bool,
    #[serde(default)]
    pub timeout_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            flavor: default_export_flavor(),
            onnx_opset: default_onnx_opset(),
            simplify_onnx: true,
            timeout_secs: 0,
        }
    }
}

impl ExportConfig {
    pub fn timeout(&self) -> Option<Duration> {
        secs(self.timeout_secs)
    }
}

impl Config {
    /// Load from a config file (any format the `config` crate detects by
    /// extension), then apply environment overrides such as
    /// `VOICE_SUITE_AUDIO__ENGINE=native`
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("VOICE_SUITE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config {}", path))?;

        let mut cfg: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        cfg.expand_paths()?;
        cfg.validate()?;

        Ok(cfg)
    }

    /// Reject values no pipeline stage could work with
    pub fn validate(&self) -> Result<()> {
        if self.voice_id.trim().is_empty() {
            bail!("voice_id must not be empty");
        }
        if self.sample_rate == 0 {
            bail!("sample_rate must be positive");
        }
        if !(8_000..=96_000).contains(&self.audio.target_sample_rate) {
            bail!(
                "audio.target_sample_rate must be between 8000 and 96000 Hz, got {}",
                self.audio.target_sample_rate
            );
        }
        if !(1..=2).contains(&self.audio.target_channels) {
            bail!(
                "audio.target_channels must be 1 or 2, got {}",
                self.audio.target_channels
            );
        }
        if self.studio.port == 0 {
            bail!("studio.port must be non-zero");
        }
        if self.studio.max_upload_mb == 0 {
            bail!("studio.max_upload_mb must be positive");
        }
        Ok(())
    }

    fn expand_paths(&mut self) -> Result<()> {
        for path in [
            &mut self.paths.work_dir,
            &mut self.paths.recordings_dir,
            &mut self.paths.dataset_dir,
            &mut self.paths.out_dir,
            &mut self.prompts.file,
        ] {
            *path = expand(path)?;
        }
        if let Some(repo) = self.training.repo_path.as_mut() {
            *repo = expand(repo)?;
        }
        Ok(())
    }

    /// Where training writes checkpoints for this voice
    pub fn checkpoint_dir(&self) -> PathBuf {
        self.paths.work_dir.join("checkpoints").join(&self.voice_id)
    }

    pub fn studio_addr(&self) -> String {
        format!("{}:{}", self.studio.bind, self.studio.port)
    }
}

fn expand(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn secs(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

fn default_language() -> String {
    "en_US".to_string()
}

fn default_sample_rate() -> u32 {
    22050
}

fn default_channels() -> u16 {
    1
}

fn default_true() -> bool {
    true
}

fn default_prompt_count() -> i64 {
    120
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_normalize_timeout() -> u64 {
    120
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7860
}

fn default_max_upload_mb() -> usize {
    50
}

fn default_training_flavor() -> String {
    "train_py".to_string()
}

fn default_export_flavor() -> String {
    "export_onnx_py".to_string()
}

fn default_epochs() -> u32 {
    200
}

fn default_batch_size() -> u32 {
    16
}

fn default_learning_rate() -> f64 {
    2e-4
}

fn default_onnx_opset() -> u32 {
    17
}
