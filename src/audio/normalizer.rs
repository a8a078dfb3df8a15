use super::file::{write_wav, AudioFile};
use super::process;
use crate::error::{Result, SuiteError};
use crate::tools::ToolCommand;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Level below which audio counts as silence when trimming
pub const SILENCE_THRESHOLD_DB: f32 = -45.0;
/// Shortest run of silence that gets trimmed
pub const MIN_SILENCE_SECS: f32 = 0.1;
/// Integrated loudness target
pub const TARGET_LOUDNESS_LUFS: f32 = -18.0;
/// True peak ceiling
pub const TRUE_PEAK_DBTP: f32 = -1.5;
/// Loudness range target
pub const LOUDNESS_RANGE_LU: f32 = 11.0;

/// Target format and processing switches for dataset audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSettings {
    pub target_sample_rate: u32,
    pub target_channels: u16,
    pub normalize: bool,
    pub trim_silence: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            target_sample_rate: 22050,
            target_channels: 1,
            normalize: true,
            trim_silence: true,
        }
    }
}

/// One input → output conversion
#[derive(Debug, Clone)]
pub struct NormalizeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub settings: AudioSettings,
}

/// Audio normalization engine
///
/// Implementations must trim silence (when asked) before applying loudness
/// normalization, then write `output` at the target rate and channel count.
#[async_trait::async_trait]
pub trait AudioNormalizer: Send + Sync {
    async fn normalize(&self, job: &NormalizeJob) -> Result<()>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// The `-af` filter graph for the given switches, in application order
pub fn filter_chain(settings: &AudioSettings) -> Vec<String> {
    let mut filters = Vec::new();
    if settings.trim_silence {
        filters.push(format!(
            "silenceremove=start_periods=1:start_threshold={SILENCE_THRESHOLD_DB}dB:start_silence={MIN_SILENCE_SECS}"
        ));
        filters.push(format!(
            "silenceremove=stop_periods=1:stop_threshold={SILENCE_THRESHOLD_DB}dB:stop_silence={MIN_SILENCE_SECS}"
        ));
    }
    if settings.normalize {
        filters.push(format!(
            "loudnorm=I={TARGET_LOUDNESS_LUFS}:TP={TRUE_PEAK_DBTP}:LRA={LOUDNESS_RANGE_LU}"
        ));
    }
    filters
}

/// Runs the filter chain through an ffmpeg executable
#[derive(Debug, Clone)]
pub struct FfmpegNormalizer {
    ffmpeg: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegNormalizer {
    pub fn new(ffmpeg: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            timeout,
        }
    }

    pub fn command(&self, job: &NormalizeJob) -> ToolCommand {
        let settings = &job.settings;
        let mut cmd = ToolCommand::new(&self.ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(&job.input)
            .arg("-ac")
            .arg(settings.target_channels.to_string())
            .arg("-ar")
            .arg(settings.target_sample_rate.to_string());

        let filters = filter_chain(settings);
        if !filters.is_empty() {
            cmd = cmd.arg("-af").arg(filters.join(","));
        }

        cmd.arg(&job.output)
    }
}

#[async_trait::async_trait]
impl AudioNormalizer for FfmpegNormalizer {
    async fn normalize(&self, job: &NormalizeJob) -> Result<()> {
        self.command(job).run(self.timeout).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// In-process engine for hosts without ffmpeg
///
/// Loudness normalization here is an RMS approximation of the loudnorm
/// target with a sample-peak ceiling; it does not model loudness range.
#[derive(Debug, Clone, Default)]
pub struct NativeNormalizer;

impl NativeNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn process(input: &Path, output: &Path, settings: &AudioSettings) -> Result<()> {
        let audio = AudioFile::open(input)?;
        let channels = audio.channels as usize;
        let mut samples = audio.samples;

        if settings.trim_silence {
            samples = process::trim_silence(
                &samples,
                channels,
                audio.sample_rate,
                SILENCE_THRESHOLD_DB,
                MIN_SILENCE_SECS,
            );
        }

        let target_channels = settings.target_channels as usize;
        samples = process::remix(&samples, channels, target_channels);
        samples = process::resample_linear(
            &samples,
            target_channels,
            audio.sample_rate,
            settings.target_sample_rate,
        );

        if settings.normalize {
            samples = process::normalize_loudness(&samples, TARGET_LOUDNESS_LUFS, TRUE_PEAK_DBTP);
        }

        debug!(
            "Native normalize {} -> {} ({} samples)",
            input.display(),
            output.display(),
            samples.len()
        );

        write_wav(
            output,
            &samples,
            settings.target_sample_rate,
            settings.target_channels,
        )
    }
}

#[async_trait::async_trait]
impl AudioNormalizer for NativeNormalizer {
    async fn normalize(&self, job: &NormalizeJob) -> Result<()> {
        let job = job.clone();
        let output = job.output.clone();

        tokio::task::spawn_blocking(move || Self::process(&job.input, &job.output, &job.settings))
            .await
            .map_err(|e| SuiteError::audio(&output, format!("normalizer task failed: {e}")))?
    }

    fn name(&self) -> &str {
        "native"
    }
}
