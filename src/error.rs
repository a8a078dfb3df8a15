use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Maximum number of missing ids carried by [`SuiteError::MissingAudioFiles`]
pub const MISSING_IDS_SHOWN: usize = 20;

/// Errors produced by the recording-to-dataset pipeline
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No recorded takes found in {0}")]
    NoTakesFound(PathBuf),

    #[error("Missing transcript for take {take}: expected {expected}")]
    MissingTranscript { take: String, expected: PathBuf },

    #[error("Empty transcript for take {0}")]
    EmptyTranscript(u32),

    #[error("Take index {0} does not fit a 6-digit corpus id")]
    IndexOverflow(u32),

    #[error("metadata.csv not found: {0}")]
    ManifestMissing(PathBuf),

    #[error("wavs/ not found: {0}")]
    AudioDirMissing(PathBuf),

    #[error("metadata.csv is empty: {0}")]
    EmptyManifest(PathBuf),

    #[error("Bad metadata row at line {line}: {row}")]
    MalformedRow { line: usize, row: String },

    #[error("Missing wav files for {total} ids: {ids:?}")]
    MissingAudioFiles { ids: Vec<String>, total: usize },

    #[error("Command failed ({status}): {program}\n\n{output}")]
    ExternalProcessFailure {
        program: String,
        status: String,
        output: String,
    },

    #[error("{program} did not finish within {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("Missing dependencies in PATH: {}", .0.join(", "))]
    MissingTools(Vec<String>),

    #[error("Unsupported training repo layout: {0}")]
    UnsupportedTrainingRepoLayout(String),

    #[error("Audio processing failed for {path}: {message}")]
    AudioDecode { path: PathBuf, message: String },
}

impl SuiteError {
    /// Build a `map_err` adapter that tags an I/O error with the path it concerns
    pub fn storage(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> SuiteError {
        let path = path.as_ref().to_path_buf();
        move |source| SuiteError::Storage { path, source }
    }

    pub fn audio(path: impl AsRef<Path>, message: impl ToString) -> SuiteError {
        SuiteError::AudioDecode {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Whether the error was caused by the caller rather than the environment
    pub fn is_caller_error(&self) -> bool {
        matches!(self, SuiteError::InvalidInput(_))
    }
}

pub type Result<T, E = SuiteError> = std::result::Result<T, E>;
