pub mod audio;
pub mod config;
pub mod dataset;
pub mod error;
pub mod http;
pub mod jobs;
pub mod prompts;
pub mod session;
pub mod studio;
pub mod tools;

pub use audio::{
    AudioFile, AudioNormalizer, AudioSettings, FfmpegNormalizer, NativeNormalizer, NormalizeJob,
};
pub use config::{AudioEngine, Config};
pub use dataset::{validate, CorpusEntry, Dataset, DatasetBuilder, ValidationReport};
pub use error::SuiteError;
pub use http::{create_router, AppState};
pub use jobs::{export_voice, train_voice, ExportArtifacts, ExportJob, TrainingJob};
pub use prompts::{load_prompts, select, Prompt, PromptSet};
pub use session::{SessionRecord, SessionStats, TakeStore};
pub use studio::Studio;
pub use tools::{PathLocator, ToolCommand, ToolLocator, Toolbox};
