//! External training and export jobs
//!
//! Each external repository entry point is described by a flavor with a
//! fixed argument schema. Unknown flavors, or a repository missing the
//! flavor's script, fail before anything is spawned.

pub mod export;
pub mod training;

pub use export::{
    export_voice, ExportArtifacts, ExportFlavor, ExportJob, InferenceDefaults, VoiceMetadata,
};
pub use training::{train_voice, TrainingFlavor, TrainingJob};
