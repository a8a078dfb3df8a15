use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Reproducibility record written next to the prompt manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique id of this studio run
    pub session_id: Uuid,

    /// When the studio was started
    pub created_at: DateTime<Utc>,

    /// Voice being recorded
    pub voice_id: String,

    /// Location of the prompt manifest
    pub manifest: PathBuf,

    /// Number of prompts selected
    pub count: usize,

    /// Whether the corpus was shuffled before selection
    pub randomize: bool,

    /// Seed used for the shuffle
    pub seed: u64,
}

impl SessionRecord {
    pub fn new(
        voice_id: impl Into<String>,
        manifest: PathBuf,
        count: usize,
        randomize: bool,
        seed: u64,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            created_at: Utc::now(),
            voice_id: voice_id.into(),
            manifest,
            count,
            randomize,
            seed,
        }
    }

    /// `key=value` lines, one per field
    pub fn render(&self) -> String {
        format!(
            "session_id={}\ncreated_at={}\nvoice_id={}\nmanifest={}\ncount={}\nrandomize={}\nseed={}\n",
            self.session_id,
            self.created_at.to_rfc3339(),
            self.voice_id,
            self.manifest.display(),
            self.count,
            self.randomize,
            self.seed,
        )
    }
}
