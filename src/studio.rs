use crate::config::Config;
use crate::error::Result;
use crate::prompts::{load_prompts, select, PromptSet};
use crate::session::{SessionRecord, TakeStore};
use tracing::info;

/// A recording session opened for the studio
///
/// Opening picks the prompts, writes the prompt manifest and the session
/// record, and leaves the store ready for uploads.
#[derive(Debug)]
pub struct Studio {
    voice_id: String,
    store: TakeStore,
    prompts: PromptSet,
    record: SessionRecord,
}

impl Studio {
    pub fn open(cfg: &Config) -> Result<Self> {
        let store = TakeStore::init(&cfg.paths.recordings_dir)?;
        let corpus = load_prompts(&cfg.prompts.file)?;
        let prompts = select(
            &corpus,
            cfg.prompts.count,
            cfg.prompts.randomize,
            cfg.prompts.seed,
        );

        Self::start(
            cfg.voice_id.clone(),
            store,
            prompts,
            cfg.prompts.randomize,
            cfg.prompts.seed,
        )
    }

    /// Persist `prompts` into `store` and start a session over them
    pub fn start(
        voice_id: String,
        store: TakeStore,
        prompts: PromptSet,
        randomize: bool,
        seed: u64,
    ) -> Result<Self> {
        let manifest = store.write_manifest(&prompts)?;
        let record = SessionRecord::new(voice_id.clone(), manifest, prompts.len(), randomize, seed);
        store.write_record(&record)?;

        info!(
            "Studio session {} for voice {} with {} prompts",
            record.session_id,
            voice_id,
            prompts.len()
        );

        Ok(Self {
            voice_id,
            store,
            prompts,
            record,
        })
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    pub fn store(&self) -> &TakeStore {
        &self.store
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }
}
