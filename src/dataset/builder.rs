use super::manifest::{self, corpus_id, CorpusEntry, AUDIO_EXT, METADATA_FILE, WAVS_DIR};
use crate::audio::{AudioNormalizer, AudioSettings, NormalizeJob};
use crate::error::{Result, SuiteError};
use crate::session::{write_atomic, TakeStore};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

const STAGING_DIR: &str = ".staging";
const RETIRED_DIR: &str = ".previous";

/// A built corpus: normalized audio plus its manifest
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub root: PathBuf,
    pub wavs_dir: PathBuf,
    pub manifest: PathBuf,
    pub entries: Vec<CorpusEntry>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A take that passed every pre-flight check
#[derive(Debug, Clone)]
struct PlannedTake {
    index: u32,
    id: String,
    input: PathBuf,
    text: String,
}

/// Compiles a session's takes into an LJSpeech-style corpus
pub struct DatasetBuilder {
    normalizer: Arc<dyn AudioNormalizer>,
    workers: usize,
}

impl DatasetBuilder {
    pub fn new(normalizer: Arc<dyn AudioNormalizer>) -> Self {
        Self {
            normalizer,
            workers: num_cpus::get(),
        }
    }

    /// Limit how many takes are normalized at once (minimum 1)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Build `dataset_dir` from the takes stored under `session_dir`
    ///
    /// Every take is checked before any audio is processed. Output is staged
    /// and only replaces an existing `wavs/` + `metadata.csv` once every take
    /// has been normalized; on failure the previous dataset is untouched.
    pub async fn build(
        &self,
        session_dir: &Path,
        dataset_dir: &Path,
        settings: &AudioSettings,
    ) -> Result<Dataset> {
        let store = TakeStore::open(session_dir);
        let plan = plan_takes(&store)?;

        info!(
            "Building dataset from {} takes with {} ({} workers)",
            plan.len(),
            self.normalizer.name(),
            self.workers
        );

        fs::create_dir_all(dataset_dir).map_err(SuiteError::storage(dataset_dir))?;
        let staging = dataset_dir.join(STAGING_DIR);
        if staging.exists() {
            warn!("Removing leftover staging directory: {}", staging.display());
            fs::remove_dir_all(&staging).map_err(SuiteError::storage(&staging))?;
        }
        let staging_wavs = staging.join(WAVS_DIR);
        fs::create_dir_all(&staging_wavs).map_err(SuiteError::storage(&staging_wavs))?;

        let result = self.normalize_all(plan, &staging_wavs, settings).await;
        let mut done = match result {
            Ok(done) => done,
            Err(e) => {
                error!("Dataset build failed: {}", e);
                discard(&staging);
                return Err(e);
            }
        };
        done.sort_by_key(|take| take.index);

        let wavs_dir = dataset_dir.join(WAVS_DIR);
        let entries: Vec<CorpusEntry> = done
            .into_iter()
            .map(|take| CorpusEntry {
                audio: wavs_dir.join(format!("{}.{AUDIO_EXT}", take.id)),
                id: take.id,
                text: take.text,
            })
            .collect();

        let staged_manifest = staging.join(METADATA_FILE);
        if let Err(e) = write_atomic(&staged_manifest, manifest::render(&entries).as_bytes()) {
            discard(&staging);
            return Err(e);
        }

        commit(&staging, dataset_dir)?;

        let manifest_path = dataset_dir.join(METADATA_FILE);
        for entry in &entries {
            info!("wav: {}", entry.audio.display());
        }
        info!("Dataset built: {}", dataset_dir.display());
        info!("   wavs: {}", wavs_dir.display());
        info!("   metadata: {}", manifest_path.display());

        Ok(Dataset {
            root: dataset_dir.to_path_buf(),
            wavs_dir,
            manifest: manifest_path,
            entries,
        })
    }

    async fn normalize_all(
        &self,
        plan: Vec<PlannedTake>,
        out_dir: &Path,
        settings: &AudioSettings,
    ) -> Result<Vec<PlannedTake>> {
        let normalizer = &self.normalizer;

        stream::iter(plan)
            .map(|take| {
                let job = NormalizeJob {
                    input: take.input.clone(),
                    output: out_dir.join(format!("{}.{AUDIO_EXT}", take.id)),
                    settings: *settings,
                };
                async move {
                    normalizer.normalize(&job).await?;
                    info!("Normalized take {} -> {}", take.index, job.output.display());
                    Ok::<_, SuiteError>(take)
                }
            })
            .buffer_unordered(self.workers)
            .try_collect()
            .await
    }
}

// Pre-flight: enumerate takes in numeric order and check transcripts and ids
fn plan_takes(store: &TakeStore) -> Result<Vec<PlannedTake>> {
    let takes_dir = store.takes_dir();
    if !takes_dir.is_dir() {
        return Err(SuiteError::NoTakesFound(takes_dir.to_path_buf()));
    }

    let mut indices = store.list_takes()?.collect::<Result<Vec<u32>>>()?;
    if indices.is_empty() {
        return Err(SuiteError::NoTakesFound(takes_dir.to_path_buf()));
    }
    indices.sort_unstable();

    indices
        .into_iter()
        .map(|index| {
            let input = store.audio_path(index);
            let transcript = store.transcript_path(index);
            if !transcript.is_file() {
                return Err(SuiteError::MissingTranscript {
                    take: format!("{index}.{AUDIO_EXT}"),
                    expected: transcript,
                });
            }

            let raw = fs::read_to_string(&transcript).map_err(SuiteError::storage(&transcript))?;
            let text = manifest::single_line(&raw);
            if text.is_empty() {
                return Err(SuiteError::EmptyTranscript(index));
            }

            Ok(PlannedTake {
                index,
                id: corpus_id(index)?,
                input,
                text,
            })
        })
        .collect()
}

// Move staged output into place, keeping the old dataset aside until the
// new one is fully installed.
fn commit(staging: &Path, dataset_dir: &Path) -> Result<()> {
    let wavs = dataset_dir.join(WAVS_DIR);
    let manifest = dataset_dir.join(METADATA_FILE);
    let retired = dataset_dir.join(RETIRED_DIR);

    let prepared = if retired.exists() {
        fs::remove_dir_all(&retired)
    } else {
        Ok(())
    }
    .and_then(|_| fs::create_dir_all(&retired));
    if let Err(e) = prepared {
        discard(staging);
        return Err(SuiteError::storage(&retired)(e));
    }

    // From the first rename on, any failure puts the previous dataset back
    let swapped = swap(staging, &wavs, &manifest, &retired);
    if let Err(e) = swapped {
        error!("Failed to install dataset, restoring previous one: {}", e);
        restore(&retired, &wavs, &manifest);
        discard(staging);
        return Err(SuiteError::storage(dataset_dir)(e));
    }

    discard(staging);
    discard(&retired);

    Ok(())
}

fn swap(staging: &Path, wavs: &Path, manifest: &Path, retired: &Path) -> std::io::Result<()> {
    if wavs.exists() {
        fs::rename(wavs, retired.join(WAVS_DIR))?;
    }
    if manifest.exists() {
        fs::rename(manifest, retired.join(METADATA_FILE))?;
    }
    fs::rename(staging.join(WAVS_DIR), wavs)?;
    fs::rename(staging.join(METADATA_FILE), manifest)
}

// Only paths that were actually retired are put back; the rest stay as found
fn restore(retired: &Path, wavs: &Path, manifest: &Path) {
    let old_wavs = retired.join(WAVS_DIR);
    if old_wavs.exists() {
        let _ = fs::remove_dir_all(wavs);
        if let Err(e) = fs::rename(&old_wavs, wavs) {
            error!("Failed to restore {}: {}", wavs.display(), e);
        }
    }
    let old_manifest = retired.join(METADATA_FILE);
    if old_manifest.exists() {
        let _ = fs::remove_file(manifest);
        if let Err(e) = fs::rename(&old_manifest, manifest) {
            error!("Failed to restore {}: {}", manifest.display(), e);
        }
    }
}

fn discard(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir) {
        warn!("Failed to remove {}: {}", dir.display(), e);
    }
}
