use super::record::SessionRecord;
use super::stats::SessionStats;
use crate::error::{Result, SuiteError};
use crate::prompts::PromptSet;
use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Subdirectory holding `<index>.wav` / `<index>.txt` pairs
pub const TAKES_DIR: &str = "takes";
/// Ordered `index<TAB>text` listing of the session's prompts
pub const PROMPTS_MANIFEST: &str = "prompts_manifest.txt";
/// Freeform `key=value` reproducibility record
pub const SESSION_RECORD: &str = "session.txt";
/// Advisory completion marker
pub const FINALIZED_MARKER: &str = "FINALIZED";

pub const TAKE_AUDIO_EXT: &str = "wav";
pub const TAKE_TRANSCRIPT_EXT: &str = "txt";

/// Durable storage for one recording session
///
/// Every take artifact is replaced as a whole: bytes go to a uniquely named
/// temporary sibling first and are renamed over the target, so concurrent
/// uploads to the same index resolve to last-write-wins without torn files.
#[derive(Debug, Clone)]
pub struct TakeStore {
    session_dir: PathBuf,
    takes_dir: PathBuf,
}

impl TakeStore {
    /// Open a store over an existing (or not yet created) session directory
    pub fn open(session_dir: impl Into<PathBuf>) -> Self {
        let session_dir = session_dir.into();
        let takes_dir = session_dir.join(TAKES_DIR);
        Self {
            session_dir,
            takes_dir,
        }
    }

    /// Open the store and make sure the session and takes directories exist
    pub fn init(session_dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::open(session_dir);
        fs::create_dir_all(&store.takes_dir).map_err(SuiteError::storage(&store.takes_dir))?;

        info!("Session store ready: {}", store.session_dir.display());

        Ok(store)
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn takes_dir(&self) -> &Path {
        &self.takes_dir
    }

    pub fn audio_path(&self, index: u32) -> PathBuf {
        self.takes_dir.join(format!("{index}.{TAKE_AUDIO_EXT}"))
    }

    pub fn transcript_path(&self, index: u32) -> PathBuf {
        self.takes_dir.join(format!("{index}.{TAKE_TRANSCRIPT_EXT}"))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.session_dir.join(PROMPTS_MANIFEST)
    }

    pub fn record_path(&self) -> PathBuf {
        self.session_dir.join(SESSION_RECORD)
    }

    pub fn marker_path(&self) -> PathBuf {
        self.session_dir.join(FINALIZED_MARKER)
    }

    /// Write the session's prompt manifest, replacing any earlier selection
    pub fn write_manifest(&self, prompts: &PromptSet) -> Result<PathBuf> {
        let mut content = String::new();
        for prompt in prompts {
            content.push_str(&format!("{}\t{}\n", prompt.index, prompt.text));
        }

        let path = self.manifest_path();
        write_atomic(&path, content.as_bytes())?;

        info!("Prompt manifest written: {} ({} prompts)", path.display(), prompts.len());

        Ok(path)
    }

    pub fn write_record(&self, record: &SessionRecord) -> Result<PathBuf> {
        let path = self.record_path();
        write_atomic(&path, record.render().as_bytes())?;
        Ok(path)
    }

    /// Store one take, overwriting any previous take with the same index
    pub fn put_take(&self, index: u32, transcript: &str, audio: &[u8]) -> Result<PathBuf> {
        let audio_path = self.audio_path(index);
        let transcript_path = self.transcript_path(index);

        write_atomic(&audio_path, audio)?;
        write_atomic(&transcript_path, format!("{}\n", transcript.trim()).as_bytes())?;

        info!(
            "Take {} saved: {} ({} bytes)",
            index,
            audio_path.display(),
            audio.len()
        );

        Ok(audio_path)
    }

    /// Mark the session complete. Calling it again is a no-op.
    pub fn finalize(&self) -> Result<()> {
        let marker = self.marker_path();
        write_atomic(&marker, b"ok\n")?;

        info!("Session finalized: {}", self.session_dir.display());

        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.marker_path().is_file()
    }

    /// Scan the takes directory for audio artifacts
    ///
    /// The returned iterator reads the directory lazily. Each call starts a
    /// fresh scan, so the result always reflects what is on disk now.
    pub fn list_takes(&self) -> Result<TakeIndices> {
        let entries = fs::read_dir(&self.takes_dir).map_err(SuiteError::storage(&self.takes_dir))?;
        Ok(TakeIndices {
            dir: self.takes_dir.clone(),
            entries,
        })
    }

    pub fn stats(&self, prompts: usize) -> Result<SessionStats> {
        let takes = self.list_takes()?.collect::<Result<Vec<_>>>()?.len();

        Ok(SessionStats {
            prompts,
            takes,
            finalized: self.is_finalized(),
        })
    }
}

/// Lazy iterator over the take indices present in a takes directory
#[derive(Debug)]
pub struct TakeIndices {
    dir: PathBuf,
    entries: ReadDir,
}

impl Iterator for TakeIndices {
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => return Some(Err(SuiteError::storage(&self.dir)(e))),
            };

            if let Some(index) = parse_take_index(&entry.path()) {
                return Some(Ok(index));
            }
        }
        None
    }
}

/// Index encoded in a take audio filename, `None` for anything else
pub fn parse_take_index(path: &Path) -> Option<u32> {
    if path.extension().and_then(|e| e.to_str()) != Some(TAKE_AUDIO_EXT) {
        return None;
    }

    // Only the canonical spelling counts: `007.wav` or `+7.wav` would alias take 7
    let stem = path.file_stem()?.to_str()?;
    match stem.parse::<u32>() {
        Ok(index) if index.to_string() == stem => Some(index),
        _ => {
            debug!("Ignoring non-take audio file: {}", path.display());
            None
        }
    }
}

/// Replace `path` with `bytes` through a uniquely named temporary sibling
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SuiteError::InvalidInput(format!("not a file path: {}", path.display())))?;
    let tmp = path.with_file_name(format!(".{file_name}.{}.part", uuid::Uuid::new_v4()));

    let written = fs::write(&tmp, bytes)
        .map_err(SuiteError::storage(&tmp))
        .and_then(|_| fs::rename(&tmp, path).map_err(SuiteError::storage(path)));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }

    written
}
