//! LJSpeech-style corpus assembly and validation
//!
//! Layout produced under a dataset directory:
//! - `wavs/<id>.wav` - normalized audio, `id` is the take index padded to 6 digits
//! - `metadata.csv` - `id|text|text` rows in ascending index order

mod builder;
pub mod manifest;
mod validator;

pub use builder::{Dataset, DatasetBuilder};
pub use manifest::{corpus_id, CorpusEntry, METADATA_FILE, WAVS_DIR};
pub use validator::{validate, ValidationReport, MAX_SCANNED_ROWS};
