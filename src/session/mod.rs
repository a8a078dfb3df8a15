//! Recording session storage
//!
//! This module provides the `TakeStore` that owns a session directory:
//! - Prompt manifest and reproducibility record written at studio start
//! - One audio + transcript pair per prompt index, overwritten on re-upload
//! - The advisory `FINALIZED` marker
//! - Lazy, rescanning enumeration of stored takes

mod record;
mod stats;
mod store;

pub use record::SessionRecord;
pub use stats::SessionStats;
pub use store::{
    parse_take_index, TakeIndices, TakeStore, FINALIZED_MARKER, PROMPTS_MANIFEST, SESSION_RECORD,
    TAKES_DIR, TAKE_AUDIO_EXT, TAKE_TRANSCRIPT_EXT,
};

pub(crate) use store::write_atomic;
