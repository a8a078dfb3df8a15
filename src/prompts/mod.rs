//! Prompt corpus loading and per-session prompt selection
//!
//! A session reads a subset of a prompt corpus aloud. Selection is pure and
//! deterministic so a session manifest can be reproduced from the corpus,
//! the requested count and the seed alone.

mod selector;

pub use selector::{load_prompts, select, Prompt, PromptSet, DEFAULT_SEED};
