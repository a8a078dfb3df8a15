use crate::error::{Result, SuiteError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Seed used when the configuration does not name one
pub const DEFAULT_SEED: u64 = 1337;

/// A single line the speaker is asked to read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// 0-based presentation position within the session
    #[serde(rename = "idx")]
    pub index: u32,
    pub text: String,
}

/// Ordered prompts assigned to one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptSet {
    prompts: Vec<Prompt>,
}

impl PromptSet {
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prompt> {
        self.prompts.iter()
    }

    pub fn get(&self, index: u32) -> Option<&Prompt> {
        self.prompts.get(index as usize)
    }

    pub fn as_slice(&self) -> &[Prompt] {
        &self.prompts
    }
}

impl<'a> IntoIterator for &'a PromptSet {
    type Item = &'a Prompt;
    type IntoIter = std::slice::Iter<'a, Prompt>;

    fn into_iter(self) -> Self::IntoIter {
        self.prompts.iter()
    }
}

/// Read a prompt corpus: one prompt per line, trimmed, blank lines dropped
pub fn load_prompts(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(SuiteError::storage(path))?;

    let prompts: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    info!("Loaded {} prompts from {}", prompts.len(), path.display());

    Ok(prompts)
}

/// Pick `count` prompts from `corpus`
///
/// With `randomize` the whole corpus is shuffled by a PRNG seeded from `seed`
/// before the head is taken, so identical arguments always give identical
/// selections. A non-positive count or an empty corpus yields an empty set.
pub fn select(corpus: &[String], count: i64, randomize: bool, seed: u64) -> PromptSet {
    if count <= 0 || corpus.is_empty() {
        return PromptSet::default();
    }

    let take = usize::try_from(count).map_or(corpus.len(), |n| n.min(corpus.len()));

    let mut items: Vec<&String> = corpus.iter().collect();
    if randomize {
        let mut rng = StdRng::seed_from_u64(seed);
        items.shuffle(&mut rng);
    }

    let prompts = items
        .into_iter()
        .take(take)
        .enumerate()
        .map(|(i, text)| Prompt {
            index: i as u32,
            text: text.clone(),
        })
        .collect();

    PromptSet { prompts }
}
