use serde::{Deserialize, Serialize};

/// Snapshot of a recording session's progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Prompts assigned to the session
    pub prompts: usize,

    /// Takes currently stored (one per index)
    pub takes: usize,

    /// Whether the finalize marker exists
    pub finalized: bool,
}
