//! When a finished turn is written back to memory

use serde::{Deserialize, Serialize};

/// Phrases that mark an utterance as worth remembering
const MEMORY_INDICATORS: [&str; 13] = [
    "i like",
    "i love",
    "i hate",
    "i prefer",
    "my favorite",
    "i am",
    "i'm",
    "i work",
    "i live",
    "my name is",
    "remember",
    "don't forget",
    "important to me",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PersistencePolicy {
    /// Save every successful turn
    #[default]
    Always,
    /// Save only turns whose utterance states a preference or personal fact
    Heuristic,
    /// Never write to memory
    Never,
}

impl PersistencePolicy {
    pub fn should_persist(&self, utterance: &str) -> bool {
        match self {
            PersistencePolicy::Always => true,
            PersistencePolicy::Heuristic => is_memorable(utterance),
            PersistencePolicy::Never => false,
        }
    }
}

/// Whether the utterance contains one of the memory indicator phrases
pub fn is_memorable(utterance: &str) -> bool {
    let lower = utterance.to_lowercase();
    MEMORY_INDICATORS.iter().any(|phrase| lower.contains(phrase))
}
