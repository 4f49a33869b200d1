//! Cue-phrase sarcasm heuristic.
//!
//! Matching is a plain substring search over normalized text, so a cue can
//! fire inside a longer word ("as if" in "has ifs"). That looseness is kept.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cue lexicon and scoring constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarcasmConfig {
    /// Cue phrase and its weight, in match order.
    pub cues: Vec<(String, f64)>,
    /// Weighted hits are divided by this before capping at 1.0.
    #[serde(default = "default_divisor")]
    pub divisor: f64,
    /// A comment is sarcastic when its score is strictly above this.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_divisor() -> f64 {
    2.0
}

fn default_threshold() -> f64 {
    0.5
}

/// Built-in cue phrases, each with weight 1.0.
pub const DEFAULT_CUES: &[&str] = &[
    "yeah right",
    "as if",
    "totally",
    "sure buddy",
    "/s",
    "what a joke",
    "great job",
    "nice job",
    "of course",
    "so good",
    "amazing work",
    "best ever",
    "love this so much",
];

impl Default for SarcasmConfig {
    /// Thirteen cues at weight 1.0, divisor 2.0, threshold 0.5: two distinct
    /// cues are needed to flag a comment.
    fn default() -> Self {
        Self {
            cues: DEFAULT_CUES.iter().map(|c| (c.to_string(), 1.0)).collect(),
            divisor: default_divisor(),
            threshold: default_threshold(),
        }
    }
}

impl SarcasmConfig {
    /// Loads a lexicon override from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading sarcasm lexicon {}", path.display()))?;
        let config: SarcasmConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parsing sarcasm lexicon {}", path.display()))?;
        if config.divisor <= 0.0 {
            anyhow::bail!("sarcasm divisor must be positive, got {}", config.divisor);
        }
        Ok(config)
    }
}

/// Result of the sarcasm heuristic for one comment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SarcasmResult {
    pub score: f64,
    pub is_sarcastic: bool,
}

/// Scores normalized text against the cue lexicon.
pub fn detect_sarcasm(config: &SarcasmConfig, normalized: &str) -> SarcasmResult {
    let text = normalized.to_lowercase();
    let hits: f64 = config
        .cues
        .iter()
        .filter(|(cue, _)| text.contains(cue.to_lowercase().as_str()))
        .map(|(_, weight)| weight)
        .sum();
    let score = (hits / config.divisor).clamp(0.0, 1.0);
    SarcasmResult {
        score,
        is_sarcastic: score > config.threshold,
    }
}
