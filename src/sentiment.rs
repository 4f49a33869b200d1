//! Lexicon-based sentiment scoring and labelling.
//!
//! The pipeline only depends on the [`SentimentScorer`] trait: anything that
//! maps normalized text to a compound polarity in `[-1.0, 1.0]` (positive =
//! favourable) can be plugged in. [`LexiconScorer`] is the built-in rule-based
//! scorer: word valences, boosters, negation and a "but" contrast rule, squashed
//! into a compound score. No external ML dependencies.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use utoipa::ToSchema;

use crate::error::ScoreError;

/// Compound scores at or above this are Positive.
pub const POSITIVE_THRESHOLD: f64 = 0.05;
/// Compound scores at or below this are Negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

/// Normalization constant for squashing a valence sum into (-1, 1).
const ALPHA: f64 = 15.0;
const BOOSTER_INCREMENT: f64 = 0.293;
const NEGATION_SCALAR: f64 = -0.74;
const BUT_BEFORE_SCALAR: f64 = 0.5;
const BUT_AFTER_SCALAR: f64 = 1.5;

// Word valences on a -4..+4 scale
static VALENCES: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    vec![
        // positive
        ("good", 1.9), ("great", 3.1), ("excellent", 2.7), ("amazing", 2.8),
        ("awesome", 3.1), ("wonderful", 2.7), ("fantastic", 2.6), ("brilliant", 2.8),
        ("incredible", 2.3), ("perfect", 2.7), ("beautiful", 2.9), ("nice", 1.8),
        ("cool", 1.3), ("fun", 2.3), ("funny", 1.9), ("hilarious", 1.7),
        ("love", 3.2), ("loved", 2.9), ("loving", 2.9), ("loves", 2.7),
        ("like", 1.5), ("liked", 1.8), ("likes", 1.8), ("enjoy", 2.2),
        ("enjoyed", 2.3), ("happy", 2.7), ("glad", 2.0), ("thanks", 1.9),
        ("thank", 1.5), ("best", 3.2), ("better", 1.9), ("win", 2.8),
        ("wow", 2.8), ("helpful", 1.8), ("useful", 1.9), ("interesting", 1.7),
        ("impressive", 2.3), ("masterpiece", 3.1), ("legend", 1.9), ("legendary", 2.3),
        ("respect", 2.1), ("support", 1.7), ("recommend", 1.5), ("favorite", 2.0),
        ("favourite", 2.0), ("excited", 1.4), ("exciting", 2.2), ("cute", 2.0),
        ("sweet", 2.0), ("epic", 2.2), ("yes", 1.7), ("agree", 1.5),
        ("smart", 1.7), ("talented", 2.3), ("inspiring", 2.2), ("wholesome", 2.0),
        ("lol", 1.8), ("haha", 1.8), ("lmao", 2.0), ("joy", 2.8),
        ("congrats", 2.4), ("congratulations", 2.9), ("proud", 2.1), ("satisfying", 2.0),
        // negative
        ("bad", -2.5), ("terrible", -2.5), ("awful", -2.0), ("horrible", -2.5),
        ("worst", -3.1), ("worse", -2.1), ("hate", -2.7), ("hated", -3.2),
        ("hates", -1.9), ("dislike", -1.6), ("boring", -1.3), ("bored", -1.1),
        ("stupid", -2.4), ("dumb", -2.3), ("idiot", -2.3), ("trash", -1.5),
        ("garbage", -1.8), ("rubbish", -1.7), ("useless", -1.8), ("waste", -1.8),
        ("wasted", -2.2), ("fake", -2.1), ("scam", -2.6), ("fraud", -2.8),
        ("sad", -2.1), ("angry", -2.3), ("annoying", -1.7), ("annoyed", -1.6),
        ("disappointed", -1.9), ("disappointing", -2.2), ("fail", -2.5), ("failed", -2.3),
        ("wrong", -2.1), ("problem", -1.7), ("broken", -1.9), ("cringe", -1.7),
        ("lame", -1.8), ("ugly", -2.3), ("poor", -2.1), ("pathetic", -2.5),
        ("ridiculous", -1.5), ("joke", -0.6), ("no", -1.2), ("sucks", -1.5),
        ("suck", -1.9), ("disgusting", -2.4), ("misleading", -1.9), ("clickbait", -1.5),
        ("lie", -1.6), ("lies", -1.8), ("lying", -2.1), ("cry", -2.1),
        ("died", -2.6), ("dead", -3.3), ("kill", -3.7), ("sorry", -0.3),
        ("unfortunately", -1.5), ("mediocre", -1.0), ("overrated", -1.6), ("meh", -0.5),
    ]
    .into_iter()
    .collect()
});

// Intensity modifiers: positive entries amplify the next sentiment word, negative ones dampen it
static BOOSTERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    vec![
        ("absolutely", BOOSTER_INCREMENT), ("very", BOOSTER_INCREMENT), ("really", BOOSTER_INCREMENT),
        ("so", BOOSTER_INCREMENT), ("extremely", BOOSTER_INCREMENT), ("super", BOOSTER_INCREMENT),
        ("incredibly", BOOSTER_INCREMENT), ("totally", BOOSTER_INCREMENT), ("completely", BOOSTER_INCREMENT),
        ("most", BOOSTER_INCREMENT), ("highly", BOOSTER_INCREMENT), ("too", BOOSTER_INCREMENT),
        ("barely", -BOOSTER_INCREMENT), ("kinda", -BOOSTER_INCREMENT), ("slightly", -BOOSTER_INCREMENT),
        ("somewhat", -BOOSTER_INCREMENT), ("hardly", -BOOSTER_INCREMENT), ("sorta", -BOOSTER_INCREMENT),
    ]
    .into_iter()
    .collect()
});

// Apostrophes are already stripped by normalization, so only the joined forms appear
static NEGATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    vec![
        "not", "never", "no", "nothing", "nobody", "none", "neither", "nor", "nowhere",
        "cant", "cannot", "dont", "doesnt", "didnt", "isnt", "arent", "wasnt", "werent",
        "wont", "wouldnt", "shouldnt", "couldnt", "aint", "without",
    ]
    .into_iter()
    .collect()
});

/// Anything that can turn text into a compound polarity in `[-1.0, 1.0]`.
pub trait SentimentScorer: Send + Sync {
    fn polarity(&self, text: &str) -> Result<f64, ScoreError>;
}

/// Three-way sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Maps a compound score to a label. The positive check runs first.
    pub fn from_compound(compound: f64) -> Self {
        if compound >= POSITIVE_THRESHOLD {
            SentimentLabel::Positive
        } else if compound <= NEGATIVE_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

/// Result of sentiment analysis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentResult {
    pub compound: f64,
    pub label: SentimentLabel,
}

/// Scores normalized text and labels it.
///
/// A scorer error, or a score that is not a finite number in `[-1, 1]`, is
/// reported as a [`ScoreError`] so the caller can skip the comment.
pub fn classify(scorer: &dyn SentimentScorer, normalized: &str) -> Result<SentimentResult, ScoreError> {
    let compound = scorer.polarity(normalized)?;
    if !compound.is_finite() || !(-1.0..=1.0).contains(&compound) {
        return Err(ScoreError::OutOfRange(compound));
    }
    Ok(SentimentResult {
        compound,
        label: SentimentLabel::from_compound(compound),
    })
}

/// Rule-based scorer over whitespace tokens of normalized text.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    fn word_valence(words: &[&str], i: usize) -> f64 {
        let word = words[i];
        if BOOSTERS.contains_key(word) {
            return 0.0;
        }
        let Some(&base) = VALENCES.get(word) else {
            return 0.0;
        };

        let mut valence = base;
        for (distance, decay) in [(1usize, 1.0), (2, 0.95), (3, 0.9)] {
            if i < distance {
                break;
            }
            if let Some(&boost) = BOOSTERS.get(words[i - distance]) {
                let boost = if valence < 0.0 { -boost } else { boost };
                valence += boost * decay;
            }
        }

        let negated = (1..=3)
            .filter(|d| i >= *d)
            .any(|d| NEGATIONS.contains(words[i - d]));
        if negated {
            valence *= NEGATION_SCALAR;
        }
        valence
    }
}

impl SentimentScorer for LexiconScorer {
    fn polarity(&self, text: &str) -> Result<f64, ScoreError> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Ok(0.0);
        }

        let mut valences: Vec<f64> = (0..words.len())
            .map(|i| Self::word_valence(&words, i))
            .collect();

        // Contrast: the clause after "but" dominates
        if let Some(but_pos) = words.iter().position(|w| *w == "but") {
            for (i, valence) in valences.iter_mut().enumerate() {
                if i < but_pos {
                    *valence *= BUT_BEFORE_SCALAR;
                } else if i > but_pos {
                    *valence *= BUT_AFTER_SCALAR;
                }
            }
        }

        let sum: f64 = valences.iter().sum();
        if sum == 0.0 {
            return Ok(0.0);
        }
        let compound = sum / (sum * sum + ALPHA).sqrt();
        Ok(compound.clamp(-1.0, 1.0))
    }
}
