//! Comment text normalization.
//!
//! Every downstream stage (sentiment, sarcasm cues, word counts) works on the
//! output of [`normalize`], never on the raw comment.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+|www\S+").unwrap());
static NON_ALNUM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]").unwrap());
static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Lowercases, strips URLs and punctuation, and collapses whitespace.
///
/// Returns an empty string when nothing analyzable is left.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let no_urls = URL_REGEX.replace_all(&lowered, "");
    let alnum = NON_ALNUM_REGEX.replace_all(&no_urls, "");
    // Punctuation removal can splice an obfuscated url back together ("h.t.t.p.s").
    let alnum = URL_REGEX.replace_all(&alnum, "");
    WHITESPACE_REGEX.replace_all(&alnum, " ").trim().to_string()
}

/// Splits normalized text into word tokens.
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split_whitespace()
}
