//! Human-review flag.

/// Compound scores strictly inside `(-AMBIGUITY_BAND, AMBIGUITY_BAND)` are too weak to trust.
pub const AMBIGUITY_BAND: f64 = 0.1;

/// Sarcastic comments always need review; otherwise only weak sentiment does.
pub fn needs_review(compound: f64, is_sarcastic: bool) -> bool {
    if is_sarcastic {
        return true;
    }
    -AMBIGUITY_BAND < compound && compound < AMBIGUITY_BAND
}
