//! Streaming comment aggregation.
//!
//! [`CommentAggregator`] is a single-pass fold: every offered item is fully
//! evaluated first and only then recorded, so a comment that fails half way
//! never leaves the counters out of step (`positive + negative + neutral ==
//! total` holds after every `offer`). The sync and async drivers on
//! [`Pipeline`] both bound the source by the number of items *offered*.

use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, ScoreError, SourceError};
use crate::models::{AnalysisReport, AnalyzedComment, Percentages, RawComment, Totals, WordCount};
use crate::normalize::{normalize, tokens};
use crate::review::needs_review;
use crate::sarcasm::{detect_sarcasm, SarcasmConfig};
use crate::sentiment::{classify, LexiconScorer, SentimentLabel, SentimentScorer};

/// Maximum number of stream items read per run.
pub const DEFAULT_MAX_COMMENTS: usize = 800;
/// Maximum number of analyzed comments kept in the report sample.
pub const DEFAULT_SAMPLE_LIMIT: usize = 20;
/// Number of words exposed in `top_words`.
pub const TOP_WORDS_LIMIT: usize = 20;

/// The per-comment stages, shared read-only between runs.
#[derive(Clone)]
pub struct Pipeline {
    scorer: Arc<dyn SentimentScorer>,
    sarcasm: Arc<SarcasmConfig>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Arc::new(LexiconScorer::new()), SarcasmConfig::default())
    }
}

impl Pipeline {
    pub fn new(scorer: Arc<dyn SentimentScorer>, sarcasm: SarcasmConfig) -> Self {
        Self {
            scorer,
            sarcasm: Arc::new(sarcasm),
        }
    }

    /// Runs normalization, sentiment, sarcasm and the review flag on one comment.
    ///
    /// `Ok(None)` means the comment carries nothing analyzable and is skipped.
    pub fn analyze_comment(&self, raw: RawComment) -> Result<Option<AnalyzedComment>, ScoreError> {
        let Some(original) = raw.text else {
            return Ok(None);
        };
        if original.trim().is_empty() {
            return Ok(None);
        }
        let cleaned = normalize(&original);
        if cleaned.is_empty() {
            return Ok(None);
        }

        let sentiment = classify(self.scorer.as_ref(), &cleaned)?;
        let sarcasm = detect_sarcasm(&self.sarcasm, &cleaned);

        Ok(Some(AnalyzedComment {
            original,
            cleaned,
            author: raw.author,
            sentiment: sentiment.label,
            compound: sentiment.compound,
            sarcasm_score: sarcasm.score,
            is_sarcastic: sarcasm.is_sarcastic,
            needs_review: needs_review(sentiment.compound, sarcasm.is_sarcastic),
        }))
    }

    /// Starts a fresh fold for one run.
    pub fn aggregator(&self, sample_limit: usize) -> CommentAggregator<'_> {
        CommentAggregator::new(self, sample_limit)
    }

    /// Consumes at most `cap` items from `items` and builds the report.
    pub fn analyze_comments<I>(
        &self,
        items: I,
        cap: usize,
        sample_limit: usize,
    ) -> Result<AnalysisReport, AnalysisError>
    where
        I: IntoIterator<Item = Result<RawComment, SourceError>>,
    {
        let mut aggregator = self.aggregator(sample_limit);
        for item in items.into_iter().take(cap) {
            aggregator.offer(item);
        }
        aggregator.finish()
    }

    /// Async counterpart of [`Pipeline::analyze_comments`]; pulls the next
    /// item only after the current one has been recorded.
    pub async fn analyze_comment_stream<S>(
        &self,
        stream: S,
        cap: usize,
        sample_limit: usize,
    ) -> Result<AnalysisReport, AnalysisError>
    where
        S: Stream<Item = Result<RawComment, SourceError>>,
    {
        let mut aggregator = self.aggregator(sample_limit);
        let stream = stream.take(cap);
        futures::pin_mut!(stream);
        while let Some(item) = stream.next().await {
            aggregator.offer(item);
        }
        aggregator.finish()
    }
}

/// Runs the default pipeline over a plain comment list.
pub fn analyze_comments<I>(items: I, cap: usize, sample_limit: usize) -> Result<AnalysisReport, AnalysisError>
where
    I: IntoIterator<Item = Result<RawComment, SourceError>>,
{
    Pipeline::default().analyze_comments(items, cap, sample_limit)
}

/// Word counts that remember first-seen order for tie breaking.
#[derive(Debug, Default)]
struct WordFrequency {
    index: HashMap<String, usize>,
    entries: Vec<WordCount>,
}

impl WordFrequency {
    fn add(&mut self, word: &str) {
        match self.index.get(word) {
            Some(&i) => self.entries[i].count += 1,
            None => {
                self.index.insert(word.to_string(), self.entries.len());
                self.entries.push(WordCount {
                    word: word.to_string(),
                    count: 1,
                });
            }
        }
    }

    fn top(&self, n: usize) -> Vec<WordCount> {
        let mut ranked = self.entries.clone();
        // stable: equal counts keep insertion order
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }
}

/// Run-local fold state.
pub struct CommentAggregator<'a> {
    pipeline: &'a Pipeline,
    sample_limit: usize,
    offered: usize,
    totals: Totals,
    words: WordFrequency,
    samples: Vec<AnalyzedComment>,
}

impl<'a> CommentAggregator<'a> {
    fn new(pipeline: &'a Pipeline, sample_limit: usize) -> Self {
        Self {
            pipeline,
            sample_limit,
            offered: 0,
            totals: Totals::default(),
            words: WordFrequency::default(),
            samples: Vec::with_capacity(sample_limit.min(DEFAULT_SAMPLE_LIMIT)),
        }
    }

    /// Number of items offered so far, usable or not.
    pub fn offered(&self) -> usize {
        self.offered
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    /// Feeds one source item into the fold. Bad items are logged and skipped.
    pub fn offer(&mut self, item: Result<RawComment, SourceError>) {
        self.offered += 1;
        let raw = match item {
            Ok(raw) => raw,
            Err(e) => {
                warn!("⚠️ [Pipeline] Skipping item #{}: {}", self.offered, e);
                return;
            }
        };
        match self.pipeline.analyze_comment(raw) {
            Ok(Some(comment)) => self.record(comment),
            Ok(None) => debug!("[Pipeline] Item #{} has no analyzable text", self.offered),
            Err(e) => warn!("⚠️ [Pipeline] Skipping comment #{}: {}", self.offered, e),
        }
    }

    fn record(&mut self, comment: AnalyzedComment) {
        self.totals.total_comments += 1;
        match comment.sentiment {
            SentimentLabel::Positive => self.totals.positive += 1,
            SentimentLabel::Negative => self.totals.negative += 1,
            SentimentLabel::Neutral => self.totals.neutral += 1,
        }
        if comment.is_sarcastic {
            self.totals.sarcastic += 1;
        }
        for word in tokens(&comment.cleaned) {
            self.words.add(word);
        }
        if self.samples.len() < self.sample_limit {
            self.samples.push(comment);
        }
    }

    /// Closes the fold. Fails when no usable comment was seen.
    pub fn finish(self) -> Result<AnalysisReport, AnalysisError> {
        let totals = self.totals;
        if totals.total_comments == 0 {
            info!("📭 [Pipeline] No usable comments in {} offered items", self.offered);
            return Err(AnalysisError::NoCommentsFound);
        }

        let total = totals.total_comments;
        let percentages = Percentages {
            positive_pct: percent(totals.positive, total),
            negative_pct: percent(totals.negative, total),
            neutral_pct: percent(totals.neutral, total),
            sarcastic_pct: percent(totals.sarcastic, total),
        };

        info!(
            "📊 [Pipeline] Analyzed {} of {} offered comments ({} positive, {} negative, {} neutral, {} sarcastic)",
            total, self.offered, totals.positive, totals.negative, totals.neutral, totals.sarcastic
        );

        Ok(AnalysisReport {
            video_info: None,
            top_words: self.words.top(TOP_WORDS_LIMIT),
            sample_comments: self.samples,
            totals,
            percentages,
        })
    }
}

/// `count * 100 / total`, rounded to one decimal place.
///
/// Rounds the exact binary value, ties to even: `1/80` is `1.25%` and
/// reports `1.2`.
fn percent(count: u64, total: u64) -> f64 {
    let pct = count as f64 * 100.0 / total as f64;
    format!("{:.1}", pct).parse().unwrap_or(pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn ok(text: &str) -> Result<RawComment, SourceError> {
        Ok(RawComment::new(text))
    }

    /// Scorer driven by a leading marker word, for exact label control.
    struct MarkerScorer;

    impl SentimentScorer for MarkerScorer {
        fn polarity(&self, text: &str) -> Result<f64, ScoreError> {
            match text.split_whitespace().next() {
                Some("pos") => Ok(0.8),
                Some("neg") => Ok(-0.8),
                Some("boom") => Err(ScoreError::Scorer("boom".to_string())),
                Some("nan") => Ok(f64::NAN),
                _ => Ok(0.0),
            }
        }
    }

    fn marker_pipeline() -> Pipeline {
        Pipeline::new(Arc::new(MarkerScorer), SarcasmConfig::default())
    }

    #[test]
    fn test_totals_partition() {
        let items = vec![ok("pos one"), ok("neg two"), ok("meh three"), ok("pos four")];
        let report = marker_pipeline().analyze_comments(items, 800, 20).unwrap();

        let t = &report.totals;
        assert_eq!(t.total_comments, 4);
        assert_eq!(t.positive, 2);
        assert_eq!(t.negative, 1);
        assert_eq!(t.neutral, 1);
        assert_eq!(t.positive + t.negative + t.neutral, t.total_comments);
    }

    #[test]
    fn test_percentages() {
        let items = vec![ok("pos a"), ok("neg b"), ok("meh c")];
        let report = marker_pipeline().analyze_comments(items, 800, 20).unwrap();

        let p = &report.percentages;
        assert_eq!(p.positive_pct, 33.3);
        assert_eq!(p.negative_pct, 33.3);
        assert_eq!(p.neutral_pct, 33.3);
        assert_eq!(p.sarcastic_pct, 0.0);
        let sum = p.positive_pct + p.negative_pct + p.neutral_pct;
        assert!((sum - 100.0).abs() <= 0.1 + 1e-9);
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(1, 6), 16.7);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(1, 8), 12.5);
        assert_eq!(percent(0, 5), 0.0);
        assert_eq!(percent(5, 5), 100.0);
    }

    #[test]
    fn test_percent_half_rounds_to_even() {
        assert_eq!(percent(1, 80), 1.2);
        assert_eq!(percent(3, 80), 3.8);
        assert_eq!(percent(5, 80), 6.2);
        assert_eq!(percent(1, 400), 0.2);
        assert_eq!(percent(3, 400), 0.8);
    }

    #[test]
    fn test_sarcasm_counted_independently_of_label() {
        let items = vec![
            ok("pos yeah right totally"),
            ok("neg as if of course"),
            ok("meh plain"),
        ];
        let report = marker_pipeline().analyze_comments(items, 800, 20).unwrap();

        assert_eq!(report.totals.sarcastic, 2);
        assert!(report.totals.sarcastic <= report.totals.total_comments);
        assert_eq!(report.percentages.sarcastic_pct, 66.7);
        assert!(report.sample_comments[0].needs_review);
        assert!(report.sample_comments[0].is_sarcastic);
        assert!(report.sample_comments[2].needs_review);
    }

    #[test]
    fn test_sample_keeps_first_in_order() {
        let items: Vec<_> = (0..25).map(|i| ok(&format!("comment number {}", i))).collect();
        let report = marker_pipeline().analyze_comments(items, 800, 20).unwrap();

        assert_eq!(report.totals.total_comments, 25);
        assert_eq!(report.sample_comments.len(), 20);
        for (i, sample) in report.sample_comments.iter().enumerate() {
            assert_eq!(sample.original, format!("comment number {}", i));
        }
    }

    #[test]
    fn test_custom_sample_limit() {
        let items: Vec<_> = (0..5).map(|i| ok(&format!("c{}", i))).collect();
        let report = marker_pipeline().analyze_comments(items, 800, 2).unwrap();
        assert_eq!(report.sample_comments.len(), 2);
        assert_eq!(report.sample_comments[1].original, "c1");
    }

    #[test]
    fn test_sample_fields() {
        let items = vec![Ok(RawComment::new("POS, Check https://x.com/y NOW!").with_author("@viewer"))];
        let report = marker_pipeline().analyze_comments(items, 800, 20).unwrap();

        let sample = &report.sample_comments[0];
        assert_eq!(sample.original, "POS, Check https://x.com/y NOW!");
        assert_eq!(sample.cleaned, "pos check now");
        assert_eq!(sample.author.as_deref(), Some("@viewer"));
        assert_eq!(sample.sentiment, SentimentLabel::Positive);
        assert_eq!(sample.compound, 0.8);
        assert_eq!(sample.sarcasm_score, 0.0);
        assert!(!sample.needs_review);
    }

    #[test]
    fn test_blank_comments_are_skipped() {
        let items = vec![
            ok("   "),
            Ok(RawComment::default()),
            ok("!!! ???"),
            ok("https://only-a-link.example"),
            ok("pos real"),
        ];
        let report = marker_pipeline().analyze_comments(items, 800, 20).unwrap();
        assert_eq!(report.totals.total_comments, 1);
        assert_eq!(report.sample_comments.len(), 1);
        assert_eq!(report.top_words.len(), 2);
    }

    #[test]
    fn test_no_usable_comments() {
        let items = vec![ok(""), ok("   "), ok("\n\t"), Ok(RawComment::default())];
        let result = marker_pipeline().analyze_comments(items, 800, 20);
        assert!(matches!(result, Err(AnalysisError::NoCommentsFound)));

        let empty: Vec<Result<RawComment, SourceError>> = Vec::new();
        assert!(matches!(
            marker_pipeline().analyze_comments(empty, 800, 20),
            Err(AnalysisError::NoCommentsFound)
        ));
    }

    #[test]
    fn test_bad_items_are_skipped_without_breaking_totals() {
        let items = vec![
            ok("pos fine"),
            Err(SourceError::Malformed("missing text".to_string())),
            ok("boom scorer explodes"),
            ok("nan bad score"),
            ok("neg fine"),
        ];
        let pipeline = marker_pipeline();
        let mut aggregator = pipeline.aggregator(20);
        for item in items {
            aggregator.offer(item);
            let t = aggregator.totals();
            assert_eq!(t.positive + t.negative + t.neutral, t.total_comments);
        }
        assert_eq!(aggregator.offered(), 5);

        let report = aggregator.finish().unwrap();
        assert_eq!(report.totals.total_comments, 2);
        assert_eq!(report.sample_comments.len(), 2);
        assert!(report.top_words.iter().all(|w| w.word != "boom" && w.word != "nan"));
    }

    #[test]
    fn test_cap_bounds_items_read() {
        let pulled = Cell::new(0usize);
        let infinite = std::iter::from_fn(|| {
            pulled.set(pulled.get() + 1);
            Some(ok("pos again"))
        });
        let report = marker_pipeline().analyze_comments(infinite, 800, 20).unwrap();

        assert_eq!(report.totals.total_comments, 800);
        assert_eq!(pulled.get(), 800);
    }

    #[test]
    fn test_skipped_items_count_against_cap() {
        let mut n = 0;
        let alternating = std::iter::from_fn(move || {
            n += 1;
            Some(if n % 2 == 0 { ok("pos usable") } else { ok("   ") })
        });
        let report = marker_pipeline().analyze_comments(alternating, 10, 20).unwrap();
        assert_eq!(report.totals.total_comments, 5);
    }

    #[test]
    fn test_top_words_ranking() {
        let items = vec![ok("a a b"), ok("a b b b")];
        let report = marker_pipeline().analyze_comments(items, 800, 20).unwrap();

        assert_eq!(
            report.top_words,
            vec![
                WordCount { word: "b".to_string(), count: 4 },
                WordCount { word: "a".to_string(), count: 3 },
            ]
        );
    }

    #[test]
    fn test_top_words_ties_keep_first_seen_order() {
        let items = vec![ok("zeta alpha"), ok("mid mid"), ok("alpha zeta")];
        let report = marker_pipeline().analyze_comments(items, 800, 20).unwrap();

        let words: Vec<&str> = report.top_words.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(words, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_top_words_limited() {
        let text: String = (0..30).map(|i| format!("w{} ", i)).collect();
        let report = marker_pipeline().analyze_comments(vec![ok(&text)], 800, 20).unwrap();
        assert_eq!(report.top_words.len(), TOP_WORDS_LIMIT);
        assert_eq!(report.top_words[0].word, "w0");
    }

    #[test]
    fn test_default_pipeline_end_to_end() {
        let items = vec![
            ok("I love this video, best tutorial!"),
            ok("This is terrible. Worst explanation ever."),
            ok("Uploaded at 5pm"),
            ok("Yeah right, this is TOTALLY fine..."),
        ];
        let report = analyze_comments(items, DEFAULT_MAX_COMMENTS, DEFAULT_SAMPLE_LIMIT).unwrap();

        assert_eq!(report.totals.total_comments, 4);
        assert_eq!(report.sample_comments[0].sentiment, SentimentLabel::Positive);
        assert_eq!(report.sample_comments[1].sentiment, SentimentLabel::Negative);
        assert_eq!(report.sample_comments[2].sentiment, SentimentLabel::Neutral);
        assert!(report.sample_comments[2].needs_review);
        assert!(report.sample_comments[3].is_sarcastic);
        assert_eq!(report.totals.sarcastic, 1);
        assert!(report.video_info.is_none());
    }

    #[tokio::test]
    async fn test_stream_driver_matches_iterator_driver() {
        let texts = ["pos a b", "neg b c", "meh c c", "   ", "pos a"];
        let pipeline = marker_pipeline();

        let from_iter = pipeline
            .analyze_comments(texts.iter().map(|t| ok(t)), 800, 20)
            .unwrap();
        let stream = futures::stream::iter(texts.iter().map(|t| ok(t)).collect::<Vec<_>>());
        let from_stream = pipeline.analyze_comment_stream(stream, 800, 20).await.unwrap();

        assert_eq!(from_iter, from_stream);
    }

    #[tokio::test]
    async fn test_stream_cap_on_infinite_stream() {
        let stream = futures::stream::repeat_with(|| ok("neg endless"));
        let report = marker_pipeline().analyze_comment_stream(stream, 800, 20).await.unwrap();
        assert_eq!(report.totals.total_comments, 800);
        assert_eq!(report.totals.negative, 800);
        assert_eq!(report.percentages.negative_pct, 100.0);
    }
}
