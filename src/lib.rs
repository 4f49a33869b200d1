//! Video comment analysis: normalization, sentiment, sarcasm cues, review
//! flags and streaming aggregation, plus the collaborators and HTTP surface
//! the service binary wires together.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod review;
pub mod sarcasm;
pub mod sentiment;
pub mod source;
pub mod video;

pub use error::{AnalysisError, ScoreError, SourceError};
pub use models::{AnalysisReport, AnalyzedComment, RawComment, VideoInfo};
pub use pipeline::{analyze_comments, CommentAggregator, Pipeline};
pub use sarcasm::SarcasmConfig;
pub use sentiment::{LexiconScorer, SentimentLabel, SentimentScorer};
