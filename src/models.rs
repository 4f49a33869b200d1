use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::sentiment::SentimentLabel;

/// A comment as delivered by a comment source. Extra fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RawComment {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

impl RawComment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            author: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// One fully analyzed comment, as kept in the report sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyzedComment {
    pub original: String,
    pub cleaned: String,
    pub author: Option<String>,
    pub sentiment: SentimentLabel,
    pub compound: f64,
    pub sarcasm_score: f64,
    pub is_sarcastic: bool,
    pub needs_review: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Totals {
    pub total_comments: u64,
    pub positive: u64,
    pub negative: u64,
    pub neutral: u64,
    pub sarcastic: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Percentages {
    pub positive_pct: f64,
    pub negative_pct: f64,
    pub neutral_pct: f64,
    pub sarcastic_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WordCount {
    #[schema(example = "video")]
    pub word: String,
    pub count: u64,
}

/// Best-effort metadata about the analyzed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VideoInfo {
    #[schema(example = "Unknown title")]
    pub title: String,
    pub channel: Option<String>,
    pub views: Option<u64>,
    pub length_seconds: Option<u64>,
    pub thumbnail_url: Option<String>,
}

impl VideoInfo {
    /// Placeholder used whenever metadata cannot be resolved.
    pub fn unknown() -> Self {
        Self {
            title: "Unknown title".to_string(),
            channel: None,
            views: None,
            length_seconds: None,
            thumbnail_url: None,
        }
    }
}

impl Default for VideoInfo {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Aggregate result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_info: Option<VideoInfo>,
    pub totals: Totals,
    pub percentages: Percentages,
    pub top_words: Vec<WordCount>,
    pub sample_comments: Vec<AnalyzedComment>,
}

impl AnalysisReport {
    pub fn with_video_info(mut self, info: VideoInfo) -> Self {
        self.video_info = Some(info);
        self
    }
}
