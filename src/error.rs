//! Error types shared by the pipeline and its collaborators.

use thiserror::Error;

/// Run-level failures. Exactly one of these is reported instead of a report.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No analyzable target was supplied.
    #[error("Empty video_url")]
    EmptyInput,
    /// The comment source could not be started.
    #[error("Failed to fetch comments. Check the URL or try again later.")]
    SourceUnavailable { reason: String },
    /// The stream yielded no usable comment within the cap.
    #[error("No comments found or video URL invalid.")]
    NoCommentsFound,
}

/// Failures raised by a comment source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("comment source unavailable: {0}")]
    Unavailable(String),
    #[error("malformed comment record: {0}")]
    Malformed(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failures raised while scoring a single comment.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("scorer failed: {0}")]
    Scorer(String),
    #[error("compound score {0} outside [-1, 1]")]
    OutOfRange(f64),
}

impl From<SourceError> for AnalysisError {
    fn from(err: SourceError) -> Self {
        AnalysisError::SourceUnavailable {
            reason: err.to_string(),
        }
    }
}
