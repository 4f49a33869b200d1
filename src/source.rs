//! Comment sources.
//!
//! A source turns a video id into an ordered, possibly unbounded stream of
//! [`RawComment`]s. Failing to open is a run-level error; errors yielded once
//! the stream is running are per-item and get skipped by the pipeline.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::models::RawComment;

const COMMENT_THREADS_URL: &str = "https://www.googleapis.com/youtube/v3/commentThreads";
const PAGE_SIZE: u32 = 100;
const MAX_ATTEMPTS: u32 = 3;

pub type CommentStream = BoxStream<'static, Result<RawComment, SourceError>>;

#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn open(&self, video_id: &str) -> Result<CommentStream, SourceError>;
}

// ============================================================================
// YouTube Data API
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadPage {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThread {
    snippet: ThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    #[serde(default)]
    text_original: Option<String>,
    #[serde(default)]
    text_display: Option<String>,
    #[serde(default)]
    author_display_name: Option<String>,
}

fn thread_to_comment(value: serde_json::Value) -> Result<RawComment, SourceError> {
    let thread: CommentThread =
        serde_json::from_value(value).map_err(|e| SourceError::Malformed(e.to_string()))?;
    let snippet = thread.snippet.top_level_comment.snippet;
    Ok(RawComment {
        text: snippet.text_original.or(snippet.text_display),
        author: snippet.author_display_name,
    })
}

/// Top-level comments through the YouTube Data API v3.
#[derive(Clone)]
pub struct YouTubeCommentSource {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl YouTubeCommentSource {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

/// Paging state carried between stream pulls.
struct PageCursor {
    client: reqwest::Client,
    api_key: String,
    video_id: String,
    buffered: VecDeque<Result<RawComment, SourceError>>,
    next_page: Option<String>,
}

impl PageCursor {
    fn absorb(&mut self, page: CommentThreadPage) {
        debug!(
            "[Source] Page with {} threads for {} (more: {})",
            page.items.len(),
            self.video_id,
            page.next_page_token.is_some()
        );
        self.buffered.extend(page.items.into_iter().map(thread_to_comment));
        self.next_page = page.next_page_token;
    }

    async fn fetch(&self, page_token: Option<&str>) -> Result<CommentThreadPage, SourceError> {
        let mut attempt = 1;
        loop {
            match self.fetch_attempt(page_token).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    // 4xx (bad key, comments disabled, unknown video) will not fix itself
                    let retryable = match &e {
                        SourceError::Http(err) => !err.status().map(|s| s.is_client_error()).unwrap_or(false),
                        _ => false,
                    };
                    warn!("❌ [Source] Attempt {}/{} failed: {}", attempt, MAX_ATTEMPTS, e);
                    if !retryable || attempt >= MAX_ATTEMPTS {
                        return Err(e);
                    }
                    sleep(Duration::from_millis(500 * attempt as u64)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn fetch_attempt(&self, page_token: Option<&str>) -> Result<CommentThreadPage, SourceError> {
        let page_size = PAGE_SIZE.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("videoId", self.video_id.as_str()),
            ("maxResults", page_size.as_str()),
            ("order", "time"),
            ("textFormat", "plainText"),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let page = self
            .client
            .get(COMMENT_THREADS_URL)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json::<CommentThreadPage>()
            .await?;
        Ok(page)
    }
}

#[async_trait]
impl CommentSource for YouTubeCommentSource {
    async fn open(&self, video_id: &str) -> Result<CommentStream, SourceError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| SourceError::Unavailable("YOUTUBE_API_KEY not set".to_string()))?;

        let mut cursor = PageCursor {
            client: self.client.clone(),
            api_key,
            video_id: video_id.to_string(),
            buffered: VecDeque::new(),
            next_page: None,
        };

        // The first page decides whether the source started at all
        let first = cursor.fetch(None).await?;
        cursor.absorb(first);
        info!("📥 [Source] Comment stream opened for {}", video_id);

        let comments = stream::unfold(cursor, |mut cursor| async move {
            loop {
                if let Some(item) = cursor.buffered.pop_front() {
                    return Some((item, cursor));
                }
                let Some(token) = cursor.next_page.take() else {
                    return None;
                };
                match cursor.fetch(Some(&token)).await {
                    Ok(page) => cursor.absorb(page),
                    // next_page is already cleared, so the stream ends after this item
                    Err(e) => return Some((Err(e), cursor)),
                }
            }
        });

        Ok(comments.boxed())
    }
}

// ============================================================================
// In-memory source
// ============================================================================

/// Serves a fixed list of records for every video id.
///
/// Records that failed to parse are kept in place and surface as
/// [`SourceError::Malformed`] items.
#[derive(Debug, Clone, Default)]
pub struct StaticCommentSource {
    records: Vec<Result<RawComment, String>>,
}

impl StaticCommentSource {
    pub fn new(comments: Vec<RawComment>) -> Self {
        Self {
            records: comments.into_iter().map(Ok).collect(),
        }
    }

    /// Parses a JSON array or JSON-lines document of `{text, author}` records.
    pub fn from_json(raw: &str) -> Result<Self, SourceError> {
        let trimmed = raw.trim_start();
        if trimmed.starts_with('[') {
            let values: Vec<serde_json::Value> =
                serde_json::from_str(trimmed).map_err(|e| SourceError::Unavailable(e.to_string()))?;
            let records = values
                .into_iter()
                .map(|v| serde_json::from_value::<RawComment>(v).map_err(|e| e.to_string()))
                .collect();
            return Ok(Self { records });
        }

        let records = raw
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str::<RawComment>(line).map_err(|e| format!("line {}: {}", n + 1, e))
            })
            .collect();
        Ok(Self { records })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Unavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The records as pipeline items.
    pub fn items(&self) -> impl Iterator<Item = Result<RawComment, SourceError>> + '_ {
        self.records
            .iter()
            .map(|r| r.clone().map_err(SourceError::Malformed))
    }
}

#[async_trait]
impl CommentSource for StaticCommentSource {
    async fn open(&self, _video_id: &str) -> Result<CommentStream, SourceError> {
        let items: Vec<_> = self.items().collect();
        Ok(stream::iter(items).boxed())
    }
}
