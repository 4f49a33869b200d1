//! Video id extraction and best-effort metadata lookup.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::VideoInfo;

const DATA_API_VIDEOS_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const OEMBED_URL: &str = "https://www.youtube.com/oembed";

// Tried in order; the last one is a loose fallback for bare ids.
static VIDEO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"youtu\.be/([A-Za-z0-9_-]{6,})").unwrap(),
        Regex::new(r"[?&]v=([A-Za-z0-9_-]{6,})").unwrap(),
        Regex::new(r"shorts/([A-Za-z0-9_-]{6,})").unwrap(),
        Regex::new(r"([A-Za-z0-9_-]{11})").unwrap(),
    ]
});

static ISO_DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$").unwrap()
});

/// Pulls a video id out of the common YouTube URL shapes.
pub fn extract_video_id(raw_url: &str) -> Option<String> {
    if raw_url.is_empty() {
        return None;
    }
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(raw_url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Parses an ISO-8601 duration such as `PT1H2M3S` into seconds.
pub fn parse_iso_duration(value: &str) -> Option<u64> {
    let caps = ISO_DURATION_REGEX.captures(value)?;
    let part = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse::<u64>().ok(),
            None => Some(0),
        }
    };
    part(1)?
        .checked_mul(86_400)?
        .checked_add(part(2)?.checked_mul(3_600)?)?
        .checked_add(part(3)?.checked_mul(60)?)?
        .checked_add(part(4)?)
}

/// Source of video metadata.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn video_info(&self, video_id: &str) -> Result<VideoInfo>;
}

/// Resolves metadata for a URL, falling back to [`VideoInfo::unknown`] on any failure.
pub async fn fetch_video_info_safe(provider: &dyn MetadataProvider, raw_url: &str) -> VideoInfo {
    let Some(video_id) = extract_video_id(raw_url) else {
        debug!("[Metadata] No video id in {:?}", raw_url);
        return VideoInfo::unknown();
    };
    match provider.video_info(&video_id).await {
        Ok(info) => info,
        Err(e) => {
            warn!("⚠️ [Metadata] Lookup failed for {}: {:#}", video_id, e);
            VideoInfo::unknown()
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: Option<VideoStatistics>,
    #[serde(default)]
    content_details: Option<VideoContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    channel_title: Option<String>,
    #[serde(default)]
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    high: Option<Thumbnail>,
    #[serde(default)]
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    // The Data API sends counts as strings
    #[serde(default)]
    view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoContentDetails {
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: String,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

/// YouTube metadata via the Data API when a key is configured, oEmbed otherwise.
pub struct YouTubeMetadata {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl YouTubeMetadata {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    async fn from_data_api(&self, video_id: &str, api_key: &str) -> Result<VideoInfo> {
        let response = self
            .client
            .get(DATA_API_VIDEOS_URL)
            .query(&[
                ("part", "snippet,statistics,contentDetails"),
                ("id", video_id),
                ("key", api_key),
            ])
            .send()
            .await
            .context("videos request failed")?
            .error_for_status()
            .context("videos request rejected")?;

        let body: VideoListResponse = response.json().await.context("videos response parse error")?;
        let item = body
            .items
            .into_iter()
            .next()
            .with_context(|| format!("video {} not found", video_id))?;

        let thumbnail_url = item
            .snippet
            .thumbnails
            .and_then(|t| t.high.or(t.default))
            .map(|t| t.url);

        Ok(VideoInfo {
            title: item.snippet.title,
            channel: item.snippet.channel_title,
            views: item
                .statistics
                .and_then(|s| s.view_count)
                .and_then(|v| v.parse().ok()),
            length_seconds: item
                .content_details
                .and_then(|c| c.duration)
                .and_then(|d| parse_iso_duration(&d)),
            thumbnail_url,
        })
    }

    async fn from_oembed(&self, video_id: &str) -> Result<VideoInfo> {
        let url = watch_url(video_id);
        let body: OEmbedResponse = self
            .client
            .get(OEMBED_URL)
            .query(&[("url", url.as_str()), ("format", "json")])
            .send()
            .await
            .context("oembed request failed")?
            .error_for_status()
            .context("oembed request rejected")?
            .json()
            .await
            .context("oembed response parse error")?;

        Ok(VideoInfo {
            title: body.title,
            channel: body.author_name,
            views: None,
            length_seconds: None,
            thumbnail_url: body.thumbnail_url,
        })
    }
}

#[async_trait]
impl MetadataProvider for YouTubeMetadata {
    async fn video_info(&self, video_id: &str) -> Result<VideoInfo> {
        match &self.api_key {
            Some(key) => self.from_data_api(video_id, key).await,
            None => self.from_oembed(video_id).await,
        }
    }
}
