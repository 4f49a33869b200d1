//! HTTP surface: routes, handlers and error responses.

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, instrument, warn};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::models::{AnalysisReport, AnalyzedComment, Percentages, Totals, VideoInfo, WordCount};
use crate::pipeline::Pipeline;
use crate::sentiment::SentimentLabel;
use crate::source::CommentSource;
use crate::video::{extract_video_id, fetch_video_info_safe, MetadataProvider};

pub struct AppState {
    pub pipeline: Pipeline,
    pub comments: Arc<dyn CommentSource>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub max_comments: usize,
    pub sample_limit: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    #[serde(default)]
    #[schema(example = "https://www.youtube.com/watch?v=dQw4w9WgXcQ")]
    pub video_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_info: Option<VideoInfo>,
}

/// A run-level failure plus whatever metadata was resolved before it happened.
#[derive(Debug)]
pub struct ApiError {
    pub error: AnalysisError,
    pub video_info: Option<VideoInfo>,
}

impl ApiError {
    pub fn new(error: AnalysisError, video_info: Option<VideoInfo>) -> Self {
        Self { error, video_info }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error {
            AnalysisError::EmptyInput => StatusCode::BAD_REQUEST,
            AnalysisError::SourceUnavailable { .. } => StatusCode::BAD_GATEWAY,
            AnalysisError::NoCommentsFound => StatusCode::NOT_FOUND,
        };
        let body = ErrorResponse {
            error: self.error.to_string(),
            video_info: self.video_info,
        };
        (status, Json(body)).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(root, analyze_video),
    components(
        schemas(
            AnalyzeRequest,
            StatusResponse,
            ErrorResponse,
            AnalysisReport,
            AnalyzedComment,
            Totals,
            Percentages,
            WordCount,
            VideoInfo,
            SentimentLabel
        )
    ),
    tags(
        (name = "analysis", description = "Video comment analysis API")
    )
)]
pub struct ApiDoc;

/// Liveness message
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up", body = StatusResponse)),
    tag = "analysis"
)]
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "YouTube Comment Checker API is running ✅".to_string(),
    })
}

/// Analyze the comments of a video
#[utoipa::path(
    post,
    path = "/analyze_video",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Aggregate comment report", body = AnalysisReport),
        (status = 400, description = "Empty video_url", body = ErrorResponse),
        (status = 404, description = "No usable comments", body = ErrorResponse),
        (status = 502, description = "Comments could not be fetched", body = ErrorResponse)
    ),
    tag = "analysis"
)]
#[instrument(skip_all, fields(run_id = %Uuid::new_v4(), video_id = tracing::field::Empty))]
pub async fn analyze_video(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let url = req.video_url.trim();
    if url.is_empty() {
        return Err(ApiError::new(AnalysisError::EmptyInput, None));
    }
    info!("🎬 [API] Analysis requested for {}", url);

    let video_info = fetch_video_info_safe(state.metadata.as_ref(), url).await;

    let Some(video_id) = extract_video_id(url) else {
        warn!("⚠️ [API] No video id in {:?}", url);
        return Err(ApiError::new(
            AnalysisError::SourceUnavailable {
                reason: "no video id in url".to_string(),
            },
            Some(video_info),
        ));
    };

    tracing::Span::current().record("video_id", video_id.as_str());

    let comments = match state.comments.open(&video_id).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("❌ [API] Comment source failed for {}: {}", video_id, e);
            return Err(ApiError::new(e.into(), Some(video_info)));
        }
    };

    match state
        .pipeline
        .analyze_comment_stream(comments, state.max_comments, state.sample_limit)
        .await
    {
        Ok(report) => {
            info!("✅ [API] Report ready for {}", video_id);
            Ok(Json(report.with_video_info(video_info)))
        }
        Err(e) => Err(ApiError::new(e, Some(video_info))),
    }
}

/// CORS policy: any origin when `origins` is `None`, otherwise the given list with credentials.
pub fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    match origins {
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        warn!("⚠️ Ignoring invalid CORS origin {:?}", o);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true)
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(root))
        .route("/analyze_video", post(analyze_video))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::models::RawComment;
    use crate::source::{CommentStream, StaticCommentSource};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct FixedMetadata;

    #[async_trait]
    impl MetadataProvider for FixedMetadata {
        async fn video_info(&self, video_id: &str) -> anyhow::Result<VideoInfo> {
            Ok(VideoInfo {
                title: format!("Video {}", video_id),
                channel: Some("Channel".to_string()),
                views: Some(1234),
                length_seconds: Some(60),
                thumbnail_url: None,
            })
        }
    }

    struct DownSource;

    #[async_trait]
    impl CommentSource for DownSource {
        async fn open(&self, _video_id: &str) -> Result<CommentStream, SourceError> {
            Err(SourceError::Unavailable("comments disabled".to_string()))
        }
    }

    fn app(comments: Arc<dyn CommentSource>) -> Router {
        router(Arc::new(AppState {
            pipeline: Pipeline::default(),
            comments,
            metadata: Arc::new(FixedMetadata),
            max_comments: 800,
            sample_limit: 20,
        }))
    }

    fn analyze_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze_video")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_root() {
        let resp = app(Arc::new(StaticCommentSource::default()))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["message"], "YouTube Comment Checker API is running ✅");
    }

    #[tokio::test]
    async fn test_analyze_video_report() {
        let source = StaticCommentSource::new(vec![
            RawComment::new("I love this video!").with_author("@fan"),
            RawComment::new("This is terrible"),
            RawComment::new("   "),
            RawComment::new("Posted at noon"),
        ]);
        let resp = app(Arc::new(source))
            .oneshot(analyze_request(serde_json::json!({
                "video_url": "  https://www.youtube.com/watch?v=dQw4w9WgXcQ  "
            })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["video_info"]["title"], "Video dQw4w9WgXcQ");
        assert_eq!(body["video_info"]["views"], 1234);
        assert_eq!(body["totals"]["total_comments"], 3);
        assert_eq!(body["totals"]["positive"], 1);
        assert_eq!(body["totals"]["negative"], 1);
        assert_eq!(body["totals"]["neutral"], 1);
        assert_eq!(body["totals"]["sarcastic"], 0);
        assert_eq!(body["percentages"]["positive_pct"], 33.3);
        assert_eq!(body["sample_comments"][0]["author"], "@fan");
        assert_eq!(body["sample_comments"][0]["sentiment"], "Positive");
        assert_eq!(body["sample_comments"][0]["cleaned"], "i love this video");
        assert!(body["sample_comments"][1]["author"].is_null());
        assert!(body["top_words"].as_array().unwrap().len() <= 20);
    }

    #[tokio::test]
    async fn test_empty_url() {
        let resp = app(Arc::new(StaticCommentSource::default()))
            .oneshot(analyze_request(serde_json::json!({ "video_url": "   " })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "Empty video_url");
        assert!(body.get("video_info").is_none());
    }

    #[tokio::test]
    async fn test_missing_url_field() {
        let resp = app(Arc::new(StaticCommentSource::default()))
            .oneshot(analyze_request(serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_source_unavailable() {
        let resp = app(Arc::new(DownSource))
            .oneshot(analyze_request(serde_json::json!({ "video_url": "https://youtu.be/dQw4w9WgXcQ" })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "Failed to fetch comments. Check the URL or try again later.");
        assert_eq!(body["video_info"]["title"], "Video dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn test_url_without_video_id() {
        let resp = app(Arc::new(StaticCommentSource::default()))
            .oneshot(analyze_request(serde_json::json!({ "video_url": "not a url" })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(resp).await;
        assert_eq!(body["video_info"]["title"], "Unknown title");
    }

    #[tokio::test]
    async fn test_no_comments_found() {
        let source = StaticCommentSource::new(vec![RawComment::new(" "), RawComment::default()]);
        let resp = app(Arc::new(source))
            .oneshot(analyze_request(serde_json::json!({ "video_url": "https://youtu.be/dQw4w9WgXcQ" })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "No comments found or video URL invalid.");
        assert_eq!(body["video_info"]["channel"], "Channel");
    }

    #[tokio::test]
    async fn test_cap_applies_to_requests() {
        let comments: Vec<RawComment> = (0..50).map(|i| RawComment::new(format!("comment {}", i))).collect();
        let state = Arc::new(AppState {
            pipeline: Pipeline::default(),
            comments: Arc::new(StaticCommentSource::new(comments)),
            metadata: Arc::new(FixedMetadata),
            max_comments: 10,
            sample_limit: 3,
        });
        let resp = router(state)
            .oneshot(analyze_request(serde_json::json!({ "video_url": "https://youtu.be/dQw4w9WgXcQ" })))
            .await
            .unwrap();

        let body = json_body(resp).await;
        assert_eq!(body["totals"]["total_comments"], 10);
        assert_eq!(body["sample_comments"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/analyze_video"));
        assert!(doc.paths.paths.contains_key("/"));
    }
}
