use comment_checker::{
    api::{self, AppState},
    config::AppConfig,
    pipeline::Pipeline,
    source::YouTubeCommentSource,
    video::YouTubeMetadata,
    LexiconScorer,
};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()?;

    let state = Arc::new(AppState {
        pipeline: Pipeline::new(Arc::new(LexiconScorer::new()), config.sarcasm.clone()),
        comments: Arc::new(YouTubeCommentSource::new(client.clone(), config.youtube_api_key.clone())),
        metadata: Arc::new(YouTubeMetadata::new(client, config.youtube_api_key.clone())),
        max_comments: config.max_comments,
        sample_limit: config.sample_limit,
    });

    let app = api::router(state).layer(api::cors_layer(config.cors_allow_origins.as_deref()));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("🚀 Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
