use std::sync::Arc;

use meetscribe_api::{build_router, state::AppState};
use meetscribe_config::Settings;
use meetscribe_services::{ClaudeNameExtractor, RedisTranscriptStore};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "meetscribe_api=debug,meetscribe_session=debug,meetscribe_services=debug,tower_http=debug"
                .into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config
    let settings = Settings::load()?;
    info!(
        "Starting Meetscribe API on {}:{}",
        settings.app.host, settings.app.port
    );

    let extractor = Arc::new(ClaudeNameExtractor::new(&settings.claude));
    if !extractor.is_available() {
        warn!("No extraction API key configured — unresolved speakers will stay unknown");
    }

    let store = Arc::new(RedisTranscriptStore::connect(&settings.redis.url).await?);

    // Build app state
    let app_state = AppState::new(settings.clone(), extractor, store);

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
