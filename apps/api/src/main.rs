mod config;
mod errors;
mod llm_client;
mod photos;
mod planner;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::photos::UnsplashClient;
use crate::routes::build_router;
use crate::session::store::SessionStore;
use crate::state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Wayfinder API v{}", env!("CARGO_PKG_VERSION"));

    // Missing credentials are reported per request, not at startup.
    if config.google_api_key.is_none() {
        warn!("GOOGLE_API_KEY is not set; recommendation and itinerary requests will fail");
    }
    if config.unsplash_access_key.is_none() {
        warn!("UNSPLASH_ACCESS_KEY is not set; image requests will fail");
    }

    let llm = LlmClient::new(config.google_api_key.clone(), &config.gemini_api_url)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let photos = UnsplashClient::new(
        config.unsplash_access_key.clone(),
        &config.unsplash_api_url,
    )?;
    info!("Photo client initialized");

    let sessions = SessionStore::new(chrono::Duration::minutes(config.session_idle_ttl_minutes));
    sessions.spawn_sweeper(SESSION_SWEEP_INTERVAL);
    info!(
        "Session store initialized (idle ttl: {} min)",
        config.session_idle_ttl_minutes
    );

    let state = AppState {
        llm: Arc::new(llm),
        photos: Arc::new(photos),
        sessions,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
