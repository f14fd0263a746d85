mod analysis;
mod config;
mod errors;
mod llm_client;
mod routes;
mod state;
mod terms;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{ChatClient, GROQ_API_URL, PERPLEXITY_API_URL};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Termcloud API v{}", env!("CARGO_PKG_VERSION"));

    // One chat client per provider; both speak the OpenAI-compatible envelope
    let groq = Arc::new(ChatClient::new(GROQ_API_URL, config.groq_api_key.clone()));
    let perplexity = Arc::new(ChatClient::new(
        PERPLEXITY_API_URL,
        config.perplexity_api_key.clone(),
    ));
    info!("chat clients initialized (groq + perplexity)");

    let state = AppState { groq, perplexity };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // browser frontend origin is not fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
