use anyhow::Context;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use steelwheel_invoicing::config::Config;
use steelwheel_invoicing::routes::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    if config.email.resend_api_key.is_none() {
        tracing::warn!("RESEND_API_KEY not set, invoice emails run in demo mode");
    }
    if config.api_tokens.is_empty() {
        tracing::warn!("API_TOKENS not set, every invoice request will be rejected");
    }
    tracing::info!(storage = %config.storage_dir.display(), base = %config.public_base_url, "storage configured");

    let state = AppState::from_config(&config);
    let app = router(state, &config.cors_origin);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
