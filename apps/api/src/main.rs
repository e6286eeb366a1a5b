mod config;
mod errors;
mod estimate;
mod markdown;
mod models;
mod pdf;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::markdown::MarkdownRenderer;
use crate::pdf::EstimatePdfGenerator;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Estimate API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the PDF backend
    let pdf = Arc::new(EstimatePdfGenerator::new(
        config.issuer.clone(),
        config.pdf_max_pages,
    ));
    info!(
        "PDF generator initialized (issuer: {}, page limit: {})",
        config.issuer.name, config.pdf_max_pages
    );

    let state = AppState {
        pdf,
        markdown: MarkdownRenderer::new(),
        config: config.clone(),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
