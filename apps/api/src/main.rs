mod batch;
mod config;
mod dataset;
mod enrichment;
mod errors;
mod extraction;
mod ingest;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::batch::{BatchRunner, BatchSettings};
use crate::config::Config;
use crate::enrichment::{GenderClassifier, GenderizeClient, NominatimGeocoder};
use crate::extraction::{LlmExtractor, PatternExtractor};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("cvsift_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Sift API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM engine (optional)
    let llm = match config.llm_settings() {
        Some(settings) => {
            let client = LlmClient::new(settings).context("Failed to build LLM client")?;
            info!("LLM engine enabled (model: {})", client.model());
            Some(LlmExtractor::new(Arc::new(client)))
        }
        None => {
            info!("GEMINI_API_KEY not set; only the patterns engine is available");
            None
        }
    };

    // Initialize geocoder
    let geocoder = NominatimGeocoder::new(
        config.geocoder_url.clone(),
        &config.geocoder_user_agent,
        config.geocode_timeout(),
    )
    .context("Failed to build geocoder client")?;
    info!("Geocoder: {}", config.geocoder_url);

    // Initialize gender inference (off by default)
    let gender: Option<Arc<dyn GenderClassifier>> = if config.enable_gender_inference {
        let client =
            GenderizeClient::new(config.genderize_url.clone(), config.genderize_timeout())
                .context("Failed to build gender inference client")?;
        info!("Gender inference enabled: {}", config.genderize_url);
        Some(Arc::new(client))
    } else {
        None
    };

    let runner = BatchRunner::new(
        BatchSettings {
            extract_workers: config.extract_workers,
            outbound_concurrency: config.outbound_concurrency,
            outbound_interval: config.outbound_interval(),
        },
        Arc::new(geocoder),
        gender,
    );
    info!(
        "Batch runner: {} extract workers, {} outbound slots every {:?}",
        config.extract_workers,
        config.outbound_concurrency,
        config.outbound_interval()
    );

    // Pattern engine vocabulary
    let patterns = PatternExtractor::new(config.extraction_config()?);

    // Build app state
    let state = AppState::new(config.clone(), patterns, llm, runner);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
