mod batch;
mod config;
mod document;
mod errors;
mod generation;
mod llm_client;
mod roster;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::batch::{BatchRunner, BatchSettings};
use crate::config::Config;
use crate::document::writer::MarkdownWriter;
use crate::generation::category::policy_from_name;
use crate::generation::rubric::Rubric;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unparseable env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Casebook v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        config.llm_model.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    if config.anthropic_api_key.is_none() {
        warn!("ANTHROPIC_API_KEY is not set; every generation call will fall back to sentinels");
    }
    info!("LLM client initialized (model: {})", llm.model());

    let categories = policy_from_name(&config.category_policy).ok_or_else(|| {
        anyhow!(
            "Unknown QUESTION_CATEGORY_POLICY {:?}",
            config.category_policy
        )
    })?;

    let settings = BatchSettings {
        delimiter: config.csv_delimiter,
        concurrency: config.batch_concurrency,
        questions_per_case: config.questions_per_case,
        ..BatchSettings::default()
    };
    info!(
        "Batch settings: concurrency={} questions_per_case={} category_policy={}",
        settings.concurrency, settings.questions_per_case, config.category_policy
    );

    let runner = BatchRunner::new(
        Arc::new(llm),
        Arc::from(categories),
        Arc::new(MarkdownWriter),
        Rubric::default(),
        settings,
    );

    // Build app state
    let state = AppState {
        runner: Arc::new(runner),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the upload page has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
