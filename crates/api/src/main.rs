mod config;
mod error;
mod routes;

use anyhow::{Context, Result};
use extract::{Extractor, OpenAiClient};
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, LOG_JSON_VAR, parse_bool};
use crate::routes::{AppState, router};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_JSON_VAR)
        .ok()
        .and_then(|v| parse_bool(&v).ok())
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the environment may already be populated.
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    let extraction_config = config.profile.config();
    extraction_config
        .validate()
        .with_context(|| format!("Invalid '{}' extraction profile", config.profile))?;

    let client = OpenAiClient::new(config.model.clone());
    tracing::info!(
        profile = %config.profile,
        model = client.model_id(),
        base_url = %config.model.base_url,
        fence_output = config.fence_output,
        "Extraction service configured"
    );

    let extractor = Extractor::new(client).with_fence_output(config.fence_output);
    let app = router(AppState::new(extractor, extraction_config));

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
