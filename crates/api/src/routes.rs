use axum::{Json, Router, extract::State, routing::post};
use extract::{Extraction, ExtractionConfig, ExtractionProvider};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

/// Shared, read-only per-process state.
pub struct AppState<P> {
    pub provider: Arc<P>,
    pub config: Arc<ExtractionConfig>,
}

impl<P> AppState<P> {
    pub fn new(provider: P, config: ExtractionConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            config: Arc::new(config),
        }
    }
}

// Manual impl: `P` itself need not be Clone.
impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            config: Arc::clone(&self.config),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

pub fn router<P>(state: AppState<P>) -> Router
where
    P: ExtractionProvider + 'static,
{
    Router::new()
        .route("/extract", post(extract_entities::<P>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn extract_entities<P>(
    State(state): State<AppState<P>>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<Vec<Extraction>>, ApiError>
where
    P: ExtractionProvider + 'static,
{
    if req.text.trim().is_empty() {
        return Err(ApiError::InvalidRequest("text must not be empty".to_string()));
    }

    let started = Instant::now();
    tracing::info!(text_chars = req.text.chars().count(), "Extraction requested");

    let extractions = state
        .provider
        .extract(&req.text, &state.config)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %format!("{:#}", e),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Extraction failed"
            );
            ApiError::Extraction(e)
        })?;

    tracing::info!(
        extractions = extractions.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Extraction completed"
    );

    Ok(Json(extractions))
}
