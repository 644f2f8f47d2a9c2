//! Axum route handlers for single-text extraction.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::warn;

use crate::errors::AppError;
use crate::models::{CandidateRecord, Engine};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct EngineQuery {
    #[serde(default)]
    pub engine: Engine,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/extract?engine=patterns|llm
/// Normalizes the pasted text, extracts one candidate and enriches it.
pub async fn handle_extract(
    State(state): State<AppState>,
    Query(query): Query<EngineQuery>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<CandidateRecord>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }

    let extractor = state.extractor(query.engine)?;
    let extraction = state.runner.extract_text(&request.text, extractor).await;
    if let Some(reason) = &extraction.fallback {
        warn!("single extraction fell back to null record: {reason}");
    }

    Ok(Json(extraction.record))
}
