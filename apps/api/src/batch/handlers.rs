//! Axum route handlers for the Batch API.

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::batch::BatchReport;
use crate::errors::AppError;
use crate::extraction::handlers::EngineQuery;
use crate::models::RawDocument;
use crate::state::AppState;

/// Multipart field carrying the uploaded resumes.
pub const FILES_FIELD: &str = "files";

const UNNAMED_UPLOAD: &str = "upload";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/batches?engine=patterns|llm
/// Runs one batch over every `files` part and appends its rows to the dataset.
pub async fn handle_run_batch(
    State(state): State<AppState>,
    Query(query): Query<EngineQuery>,
    mut multipart: Multipart,
) -> Result<Json<BatchReport>, AppError> {
    let extractor = state.extractor(query.engine)?;

    let mut documents = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNNAMED_UPLOAD.to_string());
        let bytes = field.bytes().await?;
        documents.push(RawDocument::from_upload(filename, bytes));
    }

    if documents.is_empty() {
        return Err(AppError::Validation(format!(
            "no documents uploaded in multipart field '{FILES_FIELD}'"
        )));
    }

    let running = state.begin_batch()?;
    let report = state.runner.run(documents, extractor, running.token()).await;
    drop(running);

    let stored = state.dataset.write().await.append(report.rows.iter().cloned());
    info!("batch {}: {stored} rows added to dataset", report.batch_id);

    Ok(Json(report))
}

/// POST /api/v1/batches/cancel
/// Documents already in flight finish; the rest are reported as skipped.
pub async fn handle_cancel_batch(State(state): State<AppState>) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: state.cancel_batch(),
    })
}
