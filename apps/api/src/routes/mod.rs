pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::batch::handlers as batch;
use crate::dataset::handlers as dataset;
use crate::extraction::handlers as extraction;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/health", get(health::health_handler))
        // Extraction
        .route("/api/v1/extract", post(extraction::handle_extract))
        .route(
            "/api/v1/batches",
            post(batch::handle_run_batch).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/batches/cancel", post(batch::handle_cancel_batch))
        // Dashboard
        .route(
            "/api/v1/candidates",
            get(dataset::handle_list_candidates).delete(dataset::handle_clear_candidates),
        )
        .route(
            "/api/v1/candidates/export.csv",
            get(dataset::handle_export_csv),
        )
        .route("/api/v1/locations", get(dataset::handle_locations))
        .with_state(state)
}
