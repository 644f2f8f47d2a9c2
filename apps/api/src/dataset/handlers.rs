//! Axum route handlers for the dashboard: filtered rows, CSV export and the
//! location summary.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::batch::BatchRow;
use crate::dataset::{export_csv, CandidateFilter, ExportColumns, LocationCount};
use crate::errors::AppError;
use crate::state::AppState;

const TOP_LOCATIONS: usize = 10;
const EXPORT_FILENAME: &str = "candidates.csv";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Raw query pairs. `location` may repeat, which a struct extractor cannot
/// express, so the filter is assembled by hand.
type QueryPairs = Vec<(String, String)>;

#[derive(Debug, Serialize)]
pub struct CandidateListResponse {
    pub total: usize,
    pub matched: usize,
    pub rows: Vec<BatchRow>,
}

#[derive(Debug, Serialize)]
pub struct LocationsResponse {
    pub locations: Vec<LocationCount>,
    pub top: Vec<LocationCount>,
    /// Every distinct location in the dataset, for the filter picker.
    pub distinct: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

fn filter_from_pairs(pairs: &[(String, String)]) -> CandidateFilter {
    let mut filter = CandidateFilter::default();
    for (key, value) in pairs {
        match key.as_str() {
            "location" => {
                if !value.trim().is_empty() {
                    filter.locations.push(value.clone());
                }
            }
            "country" => filter.country = Some(value.clone()),
            "skill" => filter.skill = Some(value.clone()),
            "q" => filter.query = Some(value.clone()),
            _ => {}
        }
    }
    filter
}

fn columns_from_pairs(pairs: &[(String, String)]) -> Result<ExportColumns, AppError> {
    match pairs.iter().rev().find(|(key, _)| key == "columns") {
        None => Ok(ExportColumns::default()),
        Some((_, value)) => match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(ExportColumns::Basic),
            "full" => Ok(ExportColumns::Full),
            other => Err(AppError::Validation(format!(
                "unknown column set '{other}': expected 'basic' or 'full'"
            ))),
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/candidates?location=..&location=..&country=..&skill=..&q=..
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Json<CandidateListResponse> {
    let filter = filter_from_pairs(&pairs);
    let dataset = state.dataset.read().await;
    let rows: Vec<BatchRow> = dataset.filter(&filter).into_iter().cloned().collect();

    Json(CandidateListResponse {
        total: dataset.len(),
        matched: rows.len(),
        rows,
    })
}

/// GET /api/v1/candidates/export.csv?columns=basic|full
/// Same filter parameters as the listing.
pub async fn handle_export_csv(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Response, AppError> {
    let columns = columns_from_pairs(&pairs)?;
    let filter = filter_from_pairs(&pairs);

    let csv = {
        let dataset = state.dataset.read().await;
        export_csv(dataset.filter(&filter), columns)?
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

/// GET /api/v1/locations
/// Per-location counts with coordinates, filter applied.
pub async fn handle_locations(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Json<LocationsResponse> {
    let filter = filter_from_pairs(&pairs);
    let dataset = state.dataset.read().await;

    Json(LocationsResponse {
        locations: dataset.location_summary(&filter),
        top: dataset.top_locations(&filter, TOP_LOCATIONS),
        distinct: dataset.distinct_locations(),
    })
}

/// DELETE /api/v1/candidates
pub async fn handle_clear_candidates(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.dataset.write().await.clear();
    Json(ClearResponse { removed })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> QueryPairs {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_filter_collects_repeated_locations() {
        let filter = filter_from_pairs(&pairs(&[
            ("location", "Pune"),
            ("location", "Berlin"),
            ("location", " "),
            ("skill", "rust"),
            ("q", "ann"),
        ]));
        assert_eq!(filter.locations, vec!["Pune", "Berlin"]);
        assert_eq!(filter.skill.as_deref(), Some("rust"));
        assert_eq!(filter.query.as_deref(), Some("ann"));
        assert!(filter.country.is_none());
    }

    #[test]
    fn test_columns_parameter() {
        assert_eq!(columns_from_pairs(&[]).unwrap(), ExportColumns::Basic);
        assert_eq!(
            columns_from_pairs(&pairs(&[("columns", "FULL")])).unwrap(),
            ExportColumns::Full
        );
        assert!(matches!(
            columns_from_pairs(&pairs(&[("columns", "all")])),
            Err(AppError::Validation(_))
        ));
    }
}
