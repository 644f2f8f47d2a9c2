//! In-memory candidate dataset: every row produced by the batches of this
//! process, with filtering and location aggregation for the dashboard.

pub mod export;
pub mod handlers;

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::batch::{BatchRow, RowStatus};

pub use export::{export_csv, ExportColumns, ExportError};

/// Dashboard filter. Empty fields do not constrain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateFilter {
    /// Exact locations (case-insensitive); a row matches any of them.
    #[serde(default)]
    pub locations: Vec<String>,
    pub country: Option<String>,
    /// Case-insensitive containment within any skill.
    pub skill: Option<String>,
    /// Case-insensitive containment within the name.
    pub query: Option<String>,
}

impl CandidateFilter {
    pub fn matches(&self, row: &BatchRow) -> bool {
        let record = &row.record;

        if !self.locations.is_empty() {
            let Some(location) = record.location.as_deref() else {
                return false;
            };
            if !self
                .locations
                .iter()
                .any(|wanted| wanted.trim().eq_ignore_ascii_case(location.trim()))
            {
                return false;
            }
        }

        if let Some(country) = non_blank(&self.country) {
            if !record
                .country
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(country))
            {
                return false;
            }
        }

        if let Some(skill) = non_blank(&self.skill) {
            let needle = skill.to_lowercase();
            let has_skill = record
                .skills
                .iter()
                .flatten()
                .any(|s| s.to_lowercase().contains(&needle));
            if !has_skill {
                return false;
            }
        }

        if let Some(query) = non_blank(&self.query) {
            let needle = query.to_lowercase();
            if !record
                .name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&needle))
            {
                return false;
            }
        }

        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Candidates per resolved location (one map bubble / bar).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCount {
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Default)]
pub struct Dataset {
    rows: Vec<BatchRow>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps rows that carry a record (ok or fallback). Returns how many were kept.
    pub fn append(&mut self, rows: impl IntoIterator<Item = BatchRow>) -> usize {
        let before = self.rows.len();
        self.rows.extend(
            rows.into_iter()
                .filter(|row| matches!(row.status, RowStatus::Ok | RowStatus::Fallback)),
        );
        self.rows.len() - before
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn filter(&self, filter: &CandidateFilter) -> Vec<&BatchRow> {
        self.rows.iter().filter(|row| filter.matches(row)).collect()
    }

    /// Counts per (location, latitude, longitude), largest first. Rows without
    /// a location are left out.
    pub fn location_summary(&self, filter: &CandidateFilter) -> Vec<LocationCount> {
        let mut order: Vec<(String, Option<u64>, Option<u64>)> = Vec::new();
        let mut counts: HashMap<(String, Option<u64>, Option<u64>), LocationCount> =
            HashMap::new();

        for row in self.filter(filter) {
            let Some(location) = row.record.location.as_deref() else {
                continue;
            };
            let key = (
                location.to_string(),
                row.record.latitude.map(f64::to_bits),
                row.record.longitude.map(f64::to_bits),
            );
            counts
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key);
                    LocationCount {
                        location: location.to_string(),
                        latitude: row.record.latitude,
                        longitude: row.record.longitude,
                        count: 0,
                    }
                })
                .count += 1;
        }

        let mut summary: Vec<LocationCount> =
            order.into_iter().filter_map(|key| counts.remove(&key)).collect();
        // Stable: ties keep first-seen order.
        summary.sort_by(|a, b| b.count.cmp(&a.count));
        summary
    }

    pub fn top_locations(&self, filter: &CandidateFilter, n: usize) -> Vec<LocationCount> {
        let mut summary = self.location_summary(filter);
        summary.truncate(n);
        summary
    }

    /// Sorted distinct locations, for the filter picker.
    pub fn distinct_locations(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.record.location.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.rows.len();
        self.rows.clear();
        removed
    }
}
