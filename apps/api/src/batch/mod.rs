//! Batch orchestration: ingest → normalize → extract → geocode (→ gender) for
//! every uploaded document.
//!
//! Documents are independent. Pattern batches run up to `extract_workers`
//! documents at once; LLM batches are bounded by the LLM gate's concurrency.
//! Cancellation is observed before each document starts, never mid-document.

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::enrichment::gender::first_name;
use crate::enrichment::{GenderClassifier, GeoResolver, Geocoder, OutboundGate};
use crate::extraction::{normalize, CandidateExtractor, Extraction};
use crate::ingest;
use crate::models::{CandidateRecord, Engine, RawDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    /// Extraction produced a record.
    Ok,
    /// The engine's null record was substituted (empty text or service failure).
    Fallback,
    /// The document could not be read.
    Failed,
    /// Not started because the batch was cancelled.
    Skipped,
}

/// One processed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRow {
    pub document_id: Uuid,
    pub filename: String,
    pub format: String,
    pub status: RowStatus,
    pub warnings: Vec<String>,
    pub record: CandidateRecord,
    /// The default point was used for coordinates.
    pub geocode_fallback: bool,
}

impl BatchRow {
    fn new(document: &RawDocument, engine: Engine, status: RowStatus) -> Self {
        Self {
            document_id: Uuid::new_v4(),
            filename: document.filename.clone(),
            format: document.format.clone(),
            status,
            warnings: Vec::new(),
            record: CandidateRecord::blank(engine),
            geocode_fallback: false,
        }
    }

    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}: {}", self.filename, message);
        self.warnings.push(message);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub ok: usize,
    pub fallback: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchCounts {
    fn tally(rows: &[BatchRow]) -> Self {
        let mut counts = Self::default();
        for row in rows {
            match row.status {
                RowStatus::Ok => counts.ok += 1,
                RowStatus::Fallback => counts.fallback += 1,
                RowStatus::Failed => counts.failed += 1,
                RowStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub engine: Engine,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
    pub counts: BatchCounts,
    /// In input order.
    pub rows: Vec<BatchRow>,
}

/// Concurrency and pacing knobs, usually taken from `Config`.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub extract_workers: usize,
    pub outbound_concurrency: usize,
    pub outbound_interval: Duration,
}

/// Long-lived orchestrator. Outbound gates persist across batches so pacing
/// holds for back-to-back uploads; the geocoding cache lives for one run.
#[derive(Clone)]
pub struct BatchRunner {
    extract_workers: usize,
    llm_gate: Arc<OutboundGate>,
    geocoder: Arc<dyn Geocoder>,
    geocode_gate: Arc<OutboundGate>,
    gender: Option<Arc<dyn GenderClassifier>>,
    gender_gate: Arc<OutboundGate>,
}

/// Per-run collaborators shared by the document tasks.
struct RunContext {
    extractor: Arc<dyn CandidateExtractor>,
    resolver: GeoResolver,
    llm_gate: Arc<OutboundGate>,
    gender: Option<Arc<dyn GenderClassifier>>,
    gender_gate: Arc<OutboundGate>,
}

impl BatchRunner {
    pub fn new(
        settings: BatchSettings,
        geocoder: Arc<dyn Geocoder>,
        gender: Option<Arc<dyn GenderClassifier>>,
    ) -> Self {
        let gate = || {
            Arc::new(OutboundGate::new(
                settings.outbound_concurrency,
                settings.outbound_interval,
            ))
        };
        Self {
            extract_workers: settings.extract_workers.max(1),
            llm_gate: gate(),
            geocoder,
            geocode_gate: gate(),
            gender,
            gender_gate: gate(),
        }
    }

    fn context(&self, extractor: Arc<dyn CandidateExtractor>) -> RunContext {
        RunContext {
            extractor,
            resolver: GeoResolver::new(self.geocoder.clone(), self.geocode_gate.clone()),
            llm_gate: self.llm_gate.clone(),
            gender: self.gender.clone(),
            gender_gate: self.gender_gate.clone(),
        }
    }

    fn parallelism(&self, engine: Engine) -> usize {
        match engine {
            Engine::Patterns => self.extract_workers,
            Engine::Llm => self.llm_gate.concurrency(),
        }
    }

    /// Processes every document. Never fails: per-document problems become row
    /// statuses and warnings.
    pub async fn run(
        &self,
        documents: Vec<RawDocument>,
        extractor: Arc<dyn CandidateExtractor>,
        cancel: CancellationToken,
    ) -> BatchReport {
        let batch_id = Uuid::new_v4();
        let engine = extractor.engine();
        let started_at = Utc::now();
        info!(
            "batch {batch_id}: {} documents, engine={}",
            documents.len(),
            engine.as_str()
        );

        let ctx = Arc::new(self.context(extractor));
        let slots = Arc::new(Semaphore::new(self.parallelism(engine)));
        let mut join_set = JoinSet::new();

        for (index, document) in documents.iter().cloned().enumerate() {
            let ctx = ctx.clone();
            let slots = slots.clone();
            let cancel = cancel.clone();
            join_set.spawn(async move {
                let row = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => BatchRow::new(&document, engine, RowStatus::Skipped),
                    slot = slots.acquire_owned() => {
                        if cancel.is_cancelled() || slot.is_err() {
                            BatchRow::new(&document, engine, RowStatus::Skipped)
                        } else {
                            let row = process_document(&ctx, document).await;
                            drop(slot);
                            row
                        }
                    }
                };
                (index, row)
            });
        }

        let mut rows: Vec<Option<BatchRow>> = vec![None; documents.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, row)) => rows[index] = Some(row),
                Err(e) => error!("batch {batch_id}: document task aborted: {e}"),
            }
        }

        let rows: Vec<BatchRow> = rows
            .into_iter()
            .zip(&documents)
            .map(|(row, document)| {
                row.unwrap_or_else(|| {
                    let mut row = BatchRow::new(document, engine, RowStatus::Failed);
                    row.warn("document task aborted");
                    row
                })
            })
            .collect();

        let counts = BatchCounts::tally(&rows);
        info!(
            "batch {batch_id} finished: ok={} fallback={} failed={} skipped={}, {} distinct locations geocoded",
            counts.ok,
            counts.fallback,
            counts.failed,
            counts.skipped,
            ctx.resolver.cached_len()
        );

        BatchReport {
            batch_id,
            engine,
            started_at,
            finished_at: Utc::now(),
            cancelled: cancel.is_cancelled(),
            counts,
            rows,
        }
    }

    /// Extracts one already-decoded text through the same pipeline as a batch
    /// document (normalize, extract, geocode, gender).
    pub async fn extract_text(
        &self,
        text: &str,
        extractor: Arc<dyn CandidateExtractor>,
    ) -> Extraction {
        let ctx = self.context(extractor);
        let normalized = normalize(text);
        let mut extraction = extract_gated(&ctx, normalized).await;
        enrich(&ctx, &mut extraction.record).await;
        extraction
    }
}

async fn process_document(ctx: &RunContext, document: RawDocument) -> BatchRow {
    let engine = ctx.extractor.engine();
    let mut row = BatchRow::new(&document, engine, RowStatus::Ok);

    let decoded = tokio::task::spawn_blocking(move || {
        ingest::extract_text(&document).map(|raw| normalize(&raw))
    })
    .await;

    let text = match decoded {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            row.status = RowStatus::Failed;
            row.warn(e.to_string());
            return row;
        }
        Err(e) => {
            row.status = RowStatus::Failed;
            row.warn(format!("text extraction panicked: {e}"));
            return row;
        }
    };

    if text.is_empty() {
        row.status = RowStatus::Fallback;
        row.warn("document yielded no extractable text");
    } else {
        let extraction = extract_gated(ctx, text).await;
        row.record = extraction.record;
        if let Some(reason) = extraction.fallback {
            row.status = RowStatus::Fallback;
            row.warn(format!("extraction fell back to null record: {reason}"));
        } else if row.record.is_empty() {
            row.warn("no candidate fields recognized");
        }
    }

    row.geocode_fallback = enrich(ctx, &mut row.record).await;
    if row.geocode_fallback && row.record.location.is_some() {
        row.warn("location could not be geocoded; default coordinates used");
    }
    row
}

async fn extract_gated(ctx: &RunContext, text: String) -> Extraction {
    match ctx.extractor.engine() {
        Engine::Llm => {
            let _permit = ctx.llm_gate.acquire().await;
            ctx.extractor.extract(text).await
        }
        Engine::Patterns => ctx.extractor.extract(text).await,
    }
}

/// Attaches coordinates and, when enabled, gender. Returns whether the
/// geocoding fallback was used.
async fn enrich(ctx: &RunContext, record: &mut CandidateRecord) -> bool {
    let point = ctx.resolver.resolve(record.location.as_deref()).await;
    record.apply_geo(&point);

    if let Some(classifier) = &ctx.gender {
        if let Some(first) = record.name.as_deref().and_then(first_name) {
            let _permit = ctx.gender_gate.acquire().await;
            record.gender = Some(classifier.classify(first).await);
        }
    }
    point.fallback
}
