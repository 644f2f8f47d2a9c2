use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::batch::BatchRunner;
use crate::config::Config;
use crate::dataset::Dataset;
use crate::errors::AppError;
use crate::extraction::{CandidateExtractor, LlmExtractor, PatternExtractor};
use crate::models::Engine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub patterns: Arc<PatternExtractor>,
    /// Present only when `GEMINI_API_KEY` is configured.
    pub llm: Option<Arc<LlmExtractor>>,
    pub runner: BatchRunner,
    pub dataset: Arc<RwLock<Dataset>>,
    /// Cancellation handle of the batch currently running, if any.
    pub current_batch: Arc<Mutex<Option<CancellationToken>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        patterns: PatternExtractor,
        llm: Option<LlmExtractor>,
        runner: BatchRunner,
    ) -> Self {
        Self {
            config,
            patterns: Arc::new(patterns),
            llm: llm.map(Arc::new),
            runner,
            dataset: Arc::new(RwLock::new(Dataset::new())),
            current_batch: Arc::new(Mutex::new(None)),
        }
    }

    /// The extractor for `engine`. Selecting the LLM engine without an API key
    /// is a client error.
    pub fn extractor(&self, engine: Engine) -> Result<Arc<dyn CandidateExtractor>, AppError> {
        match engine {
            Engine::Patterns => Ok(self.patterns.clone() as Arc<dyn CandidateExtractor>),
            Engine::Llm => self
                .llm
                .clone()
                .map(|llm| llm as Arc<dyn CandidateExtractor>)
                .ok_or_else(|| {
                    AppError::Validation(
                        "engine 'llm' is unavailable: GEMINI_API_KEY is not configured".to_string(),
                    )
                }),
        }
    }

    /// Registers a new running batch. Fails when one is already running.
    /// The registration is released when the returned guard drops.
    pub fn begin_batch(&self) -> Result<RunningBatch, AppError> {
        let mut current = self
            .current_batch
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("batch registry lock poisoned")))?;
        if current.is_some() {
            return Err(AppError::Conflict("a batch is already running".to_string()));
        }
        let token = CancellationToken::new();
        *current = Some(token.clone());
        Ok(RunningBatch {
            token,
            registry: self.current_batch.clone(),
        })
    }

    /// Cancels the running batch. Returns false when none is running.
    pub fn cancel_batch(&self) -> bool {
        match self.current_batch.lock() {
            Ok(current) => current.as_ref().map(|token| token.cancel()).is_some(),
            Err(_) => false,
        }
    }
}

/// Registration of the running batch; clears the registry on drop, including
/// when the request future is dropped mid-run.
pub struct RunningBatch {
    token: CancellationToken,
    registry: Arc<Mutex<Option<CancellationToken>>>,
}

impl RunningBatch {
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for RunningBatch {
    fn drop(&mut self) {
        if let Ok(mut current) = self.registry.lock() {
            *current = None;
        }
    }
}
