//! Candidate extraction: normalization, section segmentation and the two
//! extraction engines behind one trait.

pub mod config;
pub mod handlers;
pub mod llm;
pub mod normalize;
pub mod patterns;
pub mod prompts;
pub mod section;

use async_trait::async_trait;
use tracing::warn;

use crate::models::{CandidateRecord, Engine};

pub use config::{ExtractionConfig, ListOverride};
pub use llm::LlmExtractor;
pub use normalize::normalize;
pub use patterns::PatternExtractor;
pub use section::Section;

/// Result of one extraction. `fallback` carries the reason when the engine
/// could not produce a real record and returned its null record instead.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: CandidateRecord,
    pub fallback: Option<String>,
}

/// An extraction engine. Implementations never fail; service errors surface as
/// [`Extraction::fallback`].
///
/// Carried in `AppState` and the batch runner as `Arc<dyn CandidateExtractor>`.
#[async_trait]
pub trait CandidateExtractor: Send + Sync {
    fn engine(&self) -> Engine;

    /// Extracts from already-normalized text.
    async fn extract(&self, text: String) -> Extraction;
}

#[async_trait]
impl CandidateExtractor for PatternExtractor {
    fn engine(&self) -> Engine {
        Engine::Patterns
    }

    async fn extract(&self, text: String) -> Extraction {
        // CPU-bound regex work stays off the async executor.
        let extractor = self.clone();
        match tokio::task::spawn_blocking(move || extractor.extract(&text)).await {
            Ok(record) => Extraction {
                record,
                fallback: None,
            },
            Err(e) => {
                warn!("pattern extraction task failed: {e}");
                Extraction {
                    record: CandidateRecord::blank(Engine::Patterns),
                    fallback: Some(format!("extraction task failed: {e}")),
                }
            }
        }
    }
}

#[async_trait]
impl CandidateExtractor for LlmExtractor {
    fn engine(&self) -> Engine {
        Engine::Llm
    }

    async fn extract(&self, text: String) -> Extraction {
        match self.try_extract(&text).await {
            Ok(record) => Extraction {
                record,
                fallback: None,
            },
            Err(e) => {
                warn!("LLM extraction failed, using null record: {e}");
                Extraction {
                    record: CandidateRecord::blank(Engine::Llm),
                    fallback: Some(e.to_string()),
                }
            }
        }
    }
}
