//! External capabilities consumed by the workflow.
//!
//! Each trait is a narrow contract over a network service. Concrete adapters
//! live outside the core; tests substitute in-memory fakes.
use async_trait::async_trait;
use std::sync::Arc;

use crate::data_model::{Provider, SearchHit};
use crate::error::WorkflowResult;

/// Web search. Fails with `SearchUnavailable`.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, max_results: usize) -> WorkflowResult<Vec<SearchHit>>;
}

/// Page fetch and text extraction. Fails with `FetchError`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str, max_chars: usize) -> WorkflowResult<String>;
}

/// Text generation. Fails with `GenerationError`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, provider: Provider, model: &str, prompt: &str)
        -> WorkflowResult<String>;
}

/// Delivery of an approved email. Fails with `DeliveryError`.
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn deliver(&self, company: &str, email: &str) -> WorkflowResult<()>;
}

/// The capability set handed to every stage.
#[derive(Clone)]
pub struct Capabilities {
    pub search: Arc<dyn SearchProvider>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub generator: Arc<dyn TextGenerator>,
    pub outbox: Arc<dyn Outbox>,
}

impl Capabilities {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        generator: Arc<dyn TextGenerator>,
        outbox: Arc<dyn Outbox>,
    ) -> Self {
        Self {
            search,
            fetcher,
            generator,
            outbox,
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("search", &self.search.name())
            .finish_non_exhaustive()
    }
}
