//! Network adapters for the coldreach capabilities.
//!
//! - [`TavilySearch`]: web search
//! - [`HttpFetcher`]: homepage and About page text
//! - [`OpenAiGenerator`] / [`AnthropicGenerator`] behind a [`ProviderRouter`]
//!
//! Missing API keys are reported when a call is made, not at construction.

pub mod anthropic;
pub mod fetch;
pub mod html;
pub mod openai;
pub mod router;
pub mod tavily;

pub use anthropic::AnthropicGenerator;
pub use fetch::HttpFetcher;
pub use openai::OpenAiGenerator;
pub use router::ProviderRouter;
pub use tavily::TavilySearch;

use std::sync::Arc;

use coldreach_core::{Capabilities, Outbox, Settings, WorkflowResult};

pub const SYSTEM_PROMPT: &str =
    "You are a sales researcher who writes accurate, upbeat summaries and tailored outreach emails.";

pub const TEMPERATURE: f64 = 0.35;

/// Search, fetch and generation adapters from `settings`, delivering to `outbox`.
pub fn capabilities(settings: &Settings, outbox: Arc<dyn Outbox>) -> WorkflowResult<Capabilities> {
    Ok(Capabilities::new(
        Arc::new(TavilySearch::new(&settings.search)),
        Arc::new(HttpFetcher::new(&settings.scrape)?),
        Arc::new(ProviderRouter::from_settings(settings)),
        outbox,
    ))
}
