//! coldreach stages: the concrete steps of the outreach workflow.
//!
//! # Pipeline Flow
//!
//! ```text
//! Search → Scrape → Draft → [approval gate] → Send
//!   ↓        ↓        ↓                        ↓
//! search:* scrape:*  summary + email_draft    Outbox
//! ```
//!
//! Search and scrape absorb capability failures as trace lines. Draft does
//! not. Send is only reachable with an approval token.

mod draft;
pub mod prompts;
mod scrape;
mod search;
mod send;

pub use draft::{word_count, DraftStage};
pub use prompts::PromptTemplates;
pub use scrape::ScrapeStage;
pub use search::{format_hits, news_query, overview_query, SearchStage};
pub use send::{Delivery, MockOutbox, OutboxSendStage};

use coldreach_core::{Capabilities, Settings, Stage, WorkflowController, WorkflowResult};

/// Search, scrape, and draft stages configured from `settings`.
pub fn default_stages(settings: &Settings) -> WorkflowResult<Vec<Box<dyn Stage>>> {
    let prompts = PromptTemplates::from_settings(settings.prompts.templates_path.as_deref())?;
    Ok(vec![
        Box::new(SearchStage::new(settings.search.results_per_query)),
        Box::new(ScrapeStage::new(settings.scrape.max_chars)),
        Box::new(DraftStage::new(prompts, settings.context)),
    ])
}

/// Controller over the default stages and the outbox send stage.
pub fn default_controller(
    settings: &Settings,
    caps: Capabilities,
) -> WorkflowResult<WorkflowController> {
    Ok(WorkflowController::new(
        default_stages(settings)?,
        Box::new(OutboxSendStage),
        caps,
    ))
}
