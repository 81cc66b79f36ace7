use async_trait::async_trait;
use tracing::warn;

use coldreach_core::context::SCRAPE_HOMEPAGE;
use coldreach_core::{Capabilities, RunState, Stage, StageError, WorkflowRun};

/// Fetches the resolved homepage. Never fails the run.
pub struct ScrapeStage {
    max_chars: usize,
}

impl ScrapeStage {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Default for ScrapeStage {
    fn default() -> Self {
        Self::new(6000)
    }
}

#[async_trait]
impl Stage for ScrapeStage {
    fn id(&self) -> &'static str {
        "scrape.homepage.v1"
    }

    fn state(&self) -> RunState {
        RunState::Scraping
    }

    async fn run(&self, run: &mut WorkflowRun, caps: &Capabilities) -> Result<(), StageError> {
        let Some(url) = run.resolved_url().map(str::to_string) else {
            run.log("[scrape] Skipped: no URL available");
            return Ok(());
        };

        match caps.fetcher.fetch_text(&url, self.max_chars).await {
            Ok(text) if text.trim().is_empty() => {
                run.log(format!("[scrape] {} had no readable text", url));
            }
            Ok(text) => {
                run.log(format!(
                    "[scrape] Extracted {} characters from {}",
                    text.chars().count(),
                    url
                ));
                run.context_mut().append(SCRAPE_HOMEPAGE, text);
            }
            Err(e) => {
                warn!(run_id = %run.id(), url = %url, error = %e, "scrape failed");
                run.log(format!("[scrape] Failed to fetch {}: {}", url, e));
            }
        }
        Ok(())
    }
}
