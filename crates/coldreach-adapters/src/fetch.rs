use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use coldreach_core::config::ScrapeConfig;
use coldreach_core::context::shorten;
use coldreach_core::{PageFetcher, WorkflowError, WorkflowResult};

use crate::html::{extract_text, find_about_link};

/// Fetches a homepage (plus its About page when linked) over HTTP.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &ScrapeConfig) -> WorkflowResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| WorkflowError::Config(format!("http client: {}", e)))?;
        Ok(Self { client })
    }

    async fn get_html(&self, url: &str) -> WorkflowResult<String> {
        debug!(url = %url, "fetching page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WorkflowError::FetchError(format!("{}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(WorkflowError::FetchError(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| WorkflowError::FetchError(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str, max_chars: usize) -> WorkflowResult<String> {
        let html = self.get_html(url).await?;
        let mut text = extract_text(&html);

        if let Some(about) = find_about_link(&html, url).filter(|about| about != url) {
            match self.get_html(&about).await {
                Ok(about_html) => {
                    let about_text = extract_text(&about_html);
                    if !about_text.is_empty() {
                        text = format!("{}\n\n{}", text, about_text).trim().to_string();
                    }
                }
                Err(e) => warn!(url = %about, error = %e, "about page fetch failed"),
            }
        }

        Ok(shorten(&text, max_chars))
    }
}
