//! Adapter wiring without network access.

use async_trait::async_trait;
use std::sync::Arc;

use coldreach_adapters::{capabilities, html, HttpFetcher};
use coldreach_core::config::ScrapeConfig;
use coldreach_core::{
    Outbox, PageFetcher, Provider, Settings, WorkflowError, WorkflowResult,
};

struct NullOutbox;

#[async_trait]
impl Outbox for NullOutbox {
    async fn deliver(&self, _company: &str, _email: &str) -> WorkflowResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_capabilities_from_default_settings() {
    let caps = capabilities(&Settings::default(), Arc::new(NullOutbox)).unwrap();
    assert_eq!(caps.search.name(), "tavily");

    // No keys configured: every network capability reports its own error kind.
    assert!(matches!(
        caps.search.search("Acme latest news", 4).await,
        Err(WorkflowError::SearchUnavailable(_))
    ));
    assert!(matches!(
        caps.generator.generate(Provider::Primary, "gpt-4o-mini", "hi").await,
        Err(WorkflowError::GenerationError(_))
    ));
}

#[tokio::test]
async fn test_fetch_refused_connection_is_fetch_error() {
    let fetcher = HttpFetcher::new(&ScrapeConfig {
        timeout_secs: 2,
        ..ScrapeConfig::default()
    })
    .unwrap();
    let result = fetcher.fetch_text("http://127.0.0.1:9/", 6000).await;
    assert!(matches!(result, Err(WorkflowError::FetchError(_))));
}

#[test]
fn test_homepage_and_about_extraction() {
    let home = r#"<h1>Acme</h1><p>Widgets for everyone.</p><a href="about.html">About us</a>"#;
    assert_eq!(html::extract_text(home), "Acme Widgets for everyone.");
    assert_eq!(
        html::find_about_link(home, "https://acme.example/index.html").as_deref(),
        Some("https://acme.example/about.html")
    );
}
