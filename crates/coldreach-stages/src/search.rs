//! Search stage: the "recent news" and "what they do" queries.
use async_trait::async_trait;
use tracing::warn;

use coldreach_core::context::{shorten, NO_RESULTS, SEARCH_ABOUT, SEARCH_NEWS};
use coldreach_core::{Capabilities, RunState, SearchHit, Stage, StageError, WorkflowRun};

const SNIPPET_CHARS: usize = 220;

pub struct SearchStage {
    results_per_query: usize,
}

impl SearchStage {
    pub fn new(results_per_query: usize) -> Self {
        Self { results_per_query }
    }
}

impl Default for SearchStage {
    fn default() -> Self {
        Self::new(4)
    }
}

pub fn news_query(company: &str) -> String {
    format!("{} latest news", company)
}

/// Narrowed to the company's own site when a homepage was given.
pub fn overview_query(company: &str, url: Option<&str>) -> String {
    let host = url
        .and_then(|u| url::Url::parse(u).ok())
        .and_then(|u| u.host_str().map(str::to_string));
    match host {
        Some(host) => format!("{} what they do overview site:{}", company, host),
        None => format!("{} what they do overview", company),
    }
}

pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }
    hits.iter()
        .map(|hit| {
            let title = match hit.title.trim() {
                "" => "Untitled result",
                t => t,
            };
            format!("- {}: {} ({})", title, shorten(&hit.snippet, SNIPPET_CHARS), hit.url)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Stage for SearchStage {
    fn id(&self) -> &'static str {
        "search.dual.v1"
    }

    fn state(&self) -> RunState {
        RunState::Searching
    }

    async fn run(&self, run: &mut WorkflowRun, caps: &Capabilities) -> Result<(), StageError> {
        let news = news_query(run.company());
        let overview = overview_query(run.company(), run.input().url.as_deref());
        run.log(format!("[search] Querying {}: '{}' and '{}'", caps.search.name(), news, overview));

        let (news_hits, overview_hits) = tokio::join!(
            caps.search.search(&news, self.results_per_query),
            caps.search.search(&overview, self.results_per_query),
        );

        // News first, whichever finished first.
        let mut first_url = None;
        for (label, query, result) in [
            (SEARCH_NEWS, &news, news_hits),
            (SEARCH_ABOUT, &overview, overview_hits),
        ] {
            match result {
                Ok(hits) => {
                    if first_url.is_none() {
                        first_url = hits
                            .iter()
                            .map(|h| h.url.trim())
                            .find(|u| !u.is_empty())
                            .map(str::to_string);
                    }
                    run.log(format!("[search] '{}' returned {} result(s)", query, hits.len()));
                    run.context_mut().append(label, format_hits(&hits));
                }
                Err(e) => {
                    warn!(run_id = %run.id(), query = %query, error = %e, "search query failed");
                    run.log(format!("[search] '{}' failed: {}", query, e));
                }
            }
        }

        if let Some(url) = first_url {
            if run.discover_url(url) {
                run.log("[search] No URL supplied; using the first search result");
            }
        }
        match run.resolved_url().map(str::to_string) {
            Some(url) => run.log(format!("[search] Will scrape {}", url)),
            None => run.log("[search] No URL to scrape; scraping will be skipped"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, snippet: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            snippet: snippet.to_string(),
            url: "https://acme.example/news".to_string(),
        }
    }

    #[test]
    fn test_queries() {
        assert_eq!(news_query("Acme Corp"), "Acme Corp latest news");
        assert_eq!(
            overview_query("Acme Corp", None),
            "Acme Corp what they do overview"
        );
        assert_eq!(
            overview_query("Acme Corp", Some("https://www.acme.example/home")),
            "Acme Corp what they do overview site:www.acme.example"
        );
    }

    #[test]
    fn test_format_hits() {
        let rendered = format_hits(&[hit("Acme raises", "Series B"), hit("  ", "no title")]);
        assert_eq!(
            rendered,
            "- Acme raises: Series B (https://acme.example/news)\n\
             - Untitled result: no title (https://acme.example/news)"
        );
    }

    #[test]
    fn test_format_hits_empty_marker() {
        assert_eq!(format_hits(&[]), NO_RESULTS);
    }

    #[test]
    fn test_long_snippet_shortened() {
        let rendered = format_hits(&[hit("t", &"x".repeat(500))]);
        assert!(rendered.contains(" ..."));
        assert!(rendered.len() < 300);
    }
}
