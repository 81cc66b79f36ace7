use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use coldreach_core::config::SearchConfig;
use coldreach_core::{SearchHit, SearchProvider, WorkflowError, WorkflowResult};

/// Tavily web search.
pub struct TavilySearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl TavilySearch {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

/// Map `results[].{title, content, url}`; entries without a URL are dropped.
pub fn parse_results(body: &Value) -> Vec<SearchHit> {
    body.get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|item| {
                    let url = item.get("url").and_then(Value::as_str)?.trim();
                    if url.is_empty() {
                        return None;
                    }
                    let text = |key: &str| {
                        item.get(key)
                            .and_then(Value::as_str)
                            .unwrap_or("")
                            .trim()
                            .to_string()
                    };
                    let snippet = match text("content") {
                        s if s.is_empty() => text("snippet"),
                        s => s,
                    };
                    Some(SearchHit {
                        title: text("title"),
                        snippet,
                        url: url.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl SearchProvider for TavilySearch {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> WorkflowResult<Vec<SearchHit>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| WorkflowError::SearchUnavailable("TAVILY_API_KEY is not set".to_string()))?;

        debug!(query = %query, max_results, "tavily search");
        let payload = json!({
            "api_key": api_key,
            "query": query,
            "max_results": max_results,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| WorkflowError::SearchUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WorkflowError::SearchUnavailable(format!(
                "search request failed with status {}",
                response.status()
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| WorkflowError::SearchUnavailable(e.to_string()))?;

        let mut hits = parse_results(&body);
        hits.truncate(max_results);
        Ok(hits)
    }
}
