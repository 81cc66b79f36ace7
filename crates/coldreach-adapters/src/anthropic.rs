use async_trait::async_trait;
use serde_json::{json, Value};

use coldreach_core::{Provider, TextGenerator, WorkflowError, WorkflowResult};

use crate::{SYSTEM_PROMPT, TEMPERATURE};

pub const ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Anthropic `/messages` backend.
pub struct AnthropicGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl AnthropicGenerator {
    pub fn new(endpoint: Option<&str>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint
                .unwrap_or(ANTHROPIC_ENDPOINT)
                .trim_end_matches('/')
                .to_string(),
            api_key,
        }
    }
}

pub fn request_body(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "max_tokens": MAX_TOKENS,
        "temperature": TEMPERATURE,
        "system": SYSTEM_PROMPT,
        "messages": [{"role": "user", "content": prompt}],
    })
}

/// Concatenated text blocks of the response.
pub fn response_text(body: &Value) -> Option<String> {
    let blocks = body.get("content").and_then(Value::as_array)?;
    let text: Vec<&str> = blocks
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text.concat())
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    async fn generate(
        &self,
        _provider: Provider,
        model: &str,
        prompt: &str,
    ) -> WorkflowResult<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            WorkflowError::GenerationError("ANTHROPIC_API_KEY is not set".to_string())
        })?;

        let response = self
            .client
            .post(format!("{}/messages", self.endpoint))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body(model, prompt))
            .send()
            .await
            .map_err(|e| WorkflowError::GenerationError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WorkflowError::GenerationError(format!(
                "model '{}' request failed with status {}",
                model,
                response.status()
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| WorkflowError::GenerationError(e.to_string()))?;
        response_text(&body)
            .ok_or_else(|| WorkflowError::GenerationError("response had no text content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let body = request_body("claude-3-5-haiku-latest", "hello");
        assert_eq!(body["system"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], MAX_TOKENS);
    }

    #[test]
    fn test_response_text_joins_blocks() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Subject: Hi"},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "\n\nBody"}
            ]
        });
        assert_eq!(response_text(&body).as_deref(), Some("Subject: Hi\n\nBody"));
        assert_eq!(response_text(&json!({"content": []})), None);
    }
}
