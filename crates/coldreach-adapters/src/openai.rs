use async_trait::async_trait;
use serde_json::{json, Value};

use coldreach_core::{Provider, TextGenerator, WorkflowError, WorkflowResult};

use crate::{SYSTEM_PROMPT, TEMPERATURE};

pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// OpenAI-compatible `/chat/completions` backend.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(endpoint: Option<&str>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint
                .unwrap_or(OPENAI_ENDPOINT)
                .trim_end_matches('/')
                .to_string(),
            api_key,
        }
    }
}

pub fn request_body(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "temperature": TEMPERATURE,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": prompt},
        ],
    })
}

pub fn response_text(body: &Value) -> Option<String> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(
        &self,
        _provider: Provider,
        model: &str,
        prompt: &str,
    ) -> WorkflowResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| WorkflowError::GenerationError("OPENAI_API_KEY is not set".to_string()))?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(api_key)
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
            .ok_or_else(|| WorkflowError::GenerationError("response had no message content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let body = request_body("gpt-4o-mini", "hello");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(body["temperature"], TEMPERATURE);
    }

    #[test]
    fn test_response_text() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "Hi"}}]});
        assert_eq!(response_text(&body).as_deref(), Some("Hi"));
        assert_eq!(response_text(&json!({"choices": []})), None);
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let generator = OpenAiGenerator::new(Some("http://localhost:11434/v1/"), None);
        assert_eq!(generator.endpoint, "http://localhost:11434/v1");
    }
}
