use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use coldreach_core::config::{BackendKind, ProviderConfig};
use coldreach_core::{Provider, Settings, TextGenerator, WorkflowError, WorkflowResult};

use crate::anthropic::AnthropicGenerator;
use crate::openai::OpenAiGenerator;

/// Dispatches each call to the backend configured for the run's provider.
#[derive(Default)]
pub struct ProviderRouter {
    backends: HashMap<Provider, Arc<dyn TextGenerator>>,
}

impl ProviderRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut router = Self::new();
        for provider in [Provider::Primary, Provider::Secondary] {
            router = router.with_backend(provider, backend_for(settings.provider(provider)));
        }
        router
    }

    pub fn with_backend(mut self, provider: Provider, backend: Arc<dyn TextGenerator>) -> Self {
        self.backends.insert(provider, backend);
        self
    }
}

fn backend_for(config: &ProviderConfig) -> Arc<dyn TextGenerator> {
    let endpoint = config.endpoint.as_deref();
    let api_key = config.api_key.clone();
    match config.kind {
        BackendKind::OpenAi => Arc::new(OpenAiGenerator::new(endpoint, api_key)),
        BackendKind::Anthropic => Arc::new(AnthropicGenerator::new(endpoint, api_key)),
    }
}

#[async_trait]
impl TextGenerator for ProviderRouter {
    async fn generate(&self, provider: Provider, model: &str, prompt: &str) -> WorkflowResult<String> {
        let backend = self.backends.get(&provider).ok_or_else(|| {
            WorkflowError::GenerationError(format!("no backend configured for provider {}", provider))
        })?;
        debug!(provider = %provider, model = %model, prompt_chars = prompt.len(), "generate");
        backend.generate(provider, model, prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(&'static str);

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(&self, _p: Provider, model: &str, _prompt: &str) -> WorkflowResult<String> {
            Ok(format!("{}:{}", self.0, model))
        }
    }

    #[tokio::test]
    async fn test_routes_by_provider() {
        let router = ProviderRouter::new()
            .with_backend(Provider::Primary, Arc::new(Echo("a")))
            .with_backend(Provider::Secondary, Arc::new(Echo("b")));
        assert_eq!(router.generate(Provider::Primary, "m1", "p").await.unwrap(), "a:m1");
        assert_eq!(router.generate(Provider::Secondary, "m2", "p").await.unwrap(), "b:m2");
    }

    #[tokio::test]
    async fn test_unconfigured_provider() {
        let router = ProviderRouter::new().with_backend(Provider::Primary, Arc::new(Echo("a")));
        assert!(matches!(
            router.generate(Provider::Secondary, "m", "p").await,
            Err(WorkflowError::GenerationError(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_at_call_time() {
        let router = ProviderRouter::from_settings(&Settings::default());
        let err = router
            .generate(Provider::Secondary, "claude-3-5-haiku-latest", "p")
            .await
            .unwrap_err();
        assert_eq!(err, WorkflowError::GenerationError("ANTHROPIC_API_KEY is not set".into()));
    }
}
