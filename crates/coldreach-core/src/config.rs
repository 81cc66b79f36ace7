//! Configuration: defaults, an optional TOML file, then environment.
//!
//! `COLDREACH_CONFIG` names the TOML file. A `.env` file in the working
//! directory is read first so API keys can live there.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::context::ContextBudget;
use crate::data_model::Provider;
use crate::error::{WorkflowError, WorkflowResult};
use crate::registry::DEFAULT_RETAINED_RUNS;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub scrape: ScrapeConfig,
    pub context: ContextBudget,
    pub providers: ProvidersConfig,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Finished runs kept in memory before the oldest are evicted
    pub retain_finished_runs: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8787".to_string(),
            retain_finished_runs: DEFAULT_RETAINED_RUNS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub results_per_query: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.tavily.com/search".to_string(),
            results_per_query: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub max_chars: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_chars: 6000,
            timeout_secs: 12,
            user_agent: "coldreach-researcher/1.0".to_string(),
        }
    }
}

/// Wire protocol spoken by a generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    OpenAi,
    Anthropic,
}

impl BackendKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "gpt-4o-mini",
            BackendKind::Anthropic => "claude-3-5-haiku-latest",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: BackendKind,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Overrides the vendor's public endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Blank means the backend kind's own default
    #[serde(default)]
    pub default_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub primary: ProviderConfig,
    pub secondary: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            primary: ProviderConfig {
                kind: BackendKind::OpenAi,
                api_key: None,
                endpoint: None,
                default_model: BackendKind::OpenAi.default_model().to_string(),
            },
            secondary: ProviderConfig {
                kind: BackendKind::Anthropic,
                api_key: None,
                endpoint: None,
                default_model: BackendKind::Anthropic.default_model().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// YAML templates file replacing the built-in prompts
    pub templates_path: Option<PathBuf>,
}

impl Settings {
    /// Load `.env`, the file named by `COLDREACH_CONFIG` (if any), and the
    /// environment overrides, then validate.
    pub fn load() -> WorkflowResult<Self> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("loaded environment from {}", path.display());
        }
        let mut settings = match std::env::var("COLDREACH_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> WorkflowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WorkflowError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        info!("loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> WorkflowResult<Self> {
        toml::from_str(content).map_err(|e| WorkflowError::Config(format!("invalid TOML: {}", e)))
    }

    /// Overlay environment variables through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("COLDREACH_ADDR") {
            self.server.addr = addr;
        }
        if let Some(key) = lookup("TAVILY_API_KEY") {
            self.search.api_key = Some(key);
        }
        if let Some(model) = lookup("COLDREACH_MODEL") {
            self.providers.primary.default_model = model;
        }
        for provider in [&mut self.providers.primary, &mut self.providers.secondary] {
            let var = match provider.kind {
                BackendKind::OpenAi => "OPENAI_API_KEY",
                BackendKind::Anthropic => "ANTHROPIC_API_KEY",
            };
            if let Some(key) = lookup(var) {
                provider.api_key = Some(key);
            }
        }
    }

    pub fn validate(&self) -> WorkflowResult<()> {
        if self.search.results_per_query == 0 {
            return Err(WorkflowError::Config(
                "search.results_per_query must be at least 1".to_string(),
            ));
        }
        if self.scrape.max_chars == 0 {
            return Err(WorkflowError::Config("scrape.max_chars must be at least 1".to_string()));
        }
        if self.context.total_chars == 0
            || self.context.search_entry_chars == 0
            || self.context.scrape_entry_chars == 0
        {
            return Err(WorkflowError::Config("context budgets must be non-zero".to_string()));
        }
        if self.context.search_entry_chars > self.context.total_chars {
            return Err(WorkflowError::Config(
                "context.search_entry_chars cannot exceed context.total_chars".to_string(),
            ));
        }
        Ok(())
    }

    pub fn provider(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Primary => &self.providers.primary,
            Provider::Secondary => &self.providers.secondary,
        }
    }

    /// Model used when a run does not name one.
    pub fn default_model(&self, provider: Provider) -> &str {
        let config = self.provider(provider);
        match config.default_model.trim() {
            "" => config.kind.default_model(),
            model => model,
        }
    }
}
