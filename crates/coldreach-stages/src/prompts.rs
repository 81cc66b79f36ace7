//! Prompt templates for the draft stage.
//!
//! Templates live in a YAML file of named Handlebars templates. The built-in
//! file is compiled into the crate; `prompts.templates_path` swaps it out.
use handlebars::Handlebars;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;

use coldreach_core::{WorkflowError, WorkflowResult};

pub const SUMMARIZE: &str = "summarize";
pub const COMPOSE: &str = "compose";

const BUILTIN: &str = include_str!("../prompts/outreach.yaml");

#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesFile {
    pub version: String,
    pub templates: HashMap<String, Template>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub description: String,
    pub template: String,
}

impl TemplatesFile {
    pub fn from_yaml(yaml: &str) -> WorkflowResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| WorkflowError::Config(format!("invalid prompt templates: {}", e)))
    }
}

/// Compiled summarize/compose templates.
pub struct PromptTemplates {
    handlebars: Handlebars<'static>,
}

impl PromptTemplates {
    pub fn builtin() -> WorkflowResult<Self> {
        Self::from_yaml(BUILTIN)
    }

    pub fn load(path: &Path) -> WorkflowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WorkflowError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Built-in templates unless `path` is set.
    pub fn from_settings(path: Option<&Path>) -> WorkflowResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn from_yaml(yaml: &str) -> WorkflowResult<Self> {
        let file = TemplatesFile::from_yaml(yaml)?;

        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        // Prompts are plain text, not HTML.
        handlebars.register_escape_fn(handlebars::no_escape);

        for required in [SUMMARIZE, COMPOSE] {
            if !file.templates.contains_key(required) {
                return Err(WorkflowError::Config(format!(
                    "prompt templates are missing '{}'",
                    required
                )));
            }
        }
        for (name, template) in &file.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| WorkflowError::Config(format!("template '{}': {}", name, e)))?;
        }

        Ok(Self { handlebars })
    }

    pub fn summarize(&self, company: &str, context: &str) -> WorkflowResult<String> {
        self.render(SUMMARIZE, &json!({ "company": company, "context": context }))
    }

    pub fn compose(&self, company: &str, summary: &str) -> WorkflowResult<String> {
        self.render(COMPOSE, &json!({ "company": company, "summary": summary }))
    }

    fn render(&self, name: &str, data: &serde_json::Value) -> WorkflowResult<String> {
        self.handlebars
            .render(name, data)
            .map_err(|e| WorkflowError::GenerationError(format!("prompt '{}': {}", name, e)))
    }
}
