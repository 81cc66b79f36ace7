//! Data Model: RunInput, WorkflowRun, ApprovalDecision
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::{BackendKind, Settings};
use crate::context::ResearchContext;
use crate::error::{WorkflowError, WorkflowResult};
use crate::state::{transition, RunEvent, RunState};

/// Which configured generation backend a run drafts with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    #[serde(alias = "openai")]
    Primary,
    #[serde(alias = "anthropic")]
    Secondary,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Primary => f.write_str("primary"),
            Provider::Secondary => f.write_str("secondary"),
        }
    }
}

impl Provider {
    /// Model for the backend this provider talks to out of the box.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Primary => BackendKind::OpenAi.default_model(),
            Provider::Secondary => BackendKind::Anthropic.default_model(),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" | "openai" => Ok(Provider::Primary),
            "secondary" | "anthropic" => Ok(Provider::Secondary),
            other => Err(WorkflowError::InvalidInput(format!("unknown provider '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInput {
    /// Target company name (or domain)
    pub company: String,
    /// Homepage to prioritise for scraping
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub provider: Provider,
    /// Model id, passed through to the provider untouched. Blank picks the
    /// provider's default.
    #[serde(default)]
    pub model: String,
}

impl RunInput {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            url: None,
            provider: Provider::default(),
            model: String::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Fill a blank model from the configured default of the chosen provider.
    pub fn with_default_model(mut self, settings: &Settings) -> Self {
        if self.model.trim().is_empty() {
            self.model = settings.default_model(self.provider).to_string();
        }
        self
    }

    /// Trim fields, drop a blank URL, and reject anything a stage could not
    /// work with.
    pub fn validate(self) -> WorkflowResult<Self> {
        let company = self.company.trim().to_string();
        if company.is_empty() {
            return Err(WorkflowError::InvalidInput(
                "company name must not be empty".to_string(),
            ));
        }

        let url = match self.url.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = url::Url::parse(raw).map_err(|e| {
                    WorkflowError::InvalidInput(format!("malformed url '{}': {}", raw, e))
                })?;
                if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                    return Err(WorkflowError::InvalidInput(format!(
                        "url must be an absolute http(s) address: '{}'",
                        raw
                    )));
                }
                Some(raw.to_string())
            }
        };

        let model = match self.model.trim() {
            "" => self.provider.default_model().to_string(),
            m => m.to_string(),
        };

        Ok(Self {
            company,
            url,
            provider: self.provider,
            model,
        })
    }
}

/// A single search hit as returned by the search capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    Pending,
    Approved,
    Rejected,
    Failed,
}

/// The operator's verdict on a drafted email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub approved: bool,
    /// Replaces the drafted email verbatim when approving
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_email_draft: Option<String>,
}

impl ApprovalDecision {
    pub fn approve() -> Self {
        Self {
            approved: true,
            edited_email_draft: None,
        }
    }

    pub fn approve_with_edit(draft: impl Into<String>) -> Self {
        Self {
            approved: true,
            edited_email_draft: Some(draft.into()),
        }
    }

    pub fn reject() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub latency_ms: u64,
}

/// One execution of the outreach workflow.
///
/// Fields are read through accessors; the trace log only grows and the
/// state only changes through [`transition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    id: Uuid,
    input: RunInput,
    state: RunState,
    context: ResearchContext,
    resolved_url: Option<String>,
    summary: Option<String>,
    email_draft: Option<String>,
    trace_log: Vec<String>,
    outcome: Outcome,
    failure: Option<String>,
    context_digest: Option<String>,
    stage_reports: Vec<StageReport>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WorkflowRun {
    /// Fresh run in `Idle`. The input is expected to be validated.
    pub fn new(input: RunInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            resolved_url: input.url.clone(),
            input,
            state: RunState::Idle,
            context: ResearchContext::new(),
            summary: None,
            email_draft: None,
            trace_log: Vec::new(),
            outcome: Outcome::Pending,
            failure: None,
            context_digest: None,
            stage_reports: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn input(&self) -> &RunInput {
        &self.input
    }

    pub fn company(&self) -> &str {
        &self.input.company
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn context(&self) -> &ResearchContext {
        &self.context
    }

    pub fn resolved_url(&self) -> Option<&str> {
        self.resolved_url.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn email_draft(&self) -> Option<&str> {
        self.email_draft.as_deref()
    }

    pub fn trace_log(&self) -> &[String] {
        &self.trace_log
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn context_digest(&self) -> Option<&str> {
        self.context_digest.as_deref()
    }

    pub fn stage_reports(&self) -> &[StageReport] {
        &self.stage_reports
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Append a line to the trace log.
    pub fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!(run_id = %self.id, state = %self.state, "{}", line);
        self.trace_log.push(line);
        self.touch();
    }

    pub fn context_mut(&mut self) -> &mut ResearchContext {
        self.touch();
        &mut self.context
    }

    /// Only fills in a URL when none was supplied or discovered earlier.
    pub fn discover_url(&mut self, url: impl Into<String>) -> bool {
        if self.resolved_url.is_some() {
            return false;
        }
        self.resolved_url = Some(url.into());
        self.touch();
        true
    }

    pub fn set_context_digest(&mut self, digest: impl Into<String>) {
        self.context_digest = Some(digest.into());
        self.touch();
    }

    /// Store both draft artifacts at once so `summary` never exists without
    /// a completed draft.
    pub fn commit_draft(&mut self, summary: impl Into<String>, email: impl Into<String>) {
        self.summary = Some(summary.into());
        self.email_draft = Some(email.into());
        self.touch();
    }

    pub(crate) fn replace_email_draft(&mut self, email: String) {
        self.email_draft = Some(email);
        self.touch();
    }

    pub(crate) fn record_stage(&mut self, stage: &str, latency_ms: u64) {
        self.stage_reports.push(StageReport {
            stage: stage.to_string(),
            latency_ms,
        });
        self.touch();
    }

    /// Advance the state machine and write the entry banner.
    pub(crate) fn apply(&mut self, event: RunEvent) -> WorkflowResult<RunState> {
        let next = transition(self.state, &event)?;
        match &event {
            RunEvent::Approve => self.outcome = Outcome::Approved,
            RunEvent::Reject => self.outcome = Outcome::Rejected,
            RunEvent::Fail(cause) => {
                self.outcome = Outcome::Failed;
                self.failure = Some(cause.clone());
            }
            _ => {}
        }
        self.state = next;
        match &event {
            RunEvent::Fail(cause) => self.log(format!("{} {}", next.banner(), cause)),
            _ => self.log(next.banner()),
        }
        Ok(next)
    }

    /// Move to `Failed` keeping every artifact gathered so far.
    pub(crate) fn fail(&mut self, cause: impl fmt::Display) {
        let cause = cause.to_string();
        tracing::warn!(run_id = %self.id, state = %self.state, cause = %cause, "run failed");
        if let Err(e) = self.apply(RunEvent::Fail(cause)) {
            tracing::error!(run_id = %self.id, error = %e, "could not mark run as failed");
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_company() {
        let err = RunInput::new("   ").validate().unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_rejects_relative_url() {
        for bad in ["acme.example", "/about", "ftp://acme.example", "https://"] {
            let err = RunInput::new("Acme").with_url(bad).validate().unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidInput(_)), "accepted {bad}");
        }
    }

    #[test]
    fn test_validate_normalizes() {
        let input = RunInput::new("  Acme Corp ")
            .with_url("  ")
            .with_model("")
            .validate()
            .unwrap();
        assert_eq!(input.company, "Acme Corp");
        assert_eq!(input.url, None);
        assert_eq!(input.model, "gpt-4o-mini");
    }

    #[test]
    fn test_provider_aliases() {
        let p: Provider = serde_json::from_str("\"anthropic\"").unwrap();
        assert_eq!(p, Provider::Secondary);
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::Primary);
        assert_eq!(serde_json::to_string(&Provider::Secondary).unwrap(), "\"secondary\"");
    }

    #[test]
    fn test_input_defaults_from_json() {
        let input: RunInput = serde_json::from_str(r#"{"company":"Acme"}"#).unwrap();
        assert_eq!(input.provider, Provider::Primary);
        assert_eq!(input.model, "");
        assert_eq!(input.url, None);
    }

    #[test]
    fn test_blank_model_follows_provider() {
        let input = RunInput::new("Acme")
            .with_provider(Provider::Secondary)
            .validate()
            .unwrap();
        assert_eq!(input.model, "claude-3-5-haiku-latest");

        let mut settings = Settings::default();
        settings.providers.secondary.default_model = "claude-sonnet-4-5".into();
        let input = RunInput::new("Acme")
            .with_provider(Provider::Secondary)
            .with_default_model(&settings);
        assert_eq!(input.model, "claude-sonnet-4-5");

        let input = RunInput::new("Acme")
            .with_model("gpt-4.1")
            .with_default_model(&settings);
        assert_eq!(input.model, "gpt-4.1");
    }

    #[test]
    fn test_new_run_is_idle_and_pending() {
        let run = WorkflowRun::new(RunInput::new("Acme").with_url("https://acme.example"));
        assert_eq!(run.state(), RunState::Idle);
        assert_eq!(run.outcome(), Outcome::Pending);
        assert_eq!(run.resolved_url(), Some("https://acme.example"));
        assert!(run.trace_log().is_empty());
    }

    #[test]
    fn test_discover_url_does_not_override() {
        let mut run = WorkflowRun::new(RunInput::new("Acme").with_url("https://acme.example"));
        assert!(!run.discover_url("https://other.example"));
        assert_eq!(run.resolved_url(), Some("https://acme.example"));
    }

    #[test]
    fn test_fail_records_cause_and_keeps_log() {
        let mut run = WorkflowRun::new(RunInput::new("Acme"));
        run.apply(RunEvent::Start).unwrap();
        run.log("[search] nothing");
        run.fail(WorkflowError::GenerationError("quota".into()));
        assert_eq!(run.state(), RunState::Failed);
        assert_eq!(run.outcome(), Outcome::Failed);
        assert_eq!(run.failure(), Some("GEN/quota"));
        assert_eq!(run.trace_log().len(), 3);
    }

    #[test]
    fn test_run_json_roundtrip_keeps_state() {
        let mut run = WorkflowRun::new(RunInput::new("Acme"));
        run.apply(RunEvent::Start).unwrap();
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["state"], "searching");
        assert_eq!(json["outcome"], "pending");
        let back: WorkflowRun = serde_json::from_value(json).unwrap();
        assert_eq!(back, run);
    }
}
