//! Draft stage: summarize the research, then compose the email.
//!
//! Unlike search and scrape, a generation failure here fails the run.
use async_trait::async_trait;

use coldreach_core::context::fingerprint;
use coldreach_core::{
    Capabilities, ContextBudget, RunState, Stage, StageError, WorkflowError, WorkflowResult,
    WorkflowRun,
};

use crate::prompts::PromptTemplates;

pub struct DraftStage {
    prompts: PromptTemplates,
    budget: ContextBudget,
}

impl DraftStage {
    pub fn new(prompts: PromptTemplates, budget: ContextBudget) -> Self {
        Self { prompts, budget }
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn non_empty(step: &str, text: String) -> WorkflowResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(WorkflowError::GenerationError(format!(
            "{} returned an empty response",
            step
        )));
    }
    Ok(text.to_string())
}

#[async_trait]
impl Stage for DraftStage {
    fn id(&self) -> &'static str {
        "draft.two_pass.v1"
    }

    fn state(&self) -> RunState {
        RunState::Drafting
    }

    async fn run(&self, run: &mut WorkflowRun, caps: &Capabilities) -> Result<(), StageError> {
        let context = run.context().render_for_prompt(&self.budget);
        run.set_context_digest(fingerprint(&context));

        let provider = run.input().provider;
        let model = run.input().model.clone();
        let company = run.company().to_string();
        run.log(format!(
            "[draft] Calling model '{}' via {} ({} characters of research)",
            model,
            provider,
            context.chars().count()
        ));

        let prompt = self.prompts.summarize(&company, &context)?;
        let summary = caps.generator.generate(provider, &model, &prompt).await?;
        let summary = non_empty("summarize", summary)?;
        run.log(format!("Summarized research ({} words)", word_count(&summary)));

        let prompt = self.prompts.compose(&company, &summary)?;
        let email = caps.generator.generate(provider, &model, &prompt).await?;
        let email = non_empty("compose", email)?;
        let words = word_count(&email);

        run.commit_draft(summary, email);
        run.log(format!("Drafted email ({} words)", words));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("Subject: Hi\n\nHello  Acme team,"), 5);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn test_empty_generation_rejected() {
        assert!(matches!(
            non_empty("compose", " \n ".to_string()),
            Err(WorkflowError::GenerationError(_))
        ));
        assert_eq!(non_empty("compose", " ok ".to_string()).unwrap(), "ok");
    }
}
