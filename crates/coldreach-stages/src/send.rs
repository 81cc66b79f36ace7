//! Send stage and the in-memory outbox.
use async_trait::async_trait;
use parking_lot::Mutex;

use coldreach_core::{
    Approval, Capabilities, Outbox, SendStage, StageError, WorkflowError, WorkflowResult,
    WorkflowRun,
};

/// Hands the approved draft to the configured outbox.
#[derive(Default)]
pub struct OutboxSendStage;

#[async_trait]
impl SendStage for OutboxSendStage {
    fn id(&self) -> &'static str {
        "send.outbox.v1"
    }

    async fn send(
        &self,
        run: &mut WorkflowRun,
        approval: &Approval,
        caps: &Capabilities,
    ) -> Result<(), StageError> {
        if !approval.covers(run) {
            return Err(StageError::ValidationFailed(format!(
                "approval for {} does not cover run {}",
                approval.run_id(),
                run.id()
            )));
        }
        let email = run
            .email_draft()
            .map(str::to_string)
            .ok_or_else(|| WorkflowError::DeliveryError("no email draft to send".to_string()))?;

        caps.outbox.deliver(run.company(), &email).await?;
        run.log("Mock sending email... done");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub company: String,
    pub email: String,
}

/// Outbox that records deliveries instead of sending anything.
#[derive(Default)]
pub struct MockOutbox {
    delivered: Mutex<Vec<Delivery>>,
}

impl MockOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.delivered.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.delivered.lock().len()
    }
}

#[async_trait]
impl Outbox for MockOutbox {
    async fn deliver(&self, company: &str, email: &str) -> WorkflowResult<()> {
        tracing::info!(
            company = %company,
            words = email.split_whitespace().count(),
            "mock delivery"
        );
        self.delivered.lock().push(Delivery {
            company: company.to_string(),
            email: email.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_outbox_records() {
        let outbox = MockOutbox::new();
        outbox.deliver("Acme Corp", "Subject: Hi").await.unwrap();
        assert_eq!(outbox.count(), 1);
        assert_eq!(
            outbox.deliveries()[0],
            Delivery {
                company: "Acme Corp".to_string(),
                email: "Subject: Hi".to_string(),
            }
        );
    }
}
