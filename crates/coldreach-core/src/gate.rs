//! Approval Gate: the human checkpoint between drafting and sending.
//!
//! The gate never decides on its own. A run sits in `AwaitingApproval` until
//! an [`ApprovalDecision`] is applied; there is no timeout and no default.
//! Approving yields an [`Approval`], and the send stage refuses to run
//! without one.

use uuid::Uuid;

use crate::data_model::{ApprovalDecision, WorkflowRun};
use crate::error::{WorkflowError, WorkflowResult};
use crate::state::{RunEvent, RunState};

/// Proof that an operator approved a specific run.
///
/// Only [`ApprovalGate::resolve`] can create one.
#[derive(Debug, PartialEq, Eq)]
pub struct Approval {
    run_id: Uuid,
}

impl Approval {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn covers(&self, run: &WorkflowRun) -> bool {
        self.run_id == run.id()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ApprovalGate;

impl ApprovalGate {
    pub fn new() -> Self {
        Self
    }

    /// Apply the operator's decision to a suspended run.
    ///
    /// Returns `Some(Approval)` when the run may proceed to sending and
    /// `None` when it was rejected.
    pub fn resolve(
        &self,
        run: &mut WorkflowRun,
        decision: ApprovalDecision,
    ) -> WorkflowResult<Option<Approval>> {
        let event = if decision.approved {
            RunEvent::Approve
        } else {
            RunEvent::Reject
        };
        if run.state() != RunState::AwaitingApproval {
            return Err(WorkflowError::InvalidTransition {
                from: run.state(),
                event: event.name().to_string(),
            });
        }

        if !decision.approved {
            run.apply(event)?;
            return Ok(None);
        }

        if let Some(edited) = decision.edited_email_draft {
            if edited.trim().is_empty() {
                run.log("[approval] Edited draft was blank; keeping the drafted email.");
            } else {
                run.replace_email_draft(edited);
                run.log("[approval] Operator replaced the email draft.");
            }
        }
        run.apply(event)?;
        Ok(Some(Approval { run_id: run.id() }))
    }
}
