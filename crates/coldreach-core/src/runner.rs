//! Workflow Controller: drives a run through its stages and the approval gate
use std::time::Instant;

use crate::capability::Capabilities;
use crate::data_model::{ApprovalDecision, RunInput, WorkflowRun};
use crate::error::{WorkflowError, WorkflowResult};
use crate::gate::{Approval, ApprovalGate};
use crate::stage::{SendStage, Stage};
use crate::state::{RunEvent, RunState};

/// Receives a snapshot after every step so progress can be streamed.
pub trait RunObserver: Send + Sync {
    fn on_update(&self, run: &WorkflowRun);
}

/// Observer that ignores every update.
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn on_update(&self, _run: &WorkflowRun) {}
}

pub struct WorkflowController {
    stages: Vec<Box<dyn Stage>>,
    sender: Box<dyn SendStage>,
    caps: Capabilities,
    gate: ApprovalGate,
    pipeline_id: String,
}

impl WorkflowController {
    pub fn new(stages: Vec<Box<dyn Stage>>, sender: Box<dyn SendStage>, caps: Capabilities) -> Self {
        let pipeline_id = stages
            .iter()
            .map(|s| s.id())
            .chain(std::iter::once(sender.id()))
            .map(|id| id.split('.').next().unwrap_or("?"))
            .collect::<Vec<_>>()
            .join("→");

        Self {
            stages,
            sender,
            caps,
            gate: ApprovalGate::new(),
            pipeline_id,
        }
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Validate the input and create an idle run. Nothing is logged for
    /// rejected input.
    pub fn prepare(&self, input: RunInput) -> WorkflowResult<WorkflowRun> {
        let input = input.validate()?;
        Ok(WorkflowRun::new(input))
    }

    /// Run the research stages and stop at the approval gate.
    pub async fn submit(&self, input: RunInput) -> WorkflowResult<WorkflowRun> {
        self.submit_observed(input, &NoopObserver).await
    }

    pub async fn submit_observed(
        &self,
        input: RunInput,
        observer: &dyn RunObserver,
    ) -> WorkflowResult<WorkflowRun> {
        let mut run = self.prepare(input)?;
        self.drive(&mut run, observer).await;
        Ok(run)
    }

    /// Advance an idle run until it suspends at `AwaitingApproval` or fails.
    pub async fn drive(&self, run: &mut WorkflowRun, observer: &dyn RunObserver) {
        if let Err(e) = run.apply(RunEvent::Start) {
            tracing::warn!(run_id = %run.id(), error = %e, "run is not idle; nothing to drive");
            return;
        }
        observer.on_update(run);

        for stage in &self.stages {
            if run.state() != stage.state() {
                run.fail(WorkflowError::InvalidTransition {
                    from: run.state(),
                    event: stage.id().to_string(),
                });
                observer.on_update(run);
                return;
            }

            let start = Instant::now();
            let result = stage.run(run, &self.caps).await;
            run.record_stage(stage.id(), start.elapsed().as_millis() as u64);

            if let Err(e) = result {
                run.fail(e);
                observer.on_update(run);
                return;
            }

            let Some(done) = run.state().completion_event() else {
                run.fail(format!("stage {} left the run in {}", stage.id(), run.state()));
                observer.on_update(run);
                return;
            };
            if let Err(e) = run.apply(done) {
                run.fail(e);
                observer.on_update(run);
                return;
            }
            observer.on_update(run);
        }

        if run.state() != RunState::AwaitingApproval {
            run.fail(format!("pipeline {} ended in {}", self.pipeline_id, run.state()));
            observer.on_update(run);
        }
    }

    /// Apply an operator decision and, when approved, send.
    ///
    /// Approving a run that was already sent is a no-op.
    pub async fn decide(
        &self,
        run: &mut WorkflowRun,
        decision: ApprovalDecision,
        observer: &dyn RunObserver,
    ) -> WorkflowResult<()> {
        if decision.approved && run.state() == RunState::Sent {
            return Ok(());
        }
        let approval = self.gate.resolve(run, decision)?;
        observer.on_update(run);
        match approval {
            Some(approval) => self.send(run, &approval, observer).await,
            None => Ok(()),
        }
    }

    /// Deliver an approved run. Calling this again once `Sent` changes nothing.
    pub async fn send(
        &self,
        run: &mut WorkflowRun,
        approval: &Approval,
        observer: &dyn RunObserver,
    ) -> WorkflowResult<()> {
        if !approval.covers(run) {
            return Err(WorkflowError::InvalidTransition {
                from: run.state(),
                event: "send".to_string(),
            });
        }
        if run.state() == RunState::Sent {
            return Ok(());
        }
        if run.state() != RunState::Sending {
            return Err(WorkflowError::InvalidTransition {
                from: run.state(),
                event: "send".to_string(),
            });
        }

        let start = Instant::now();
        let result = self.sender.send(run, approval, &self.caps).await;
        run.record_stage(self.sender.id(), start.elapsed().as_millis() as u64);
        match result {
            Ok(()) => {
                run.apply(RunEvent::Delivered)?;
            }
            Err(e) => run.fail(e),
        }
        observer.on_update(run);
        Ok(())
    }
}
