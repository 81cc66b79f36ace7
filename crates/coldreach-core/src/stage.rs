//! Stage Trait: single contract for the automated workflow stages
use async_trait::async_trait;

use crate::capability::Capabilities;
use crate::data_model::WorkflowRun;
use crate::error::WorkflowError;
use crate::gate::Approval;
use crate::state::RunState;

/// A research stage driven by the controller before the approval gate.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Unique stage id (e.g. "search.dual.v1")
    fn id(&self) -> &'static str;

    /// State the run is in while this stage executes
    fn state(&self) -> RunState;

    /// Executes the stage. Returning an error fails the run, so stages that
    /// tolerate capability failures must absorb them here.
    async fn run(&self, run: &mut WorkflowRun, caps: &Capabilities) -> Result<(), StageError>;
}

/// The delivery stage. Only callable with an [`Approval`] minted by the gate.
#[async_trait]
pub trait SendStage: Send + Sync {
    fn id(&self) -> &'static str;

    async fn send(
        &self,
        run: &mut WorkflowRun,
        approval: &Approval,
        caps: &Capabilities,
    ) -> Result<(), StageError>;
}

#[derive(Debug, Clone)]
pub enum StageError {
    ValidationFailed(String),
    ExecutionFailed(String),
    Capability(WorkflowError),
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "STAGE/VALIDATION: {}", msg),
            Self::ExecutionFailed(msg) => write!(f, "STAGE/EXEC: {}", msg),
            Self::Capability(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for StageError {}

impl From<WorkflowError> for StageError {
    fn from(err: WorkflowError) -> Self {
        StageError::Capability(err)
    }
}
