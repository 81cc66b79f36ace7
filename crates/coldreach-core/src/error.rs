//! Unified Error Model
use thiserror::Error;
use uuid::Uuid;

use crate::state::RunState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("INPUT/{0}")]
    InvalidInput(String),

    #[error("SEARCH/{0}")]
    SearchUnavailable(String),

    #[error("FETCH/{0}")]
    FetchError(String),

    #[error("GEN/{0}")]
    GenerationError(String),

    #[error("SEND/{0}")]
    DeliveryError(String),

    #[error("STATE/{event} is not allowed while {from}")]
    InvalidTransition { from: RunState, event: String },

    #[error("RUN/not found: {0}")]
    RunNotFound(Uuid),

    #[error("RUN/busy: {0}")]
    RunBusy(Uuid),

    #[error("CONFIG/{0}")]
    Config(String),
}

impl WorkflowError {
    /// Search and fetch failures degrade the research context; everything
    /// else ends the run (or is rejected before it starts).
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            WorkflowError::SearchUnavailable(_) | WorkflowError::FetchError(_)
        )
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
