//! API Handlers
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use tokio::task::JoinError;
use uuid::Uuid;

use coldreach_core::{ApprovalDecision, RunInput, WorkflowError, WorkflowRun, COLDREACH_VERSION};

use crate::AppState;

/// Maps the workflow error taxonomy onto HTTP statuses.
#[derive(Debug)]
pub enum ApiError {
    Workflow(WorkflowError),
    /// The task driving the run panicked or was shut down.
    Task(String),
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        ApiError::Workflow(err)
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        ApiError::Task(err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Workflow(err) => write!(f, "{}", err),
            ApiError::Task(msg) => write!(f, "TASK/{}", msg),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Workflow(WorkflowError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Workflow(WorkflowError::RunNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Workflow(
                WorkflowError::InvalidTransition { .. } | WorkflowError::RunBusy(_),
            ) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitParams {
    #[serde(default)]
    pub detach: bool,
}

pub async fn submit_run(
    State(state): State<AppState>,
    Query(params): Query<SubmitParams>,
    Json(input): Json<RunInput>,
) -> Result<Response, ApiError> {
    let input = input.with_default_model(&state.settings);
    let run = state.registry.admit(&state.controller, input)?;
    state.metrics.run_submitted();

    // The run executes on its own task so a client hanging up cannot
    // cancel it half-way through a stage.
    let id = run.id();
    let bg = state.clone();
    let task = tokio::spawn(async move {
        let run = bg.registry.execute(&bg.controller, run).await;
        bg.metrics.run_settled(&run);
        run
    });

    if params.detach {
        let location = format!("/v1/runs/{}", id);
        return Ok((
            StatusCode::ACCEPTED,
            [(header::LOCATION, location)],
            Json(json!({ "id": id })),
        )
            .into_response());
    }

    let run = task.await?;
    Ok((StatusCode::OK, Json(run)).into_response())
}

pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowRun>, ApiError> {
    state
        .registry
        .get(id)
        .map(Json)
        .ok_or(ApiError::Workflow(WorkflowError::RunNotFound(id)))
}

/// Decisions that change nothing (re-approving a sent run) are not counted.
pub async fn decide_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(decision): Json<ApprovalDecision>,
) -> Result<Json<WorkflowRun>, ApiError> {
    let bg = state.clone();
    let task = tokio::spawn(async move {
        let before = bg.registry.get(id).map(|run| run.state());
        let approved = decision.approved;
        let run = bg.registry.decide(&bg.controller, id, decision).await?;
        if before != Some(run.state()) {
            bg.metrics.decision(approved);
            bg.metrics.run_settled(&run);
        }
        Ok::<_, WorkflowError>(run)
    });
    Ok(Json(task.await??))
}

pub async fn abandon_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let run = state.registry.abandon(id)?;
    tracing::info!(run_id = %id, state = %run.state(), "run abandoned");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": COLDREACH_VERSION })),
    )
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
