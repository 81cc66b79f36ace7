//! coldreach API /v1: submit, inspect, decide, abandon
pub mod handlers;
pub mod metrics;
pub mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use coldreach_core::{RunRegistry, Settings, WorkflowController};

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<WorkflowController>,
    pub registry: Arc<RunRegistry>,
    pub metrics: Arc<Metrics>,
    /// Supplies per-provider default models for submissions that name none
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(controller: WorkflowController, settings: Settings) -> Result<Self, prometheus::Error> {
        Ok(Self {
            controller: Arc::new(controller),
            registry: Arc::new(RunRegistry::with_retention(settings.server.retain_finished_runs)),
            metrics: Arc::new(Metrics::new()?),
            settings: Arc::new(settings),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/runs", post(handlers::submit_run))
        .route(
            "/v1/runs/{id}",
            get(handlers::get_run).delete(handlers::abandon_run),
        )
        .route("/v1/runs/{id}/decision", post(handlers::decide_run))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: &str, state: AppState) -> std::io::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("coldreach API listening on {}", addr);
    axum::serve(listener, app).await
}
