//! Binary entrypoint for the coldreach API server.
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use coldreach_api::{run, AppState};
use coldreach_core::Settings;
use coldreach_stages::{default_controller, MockOutbox};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::load().context("failed to load configuration")?;
    let caps = coldreach_adapters::capabilities(&settings, Arc::new(MockOutbox::new()))?;
    let controller = default_controller(&settings, caps)?;
    tracing::info!(pipeline = controller.pipeline_id(), "workflow ready");

    let addr = settings.server.addr.clone();
    let state = AppState::new(controller, settings).context("failed to register metrics")?;
    run(&addr, state)
        .await
        .with_context(|| format!("server on {} stopped", addr))
}
