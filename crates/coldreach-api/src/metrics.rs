//! Prometheus counters for runs and operator decisions.
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use coldreach_core::WorkflowRun;

pub struct Metrics {
    registry: Registry,
    submitted: IntCounter,
    finished: IntCounterVec,
    decisions: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submitted = IntCounter::new(
            "coldreach_runs_submitted_total",
            "Runs accepted for execution",
        )?;
        let finished = IntCounterVec::new(
            Opts::new(
                "coldreach_runs_finished_total",
                "Runs that reached a terminal state",
            ),
            &["state"],
        )?;
        let decisions = IntCounterVec::new(
            Opts::new("coldreach_decisions_total", "Operator decisions applied"),
            &["approved"],
        )?;

        registry.register(Box::new(submitted.clone()))?;
        registry.register(Box::new(finished.clone()))?;
        registry.register(Box::new(decisions.clone()))?;

        Ok(Self {
            registry,
            submitted,
            finished,
            decisions,
        })
    }

    pub fn run_submitted(&self) {
        self.submitted.inc();
    }

    /// Counts `run` once it is terminal.
    pub fn run_settled(&self, run: &WorkflowRun) {
        if run.state().is_terminal() {
            let state = run.state().to_string();
            self.finished.with_label_values(&[state.as_str()]).inc();
        }
    }

    pub fn decision(&self, approved: bool) {
        self.decisions
            .with_label_values(&[if approved { "true" } else { "false" }])
            .inc();
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
