//! coldreach: run the outreach workflow in the terminal.
mod approval;
mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use coldreach_core::{
    ApprovalDecision, RunInput, RunObserver, RunState, Settings, WorkflowRun,
};
use coldreach_stages::{default_controller, MockOutbox};

use crate::cli::Cli;

/// Prints trace lines as they are appended.
#[derive(Default)]
struct TracePrinter {
    printed: Mutex<usize>,
}

impl RunObserver for TracePrinter {
    fn on_update(&self, run: &WorkflowRun) {
        let mut printed = self.printed.lock();
        let mut stdout = io::stdout().lock();
        for line in run.trace_log().iter().skip(*printed) {
            let _ = writeln!(stdout, "{}", line);
        }
        *printed = run.trace_log().len();
    }
}

fn print_report(run: &WorkflowRun) {
    println!("\n===== RUN REPORT =====");
    println!("Company: {}", run.company());
    if let Some(url) = run.resolved_url() {
        println!("Website: {}", url);
    }
    println!("\nSummary:\n{}", run.summary().unwrap_or("(none)"));
    println!("\nEmail draft:\n{}", run.email_draft().unwrap_or("(none)"));
    println!("\nFinal state: {}", run.state());
    if let Some(cause) = run.failure() {
        println!("Failure: {}", cause);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Cli::parse();
    let settings = Settings::load().context("failed to load configuration")?;

    let mut input = RunInput::new(args.company.clone()).with_provider(args.provider);
    if let Some(model) = &args.model {
        input = input.with_model(model.clone());
    }
    if let Some(url) = &args.url {
        input = input.with_url(url.clone());
    }
    let input = input.with_default_model(&settings);

    let outbox = Arc::new(MockOutbox::new());
    let caps = coldreach_adapters::capabilities(&settings, outbox)?;
    let controller = default_controller(&settings, caps)?;

    let printer = TracePrinter::default();
    let mut run = controller.submit_observed(input, &printer).await?;

    if run.state() == RunState::AwaitingApproval {
        let decision = if args.yes {
            ApprovalDecision::approve()
        } else {
            let draft = run.email_draft().unwrap_or_default().to_string();
            let stdin = io::stdin();
            approval::ask(&mut stdin.lock(), &mut io::stdout(), &draft)
                .context("failed to read approval")?
        };
        controller.decide(&mut run, decision, &printer).await?;
    }

    print_report(&run);
    if run.state() == RunState::Failed {
        std::process::exit(1);
    }
    Ok(())
}
