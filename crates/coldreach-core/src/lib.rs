//! coldreach core: stage trait, workflow controller, and data model
//!
//! A run researches a company, drafts an outreach email, and then stops at
//! the approval gate until a human decides.
//!
//! ```text
//! Idle → Searching → Scraping → Drafting → AwaitingApproval ─┬→ Sending → Sent
//!                                                            └→ Rejected
//!        (any live state) ──────────────────────────────────────→ Failed
//! ```

pub mod capability;
pub mod config;
pub mod context;
pub mod data_model;
pub mod error;
pub mod gate;
pub mod registry;
pub mod runner;
pub mod stage;
pub mod state;

pub use capability::{Capabilities, Outbox, PageFetcher, SearchProvider, TextGenerator};
pub use config::Settings;
pub use context::{ContextBudget, ResearchContext};
pub use data_model::{ApprovalDecision, Outcome, Provider, RunInput, SearchHit, WorkflowRun};
pub use error::{WorkflowError, WorkflowResult};
pub use gate::{Approval, ApprovalGate};
pub use registry::RunRegistry;
pub use runner::{NoopObserver, RunObserver, WorkflowController};
pub use stage::{SendStage, Stage, StageError};
pub use state::{RunEvent, RunState};

/// Engine version reported by the transports
pub const COLDREACH_VERSION: &str = "1.0.0";
