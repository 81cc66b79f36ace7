//! Run state machine.
//!
//! A run moves strictly forward through
//! `Idle → Searching → Scraping → Drafting → AwaitingApproval → Sending → Sent`,
//! with two exits: `Reject` from `AwaitingApproval` and `Fail` from any
//! non-terminal state. [`transition`] is pure so a suspended run can be
//! serialized, handed to another process, and resumed there.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Searching,
    Scraping,
    Drafting,
    /// The only state that waits on the outside world.
    AwaitingApproval,
    Sending,
    Sent,
    Rejected,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "Idle",
            RunState::Searching => "Searching",
            RunState::Scraping => "Scraping",
            RunState::Drafting => "Drafting",
            RunState::AwaitingApproval => "AwaitingApproval",
            RunState::Sending => "Sending",
            RunState::Sent => "Sent",
            RunState::Rejected => "Rejected",
            RunState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Sent | RunState::Rejected | RunState::Failed)
    }

    /// Event that closes out an automated research stage.
    pub fn completion_event(&self) -> Option<RunEvent> {
        match self {
            RunState::Searching => Some(RunEvent::Searched),
            RunState::Scraping => Some(RunEvent::Scraped),
            RunState::Drafting => Some(RunEvent::Drafted),
            _ => None,
        }
    }

    /// Trace line written when a run enters this state.
    pub fn banner(&self) -> &'static str {
        match self {
            RunState::Idle => "Run created.",
            RunState::Searching => "Searching for company news...",
            RunState::Scraping => "Scraping company website...",
            RunState::Drafting => "Drafting summary and email...",
            RunState::AwaitingApproval => "Awaiting human approval.",
            RunState::Sending => "Approved by operator.",
            RunState::Sent => "Run complete: email sent.",
            RunState::Rejected => "Not approved; email will not be sent.",
            RunState::Failed => "Run failed.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "cause", rename_all = "snake_case")]
pub enum RunEvent {
    Start,
    Searched,
    Scraped,
    Drafted,
    Approve,
    Reject,
    Delivered,
    Fail(String),
}

impl RunEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RunEvent::Start => "start",
            RunEvent::Searched => "searched",
            RunEvent::Scraped => "scraped",
            RunEvent::Drafted => "drafted",
            RunEvent::Approve => "approve",
            RunEvent::Reject => "reject",
            RunEvent::Delivered => "delivered",
            RunEvent::Fail(_) => "fail",
        }
    }
}

/// Compute the next state, or refuse the event.
pub fn transition(from: RunState, event: &RunEvent) -> Result<RunState, WorkflowError> {
    let next = match (from, event) {
        (RunState::Idle, RunEvent::Start) => RunState::Searching,
        (RunState::Searching, RunEvent::Searched) => RunState::Scraping,
        (RunState::Scraping, RunEvent::Scraped) => RunState::Drafting,
        (RunState::Drafting, RunEvent::Drafted) => RunState::AwaitingApproval,
        (RunState::AwaitingApproval, RunEvent::Approve) => RunState::Sending,
        (RunState::AwaitingApproval, RunEvent::Reject) => RunState::Rejected,
        (RunState::Sending, RunEvent::Delivered) => RunState::Sent,
        (state, RunEvent::Fail(_)) if !state.is_terminal() => RunState::Failed,
        _ => {
            return Err(WorkflowError::InvalidTransition {
                from,
                event: event.name().to_string(),
            })
        }
    };
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [RunState; 9] = [
        RunState::Idle,
        RunState::Searching,
        RunState::Scraping,
        RunState::Drafting,
        RunState::AwaitingApproval,
        RunState::Sending,
        RunState::Sent,
        RunState::Rejected,
        RunState::Failed,
    ];

    fn all_events() -> Vec<RunEvent> {
        vec![
            RunEvent::Start,
            RunEvent::Searched,
            RunEvent::Scraped,
            RunEvent::Drafted,
            RunEvent::Approve,
            RunEvent::Reject,
            RunEvent::Delivered,
            RunEvent::Fail("boom".to_string()),
        ]
    }

    #[test]
    fn test_happy_path() {
        let mut state = RunState::Idle;
        for event in [
            RunEvent::Start,
            RunEvent::Searched,
            RunEvent::Scraped,
            RunEvent::Drafted,
            RunEvent::Approve,
            RunEvent::Delivered,
        ] {
            state = transition(state, &event).unwrap();
        }
        assert_eq!(state, RunState::Sent);
    }

    #[test]
    fn test_sent_only_reachable_from_sending() {
        for state in ALL_STATES {
            for event in all_events() {
                if let Ok(RunState::Sent) = transition(state, &event) {
                    assert_eq!(state, RunState::Sending);
                    assert_eq!(event, RunEvent::Delivered);
                }
            }
        }
    }

    #[test]
    fn test_sending_only_reachable_by_approval() {
        for state in ALL_STATES {
            for event in all_events() {
                if let Ok(RunState::Sending) = transition(state, &event) {
                    assert_eq!(state, RunState::AwaitingApproval);
                    assert_eq!(event, RunEvent::Approve);
                }
            }
        }
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for state in ALL_STATES.iter().filter(|s| s.is_terminal()) {
            for event in all_events() {
                assert!(transition(*state, &event).is_err(), "{state} accepted {event:?}");
            }
        }
    }

    #[test]
    fn test_fail_from_any_live_state() {
        for state in ALL_STATES.iter().filter(|s| !s.is_terminal()) {
            assert_eq!(
                transition(*state, &RunEvent::Fail("x".into())).unwrap(),
                RunState::Failed
            );
        }
    }

    #[test]
    fn test_no_skipping_ahead() {
        assert!(transition(RunState::Searching, &RunEvent::Drafted).is_err());
        assert!(transition(RunState::Drafting, &RunEvent::Approve).is_err());
        assert!(transition(RunState::Idle, &RunEvent::Delivered).is_err());
    }

    #[test]
    fn test_completion_events_line_up() {
        for state in [RunState::Searching, RunState::Scraping, RunState::Drafting] {
            let event = state.completion_event().unwrap();
            assert!(transition(state, &event).is_ok());
        }
        assert!(RunState::AwaitingApproval.completion_event().is_none());
    }
}
