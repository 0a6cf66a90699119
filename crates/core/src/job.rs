//! Export job lifecycle states.
//!
//! States are assigned by the analytics platform; local code only
//! observes them through status polling and never drives a transition
//! itself. The only classification the orchestrator needs is
//! terminal-or-not: a terminal job leaves the live set, a non-terminal
//! one gets polled again next round.

use serde::{Deserialize, Serialize};

/// Lifecycle state the platform reports for an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Accepted but not yet scheduled on the platform side.
    Pending,
    /// Executing on the platform side.
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    /// Whether no further transition can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }

    /// Wire-format name, as the platform reports it.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "PENDING",
            JobState::Running => "RUNNING",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
            JobState::Cancelled => "CANCELLED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
    }

    #[test]
    fn non_terminal_states() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
    }

    #[test]
    fn deserializes_from_wire_form() {
        let state: JobState = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(state, JobState::Completed);
    }

    #[test]
    fn serializes_to_wire_form() {
        assert_eq!(
            serde_json::to_string(&JobState::Running).unwrap(),
            "\"RUNNING\""
        );
    }

    #[test]
    fn as_str_matches_serde_form() {
        for state in [
            JobState::Pending,
            JobState::Running,
            JobState::Completed,
            JobState::Failed,
            JobState::Cancelled,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
        }
    }
}
