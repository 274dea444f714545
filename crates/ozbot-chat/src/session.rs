//! Per-conversation guide state.
//!
//! The step index only exists inside `Guiding`, so clearing the procedure
//! can never leave a stale index behind.

use std::sync::Arc;

use ozbot_core::types::Procedure;

/// Where a conversation stands with respect to guided procedures.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    /// No procedure is being walked through.
    #[default]
    Idle,
    /// Stepping through `procedure`, currently at `step_index` in its
    /// flattened step list.
    Guiding {
        procedure: Arc<Procedure>,
        step_index: usize,
    },
}

impl SessionState {
    /// Start guiding `procedure` from its first step.
    pub fn guiding(procedure: Arc<Procedure>) -> Self {
        SessionState::Guiding {
            procedure,
            step_index: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn active_procedure(&self) -> Option<&Arc<Procedure>> {
        match self {
            SessionState::Idle => None,
            SessionState::Guiding { procedure, .. } => Some(procedure),
        }
    }

    /// Current step index, or -1 when idle.
    pub fn current_step_index(&self) -> i64 {
        match self {
            SessionState::Idle => -1,
            SessionState::Guiding { step_index, .. } => *step_index as i64,
        }
    }
}
