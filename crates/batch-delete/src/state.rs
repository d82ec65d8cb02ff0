//! Batch state machine.

use crate::error::BatchError;

/// The state of a batch in its lifecycle.
///
/// State transitions:
/// ```text
/// Idle ──► TransactionOpen ──► FanOutRunning ──► Deciding ──┬──► Committed
///                                                           └──► RolledBack
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BatchState {
    /// Nothing has happened yet.
    #[default]
    Idle,

    /// The store transaction is open; no worker runs yet.
    TransactionOpen,

    /// Workers are applying deletions.
    FanOutRunning,

    /// Every outcome is in; commit or rollback is under way.
    Deciding,

    /// Every deletion was made durable (terminal state).
    Committed,

    /// Every deletion was discarded (terminal state).
    RolledBack,
}

impl BatchState {
    /// Returns true if `next` directly follows this state.
    pub fn can_transition_to(&self, next: BatchState) -> bool {
        matches!(
            (self, next),
            (BatchState::Idle, BatchState::TransactionOpen)
                | (BatchState::TransactionOpen, BatchState::FanOutRunning)
                | (BatchState::FanOutRunning, BatchState::Deciding)
                | (BatchState::Deciding, BatchState::Committed)
                | (BatchState::Deciding, BatchState::RolledBack)
        )
    }

    /// Returns true if a transaction may be opened.
    pub fn can_open(&self) -> bool {
        self.can_transition_to(BatchState::TransactionOpen)
    }

    /// Returns true if workers may be started.
    pub fn can_fan_out(&self) -> bool {
        self.can_transition_to(BatchState::FanOutRunning)
    }

    /// Returns true if the commit/rollback decision may be taken.
    pub fn can_decide(&self) -> bool {
        self.can_transition_to(BatchState::Deciding)
    }

    /// Moves to `next`, or reports the illegal transition.
    pub fn advance(self, next: BatchState) -> Result<BatchState, BatchError> {
        if !self.can_transition_to(next) {
            return Err(BatchError::InvalidTransition {
                from: self,
                to: next,
            });
        }
        tracing::debug!(from = %self, to = %next, "batch state transition");
        Ok(next)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchState::Committed | BatchState::RolledBack)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchState::Idle => "Idle",
            BatchState::TransactionOpen => "TransactionOpen",
            BatchState::FanOutRunning => "FanOutRunning",
            BatchState::Deciding => "Deciding",
            BatchState::Committed => "Committed",
            BatchState::RolledBack => "RolledBack",
        }
    }
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
