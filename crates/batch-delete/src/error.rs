//! Batch deletion error types.

use common::{OwnerId, ShortCode};
use thiserror::Error;
use url_store::StoreError;

use crate::outcome::ItemFailure;
use crate::state::BatchState;

/// Why a single deletion request failed.
#[derive(Debug, Error)]
pub enum FailureCause {
    /// The store rejected the update.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The update matched no record: unknown code, or owned by someone else.
    #[error("no link {code} owned by {owner}")]
    Unmatched { owner: OwnerId, code: ShortCode },

    /// A worker task died before reporting the item it held.
    #[error("worker stopped before reporting: {0}")]
    WorkerLost(String),
}

/// Errors that end a batch without reaching a committed or rolled-back state.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The transaction could not be opened; no worker was started.
    #[error("failed to open transaction: {0}")]
    Begin(#[source] StoreError),

    /// Every item succeeded but the commit failed. Durable state is whatever
    /// the store kept.
    #[error("failed to commit batch: {0}")]
    Commit(#[source] StoreError),

    /// Some items failed and the rollback failed as well.
    #[error("failed to roll back batch after {} item failure(s): {source}", .failures.len())]
    Rollback {
        source: StoreError,
        failures: Vec<ItemFailure>,
    },

    /// A worker still held the transaction after the fan-in closed.
    #[error("transaction still shared by {0} holder(s) after all outcomes arrived")]
    TransactionStillShared(usize),

    /// The orchestrator attempted an illegal state transition.
    #[error("invalid batch state transition: {from} -> {to}")]
    InvalidTransition { from: BatchState, to: BatchState },
}

/// Convenience type alias for batch results.
pub type Result<T> = std::result::Result<T, BatchError>;
