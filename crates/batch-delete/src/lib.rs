//! Concurrent, all-or-nothing soft deletion of short links.
//!
//! A batch flows one way:
//!
//! ```text
//! requests ──► generator ──► worker pool (N tasks) ──► aggregator ──► commit | rollback
//!                  │              │                         ▲
//!                  └─ work feed ──┘── outcome channel ──────┘
//! ```
//!
//! Every worker writes through a [`TxLease`] on the same store transaction.
//! Only the [`BatchDeleter`] can end that transaction, and it decides to do so
//! once every outcome is in: commit when all items succeeded, rollback when any
//! failed.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod generator;
pub mod orchestrator;
pub mod outcome;
pub mod pool;
pub mod state;

pub use aggregator::Verdict;
pub use config::{DEFAULT_WORKERS, DeleteConfig, UnmatchedPolicy};
pub use error::{BatchError, FailureCause};
pub use generator::WorkFeed;
pub use orchestrator::{BatchDeleter, BatchOutcome, BatchReport};
pub use outcome::{ItemFailure, Outcome};
pub use pool::{TxLease, WorkerPool};
pub use state::BatchState;
