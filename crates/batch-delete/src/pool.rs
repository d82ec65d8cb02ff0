//! Worker pool: N tasks draining the work feed into one transaction.

use std::sync::Arc;

use common::DeletionRequest;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use url_store::UrlTransaction;

use crate::config::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_WORKERS, DeleteConfig, UnmatchedPolicy};
use crate::error::FailureCause;
use crate::generator::WorkFeed;
use crate::outcome::Outcome;

/// Write access to a batch transaction, handed to workers.
///
/// A lease can mark records but cannot commit or roll back: ending the
/// transaction requires sole ownership, which only the orchestrator regains
/// once every lease is gone.
pub struct TxLease<T> {
    tx: Arc<T>,
}

impl<T> Clone for TxLease<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: UrlTransaction> TxLease<T> {
    pub(crate) fn new(tx: Arc<T>) -> Self {
        Self { tx }
    }

    /// Soft-deletes one record inside the shared transaction.
    pub async fn mark_deleted(&self, request: &DeletionRequest) -> url_store::Result<u64> {
        self.tx.mark_deleted(&request.owner, &request.code).await
    }
}

/// Fixed-size pool of deletion workers.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    outcome_capacity: usize,
    unmatched: UnmatchedPolicy,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl WorkerPool {
    /// Creates a pool of `workers` tasks (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            outcome_capacity: DEFAULT_CHANNEL_CAPACITY,
            unmatched: UnmatchedPolicy::default(),
        }
    }

    pub fn from_config(config: &DeleteConfig) -> Self {
        Self {
            workers: config.workers(),
            outcome_capacity: config.channel_capacity(),
            unmatched: config.unmatched(),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Starts the workers and returns the outcome channel.
    ///
    /// Every request taken from `feed` yields exactly one outcome. A worker
    /// that dies yields one `WorkerLost` outcome instead. The channel closes
    /// after the last worker has exited and released its lease.
    pub fn fan_out<T: UrlTransaction>(
        &self,
        feed: WorkFeed,
        lease: TxLease<T>,
    ) -> mpsc::Receiver<Outcome> {
        let (tx, rx) = mpsc::channel(self.outcome_capacity);
        let mut workers = JoinSet::new();

        for worker in 0..self.workers {
            workers.spawn(run_worker(
                worker,
                feed.clone(),
                lease.clone(),
                tx.clone(),
                self.unmatched,
            ));
        }
        drop(lease);

        // Barrier: the outcome channel stays open until every worker is joined.
        tokio::spawn(async move {
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "deletion worker died");
                    let _ = tx.send(Outcome::lost(e.to_string())).await;
                }
            }
        });

        rx
    }
}

async fn run_worker<T: UrlTransaction>(
    worker: usize,
    feed: WorkFeed,
    lease: TxLease<T>,
    outcomes: mpsc::Sender<Outcome>,
    unmatched: UnmatchedPolicy,
) {
    let mut handled = 0usize;

    while let Some(request) = feed.next().await {
        let outcome = match lease.mark_deleted(&request).await {
            Ok(0) if unmatched == UnmatchedPolicy::Fail => {
                tracing::warn!(worker, %request, "deletion matched no link");
                let cause = FailureCause::Unmatched {
                    owner: request.owner.clone(),
                    code: request.code.clone(),
                };
                Outcome::failure(request, cause)
            }
            Ok(rows) => {
                tracing::debug!(worker, %request, rows, "link marked deleted");
                Outcome::success(request)
            }
            Err(e) => {
                tracing::warn!(worker, %request, error = %e, "deletion failed");
                Outcome::failure(request, FailureCause::Store(e))
            }
        };

        let result = if outcome.is_success() { "ok" } else { "failed" };
        metrics::counter!("url_delete_items_total", "result" => result).increment(1);

        handled += 1;
        if outcomes.send(outcome).await.is_err() {
            tracing::warn!(worker, "outcome channel closed, stopping worker");
            break;
        }
    }

    tracing::trace!(worker, handled, "worker finished");
}
