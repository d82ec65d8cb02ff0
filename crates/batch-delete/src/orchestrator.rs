//! Deletion orchestrator: owns the transaction and decides its fate.

use std::sync::Arc;
use std::time::Instant;

use common::DeletionRequest;
use tokio::task::JoinHandle;
use url_store::{UrlStore, UrlTransaction};
use uuid::Uuid;

use crate::aggregator::collect;
use crate::config::DeleteConfig;
use crate::error::{BatchError, Result};
use crate::generator::generate;
use crate::outcome::ItemFailure;
use crate::pool::{TxLease, WorkerPool};
use crate::state::BatchState;

/// How a batch ended.
#[derive(Debug)]
pub enum BatchOutcome {
    /// Every request was applied and made durable.
    Committed,
    /// At least one request failed; nothing was applied.
    RolledBack { failures: Vec<ItemFailure> },
}

/// Result of one batch run.
#[derive(Debug)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub requested: usize,
    pub outcome: BatchOutcome,
}

impl BatchReport {
    pub fn is_committed(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Committed)
    }

    /// The failed items of a rolled-back batch; empty when committed.
    pub fn failures(&self) -> &[ItemFailure] {
        match &self.outcome {
            BatchOutcome::Committed => &[],
            BatchOutcome::RolledBack { failures } => failures,
        }
    }

    /// The terminal state the batch reached.
    pub fn state(&self) -> BatchState {
        match self.outcome {
            BatchOutcome::Committed => BatchState::Committed,
            BatchOutcome::RolledBack { .. } => BatchState::RolledBack,
        }
    }
}

/// Runs deletion batches against a store.
///
/// Each batch gets its own transaction. Workers share it through leases;
/// the deleter commits once every outcome is in and none failed, and rolls
/// back otherwise.
#[derive(Clone)]
pub struct BatchDeleter<S: UrlStore> {
    store: S,
    config: DeleteConfig,
}

impl<S: UrlStore> BatchDeleter<S> {
    pub fn new(store: S, config: DeleteConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &DeleteConfig {
        &self.config
    }

    /// Soft-deletes every requested link, or none of them.
    ///
    /// Returns a report for committed and rolled-back batches alike. An
    /// error means the store failed to open or end the transaction.
    pub async fn run(&self, requests: Vec<DeletionRequest>) -> Result<BatchReport> {
        let batch_id = Uuid::new_v4();
        let started = Instant::now();

        let result = self.execute(batch_id, requests).await;

        let outcome = match &result {
            Ok(report) if report.is_committed() => "committed",
            Ok(_) => "rolled_back",
            Err(e) => {
                // No retry: a failed begin, commit or rollback ends the batch.
                tracing::error!(%batch_id, error = %e, "deletion batch failed");
                "error"
            }
        };
        metrics::counter!("url_delete_batches_total", "outcome" => outcome).increment(1);
        metrics::histogram!("url_delete_batch_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        result
    }

    #[tracing::instrument(
        skip(self, requests),
        fields(requested = requests.len(), workers = self.config.workers())
    )]
    async fn execute(&self, batch_id: Uuid, requests: Vec<DeletionRequest>) -> Result<BatchReport> {
        let requested = requests.len();
        let state = BatchState::Idle;

        let tx = self.store.begin().await.map_err(BatchError::Begin)?;
        let state = state.advance(BatchState::TransactionOpen)?;

        let tx = Arc::new(tx);
        let feed = generate(requests, self.config.channel_capacity());
        let outcomes =
            WorkerPool::from_config(&self.config).fan_out(feed, TxLease::new(Arc::clone(&tx)));
        let state = state.advance(BatchState::FanOutRunning)?;

        let verdict = collect(outcomes).await;
        let state = state.advance(BatchState::Deciding)?;
        if verdict.received() != requested {
            tracing::warn!(
                received = verdict.received(),
                "outcome count differs from request count"
            );
        }

        let tx = Arc::try_unwrap(tx)
            .map_err(|shared| BatchError::TransactionStillShared(Arc::strong_count(&shared) - 1))?;

        if verdict.all_succeeded() {
            tx.commit().await.map_err(BatchError::Commit)?;
            let state = state.advance(BatchState::Committed)?;
            tracing::info!(deleted = verdict.succeeded(), %state, "deletion batch committed");

            return Ok(BatchReport {
                batch_id,
                requested,
                outcome: BatchOutcome::Committed,
            });
        }

        let failures = verdict.into_failures();
        if let Err(e) = tx.rollback().await {
            return Err(BatchError::Rollback {
                source: e,
                failures,
            });
        }
        let state = state.advance(BatchState::RolledBack)?;
        tracing::warn!(
            failed = failures.len(),
            first_failure = %failures[0],
            %state,
            "deletion batch rolled back"
        );

        Ok(BatchReport {
            batch_id,
            requested,
            outcome: BatchOutcome::RolledBack { failures },
        })
    }
}

impl<S: UrlStore + Clone + 'static> BatchDeleter<S> {
    /// Runs a batch in the background.
    ///
    /// The caller may drop the handle; the batch still runs to completion.
    pub fn spawn(&self, requests: Vec<DeletionRequest>) -> JoinHandle<Result<BatchReport>> {
        let deleter = self.clone();
        tokio::spawn(async move { deleter.run(requests).await })
    }
}
