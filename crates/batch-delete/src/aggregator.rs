//! Fan-in of worker outcomes into a single verdict.

use tokio::sync::mpsc;

use crate::outcome::{ItemFailure, Outcome};

/// Summary of every outcome of a batch.
#[derive(Debug, Default)]
pub struct Verdict {
    received: usize,
    failures: Vec<ItemFailure>,
}

impl Verdict {
    /// Adds one outcome.
    pub fn record(&mut self, outcome: Outcome) {
        self.received += 1;
        if let Some(failure) = outcome.into_failure() {
            self.failures.push(failure);
        }
    }

    /// Number of outcomes seen.
    pub fn received(&self) -> usize {
        self.received
    }

    pub fn succeeded(&self) -> usize {
        self.received - self.failures.len()
    }

    /// True when no outcome failed. An empty batch counts as succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<ItemFailure> {
        self.failures
    }
}

/// Drains the outcome channel until every sender is gone.
///
/// A failure does not stop the drain: the verdict is only returned once the
/// workers are finished and the transaction is free.
pub async fn collect(mut outcomes: mpsc::Receiver<Outcome>) -> Verdict {
    let mut verdict = Verdict::default();
    while let Some(outcome) = outcomes.recv().await {
        verdict.record(outcome);
    }
    verdict
}
