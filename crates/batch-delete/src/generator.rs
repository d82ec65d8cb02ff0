//! Work generator: turns a request list into a feed shared by the workers.

use std::sync::Arc;

use common::DeletionRequest;
use tokio::sync::{Mutex, mpsc};

/// Sequential feed of deletion requests.
///
/// Cloning the feed shares it: each request is handed to exactly one of the
/// consumers.
#[derive(Clone)]
pub struct WorkFeed {
    rx: Arc<Mutex<mpsc::Receiver<DeletionRequest>>>,
}

impl WorkFeed {
    /// Takes the next request.
    ///
    /// Returns `None` once the producer has finished and the feed is drained;
    /// every later call returns `None` as well.
    pub async fn next(&self) -> Option<DeletionRequest> {
        self.rx.lock().await.recv().await
    }
}

/// Starts a producer task feeding `requests` through a channel of `capacity`.
///
/// The producer closes the feed exactly once, after the last request. If
/// every consumer goes away first it stops early.
pub fn generate(requests: Vec<DeletionRequest>, capacity: usize) -> WorkFeed {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    tokio::spawn(async move {
        let total = requests.len();
        for (sent, request) in requests.into_iter().enumerate() {
            if tx.send(request).await.is_err() {
                tracing::warn!(sent, total, "work feed abandoned by every worker");
                return;
            }
        }
        tracing::trace!(total, "work feed exhausted");
    });

    WorkFeed {
        rx: Arc::new(Mutex::new(rx)),
    }
}
