//! Per-item results flowing from the workers to the aggregator.

use common::DeletionRequest;

use crate::error::FailureCause;

/// The result of one deletion attempt.
///
/// `request` is kept for diagnostics. It is `None` only for the outcome
/// reported on behalf of a worker that died mid-item.
#[derive(Debug)]
pub struct Outcome {
    pub request: Option<DeletionRequest>,
    pub result: Result<(), FailureCause>,
}

impl Outcome {
    pub fn success(request: DeletionRequest) -> Self {
        Self {
            request: Some(request),
            result: Ok(()),
        }
    }

    pub fn failure(request: DeletionRequest, cause: FailureCause) -> Self {
        Self {
            request: Some(request),
            result: Err(cause),
        }
    }

    /// Outcome standing in for whatever a dead worker was holding.
    pub fn lost(reason: impl Into<String>) -> Self {
        Self {
            request: None,
            result: Err(FailureCause::WorkerLost(reason.into())),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Splits off the failure, if any.
    pub fn into_failure(self) -> Option<ItemFailure> {
        match self.result {
            Ok(()) => None,
            Err(cause) => Some(ItemFailure {
                request: self.request,
                cause,
            }),
        }
    }
}

/// A failed item and why it failed.
#[derive(Debug)]
pub struct ItemFailure {
    pub request: Option<DeletionRequest>,
    pub cause: FailureCause,
}

impl std::fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.request {
            Some(request) => write!(f, "{request}: {}", self.cause),
            None => write!(f, "{}", self.cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OwnerId, ShortCode};

    #[test]
    fn success_has_no_failure() {
        let outcome = Outcome::success(DeletionRequest::new("userA", "abc"));
        assert!(outcome.is_success());
        assert!(outcome.into_failure().is_none());
    }

    #[test]
    fn failure_keeps_request_and_cause() {
        let request = DeletionRequest::new("userB", "xyz");
        let outcome = Outcome::failure(
            request.clone(),
            FailureCause::Unmatched {
                owner: OwnerId::new("userB"),
                code: ShortCode::new("xyz"),
            },
        );

        let failure = outcome.into_failure().unwrap();
        assert_eq!(failure.request, Some(request));
        assert_eq!(failure.to_string(), "userB/xyz: no link xyz owned by userB");
    }

    #[test]
    fn lost_outcome_has_no_request() {
        let failure = Outcome::lost("panicked").into_failure().unwrap();
        assert!(failure.request.is_none());
        assert!(matches!(failure.cause, FailureCause::WorkerLost(_)));
    }
}
