//! Domain error types.

use common::ShortCode;
use thiserror::Error;
use url_store::StoreError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The submitted text is not an absolute http(s) URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No link is stored under the code.
    #[error("Short code not found: {0}")]
    NotFound(ShortCode),

    /// An error occurred in the URL store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
