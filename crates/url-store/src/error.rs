use thiserror::Error;

use crate::ShortCode;

/// Errors that can occur when interacting with the URL store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The original URL or its short code is already stored.
    #[error("URL {original_url} is already stored under code {code}")]
    Conflict {
        original_url: String,
        code: ShortCode,
    },

    /// The store could not serve the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for URL store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
