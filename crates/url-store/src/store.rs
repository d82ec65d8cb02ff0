use std::collections::HashSet;

use async_trait::async_trait;

use crate::{InsertOutcome, NewUrl, OwnerId, Result, ShortCode, StoreError, UrlRecord};

/// Core trait for URL store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait UrlStore: Send + Sync {
    /// Transaction type used by batch soft-deletes.
    type Tx: UrlTransaction;

    /// Stores a single link.
    ///
    /// Shortening an original URL twice is not an error: the existing record
    /// is returned as `InsertOutcome::Exists`.
    async fn insert(&self, url: NewUrl) -> Result<InsertOutcome>;

    /// Stores several links atomically - either all are stored or none are.
    ///
    /// Any already-stored original URL or code fails the whole batch with
    /// `StoreError::Conflict`.
    async fn insert_batch(&self, urls: Vec<NewUrl>) -> Result<Vec<UrlRecord>>;

    /// Looks up a link by its short code, including soft-deleted ones.
    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;

    /// Lists the live (not deleted) links of an owner, oldest first.
    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<UrlRecord>>;

    /// Checks that the backing store is reachable.
    async fn ping(&self) -> Result<()>;

    /// Opens a transaction for soft-deleting a batch of links.
    ///
    /// No other deletion transaction can make progress on the same records
    /// until this one is committed or rolled back.
    async fn begin(&self) -> Result<Self::Tx>;
}

/// A deletion transaction.
///
/// `mark_deleted` takes `&self` so the transaction can be shared by several
/// concurrent writers. `commit` and `rollback` consume it, which means only the
/// holder of the last reference can end it.
#[async_trait]
pub trait UrlTransaction: Send + Sync + Sized + 'static {
    /// Flags the link `code` owned by `owner` as deleted.
    ///
    /// Returns the number of records matched; 0 means the code does not exist
    /// or belongs to someone else.
    async fn mark_deleted(&self, owner: &OwnerId, code: &ShortCode) -> Result<u64>;

    /// Makes every mark of this transaction durable.
    async fn commit(self) -> Result<()>;

    /// Discards every mark of this transaction.
    async fn rollback(self) -> Result<()>;
}

/// Extension trait providing convenience methods for URL stores.
#[async_trait]
pub trait UrlStoreExt: UrlStore {
    /// Checks if a short code is stored at all.
    async fn contains(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.get(code).await?.is_some())
    }

    /// Returns the deleted flag of a code, or None if it is unknown.
    async fn is_deleted(&self, code: &ShortCode) -> Result<Option<bool>> {
        Ok(self.get(code).await?.map(|record| record.deleted))
    }
}

// Blanket implementation for all UrlStore implementations
impl<T: UrlStore + ?Sized> UrlStoreExt for T {}

/// Rejects batches that conflict with themselves.
pub fn validate_batch(urls: &[NewUrl]) -> Result<()> {
    let mut seen_urls = HashSet::new();
    let mut seen_codes = HashSet::new();

    for url in urls {
        if !seen_urls.insert(url.original_url.as_str()) || !seen_codes.insert(&url.code) {
            return Err(StoreError::Conflict {
                original_url: url.original_url.clone(),
                code: url.code.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_url(original: &str, code: &str) -> NewUrl {
        NewUrl::new(original, code, "corr", OwnerId::new("owner"))
    }

    #[test]
    fn validate_accepts_distinct_urls() {
        let batch = vec![
            new_url("https://a.example", "aaaa"),
            new_url("https://b.example", "bbbb"),
        ];
        assert!(validate_batch(&batch).is_ok());
    }

    #[test]
    fn validate_rejects_repeated_original_url() {
        let batch = vec![
            new_url("https://a.example", "aaaa"),
            new_url("https://a.example", "cccc"),
        ];
        assert!(matches!(
            validate_batch(&batch),
            Err(StoreError::Conflict { .. })
        ));
    }

    #[test]
    fn validate_rejects_repeated_code() {
        let batch = vec![
            new_url("https://a.example", "aaaa"),
            new_url("https://b.example", "aaaa"),
        ];
        assert!(validate_batch(&batch).is_err());
    }

    #[test]
    fn validate_accepts_empty_batch() {
        assert!(validate_batch(&[]).is_ok());
    }
}
