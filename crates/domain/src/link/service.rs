//! Link service providing the shorten / resolve / list API.

use common::{OwnerId, ShortCode};
use url_store::{InsertOutcome, NewUrl, StoreError, UrlRecord, UrlStore};
use uuid::Uuid;

use super::OriginalUrl;
use crate::error::DomainError;

/// Result of shortening a single URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    pub code: ShortCode,
    /// False when the URL had already been shortened.
    pub created: bool,
}

/// One entry of a batch shorten request.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub correlation_id: Option<String>,
    pub original_url: String,
}

/// One entry of a batch shorten result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchShortened {
    pub correlation_id: String,
    pub code: ShortCode,
}

/// Result of a batch shorten request.
#[derive(Debug, Clone)]
pub struct BatchShortening {
    pub items: Vec<BatchShortened>,
    /// False when a conflict rolled the batch back; `items` still lists the
    /// codes each URL maps to.
    pub stored: bool,
}

/// Where a short code leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Redirect(String),
    /// The link exists but was soft-deleted.
    Gone,
}

/// Service for managing short links.
pub struct LinkService<S: UrlStore> {
    store: S,
}

impl<S: UrlStore> LinkService<S> {
    /// Creates a new link service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Shortens one URL on behalf of `owner`.
    #[tracing::instrument(skip(self))]
    pub async fn shorten(&self, owner: &OwnerId, raw_url: &str) -> Result<Shortened, DomainError> {
        let url = OriginalUrl::parse(raw_url)?;
        let code = url.short_code();

        let outcome = self
            .store
            .insert(NewUrl::new(
                url.as_str(),
                code,
                Uuid::new_v4().to_string(),
                owner.clone(),
            ))
            .await?;

        let created = outcome.is_created();
        if created {
            metrics::counter!("urls_shortened_total").increment(1);
            tracing::info!(code = %outcome.record().code, "url shortened");
        } else {
            tracing::info!(code = %outcome.record().code, "url already shortened");
        }

        let (InsertOutcome::Created(record) | InsertOutcome::Exists(record)) = outcome;
        Ok(Shortened {
            code: record.code,
            created,
        })
    }

    /// Shortens several URLs atomically.
    ///
    /// Every URL is validated before anything is stored; one invalid URL
    /// rejects the whole request. Items without a correlation ID get a fresh one.
    #[tracing::instrument(skip(self, items), fields(items = items.len()))]
    pub async fn shorten_batch(
        &self,
        owner: &OwnerId,
        items: Vec<BatchItem>,
    ) -> Result<BatchShortening, DomainError> {
        let mut new_urls = Vec::with_capacity(items.len());
        let mut shortened = Vec::with_capacity(items.len());

        for item in items {
            let url = OriginalUrl::parse(&item.original_url)?;
            let code = url.short_code();
            let correlation_id = item
                .correlation_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            new_urls.push(NewUrl::new(
                url.as_str(),
                code.clone(),
                correlation_id.clone(),
                owner.clone(),
            ));
            shortened.push(BatchShortened {
                correlation_id,
                code,
            });
        }

        let count = new_urls.len();
        let stored = match self.store.insert_batch(new_urls).await {
            Ok(_) => {
                metrics::counter!("urls_shortened_total").increment(count as u64);
                true
            }
            Err(StoreError::Conflict { original_url, .. }) => {
                tracing::warn!(%original_url, "batch conflicts with stored url, nothing stored");
                false
            }
            Err(e) => return Err(e.into()),
        };

        Ok(BatchShortening {
            items: shortened,
            stored,
        })
    }

    /// Resolves a short code to its original URL.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, code: &ShortCode) -> Result<Resolution, DomainError> {
        let record = self
            .store
            .get(code)
            .await?
            .ok_or_else(|| DomainError::NotFound(code.clone()))?;

        if record.deleted {
            return Ok(Resolution::Gone);
        }
        Ok(Resolution::Redirect(record.original_url))
    }

    /// Lists the live links of an owner.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, owner: &OwnerId) -> Result<Vec<UrlRecord>, DomainError> {
        Ok(self.store.list_by_owner(owner).await?)
    }

    /// Checks that the backing store answers.
    pub async fn ping(&self) -> Result<(), DomainError> {
        Ok(self.store.ping().await?)
    }
}
