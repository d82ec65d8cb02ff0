use chrono::{DateTime, Utc};

use crate::{OwnerId, ShortCode};

/// A stored short link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub original_url: String,
    pub code: ShortCode,
    pub correlation_id: String,
    pub owner: OwnerId,
    /// Soft-delete flag. Deleted records still resolve, but to "gone".
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// A link about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrl {
    pub original_url: String,
    pub code: ShortCode,
    pub correlation_id: String,
    pub owner: OwnerId,
}

impl NewUrl {
    pub fn new(
        original_url: impl Into<String>,
        code: impl Into<ShortCode>,
        correlation_id: impl Into<String>,
        owner: OwnerId,
    ) -> Self {
        Self {
            original_url: original_url.into(),
            code: code.into(),
            correlation_id: correlation_id.into(),
            owner,
        }
    }

    /// Converts into a live record stamped with the current time.
    pub fn into_record(self) -> UrlRecord {
        UrlRecord {
            original_url: self.original_url,
            code: self.code,
            correlation_id: self.correlation_id,
            owner: self.owner,
            deleted: false,
            created_at: Utc::now(),
        }
    }
}

/// Result of inserting a single link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The link was stored.
    Created(UrlRecord),
    /// The original URL was already shortened; carries the existing record.
    Exists(UrlRecord),
}

impl InsertOutcome {
    pub fn record(&self) -> &UrlRecord {
        match self {
            InsertOutcome::Created(record) | InsertOutcome::Exists(record) => record,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, InsertOutcome::Created(_))
    }
}
