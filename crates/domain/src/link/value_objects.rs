//! Value objects for short links.

use common::ShortCode;
use url::Url;
use uuid::Uuid;

use crate::DomainError;

/// Length of every generated short code.
pub const SHORT_CODE_LEN: usize = 8;

/// Derives the short code of a URL.
///
/// The same URL always yields the same code.
pub fn short_code_for(original_url: &str) -> ShortCode {
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_URL, original_url.as_bytes())
        .simple()
        .to_string();
    ShortCode::new(&digest[..SHORT_CODE_LEN])
}

/// A validated absolute http(s) URL submitted for shortening.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OriginalUrl(String);

impl OriginalUrl {
    /// Validates `raw` and keeps it as submitted (minus surrounding whitespace).
    ///
    /// The scheme separator must be written out in full: `http:/host` is
    /// rejected even though a lenient parser would repair it.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();
        let parsed = Url::parse(raw).map_err(|e| DomainError::InvalidUrl(format!("{raw}: {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DomainError::InvalidUrl(format!(
                "{raw}: unsupported scheme {}",
                parsed.scheme()
            )));
        }

        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(DomainError::InvalidUrl(format!("{raw}: missing host")));
        }

        let prefix = format!("{}://", parsed.scheme());
        if !raw.to_ascii_lowercase().starts_with(&prefix) {
            return Err(DomainError::InvalidUrl(format!(
                "{raw}: malformed scheme separator"
            )));
        }

        Ok(Self(raw.to_string()))
    }

    /// Returns the URL as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the short code this URL maps to.
    pub fn short_code(&self) -> ShortCode {
        short_code_for(&self.0)
    }
}

impl std::fmt::Display for OriginalUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for OriginalUrl {
    type Error = DomainError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl AsRef<str> for OriginalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
