use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the user owning a set of short links.
///
/// The value is opaque: it is minted by the HTTP layer and echoed back
/// through a cookie, so any non-empty string is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Creates an owner ID from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh random owner ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the owner ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OwnerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for OwnerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The compact identifier a long URL is mapped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

impl ShortCode {
    /// Creates a short code from a string.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ShortCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ShortCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A request to soft-delete one short code on behalf of its owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeletionRequest {
    pub owner: OwnerId,
    pub code: ShortCode,
}

impl DeletionRequest {
    pub fn new(owner: impl Into<OwnerId>, code: impl Into<ShortCode>) -> Self {
        Self {
            owner: owner.into(),
            code: code.into(),
        }
    }

    /// Builds one request per code, all for the same owner.
    pub fn for_owner<I, C>(owner: &OwnerId, codes: I) -> Vec<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<ShortCode>,
    {
        codes
            .into_iter()
            .map(|code| Self {
                owner: owner.clone(),
                code: code.into(),
            })
            .collect()
    }
}

impl std::fmt::Display for DeletionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.code)
    }
}
