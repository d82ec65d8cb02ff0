//! Owner identification through the signed `user_id` cookie.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use common::OwnerId;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie carrying the owner identity.
pub const OWNER_COOKIE: &str = "user_id";

/// Signs and verifies owner cookie values.
///
/// A value has the form `<owner>.<hex HMAC-SHA256 of owner>`.
#[derive(Clone)]
pub struct OwnerSigner {
    mac: HmacSha256,
}

impl OwnerSigner {
    pub fn new(secret: &[u8]) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret)?,
        })
    }

    /// Returns the cookie value carrying `owner`.
    pub fn sign(&self, owner: &OwnerId) -> String {
        let mut mac = self.mac.clone();
        mac.update(owner.as_str().as_bytes());
        format!("{owner}.{}", hex::encode(mac.finalize().into_bytes()))
    }

    /// Returns the owner of a cookie value whose signature checks out.
    pub fn verify(&self, value: &str) -> Option<OwnerId> {
        let (owner, signature) = value.rsplit_once('.')?;
        if owner.is_empty() {
            return None;
        }
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(owner.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(OwnerId::new(owner))
    }
}

/// The owner a request acts for. Inserted by [`identify`].
#[derive(Debug, Clone)]
pub struct Owner(pub OwnerId);

/// Axum middleware that resolves the request owner.
///
/// A request without a `user_id` cookie gets a freshly generated identity,
/// returned to the client in a signed `Set-Cookie` header. A cookie whose
/// signature does not verify is answered with `401 Unauthorized`.
pub async fn identify(
    State(signer): State<OwnerSigner>,
    mut request: Request,
    next: Next,
) -> Response {
    let (owner, minted) = match owner_cookie(request.headers()) {
        None => (OwnerId::generate(), true),
        Some(value) => match signer.verify(value) {
            Some(owner) => (owner, false),
            None => {
                tracing::warn!("rejected owner cookie with a bad signature");
                return ApiError::Unauthorized("Invalid owner cookie".to_string()).into_response();
            }
        },
    };

    if minted {
        tracing::debug!(%owner, "issued new owner identity");
    }
    request.extensions_mut().insert(Owner(owner.clone()));

    let mut response = next.run(request).await;

    if minted {
        let cookie = format!("{OWNER_COOKIE}={}; Path=/; HttpOnly", signer.sign(&owner));
        match HeaderValue::from_str(&cookie) {
            Ok(cookie) => {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            Err(e) => tracing::warn!(error = %e, "owner cookie not representable"),
        }
    }

    response
}

fn owner_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == OWNER_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Owner>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("owner identity missing from request".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(secret: &str) -> OwnerSigner {
        OwnerSigner::new(secret.as_bytes()).unwrap()
    }

    #[test]
    fn test_signed_value_verifies() {
        let signer = signer("secret");
        let value = signer.sign(&OwnerId::new("userA"));

        assert!(value.starts_with("userA."));
        assert_eq!(signer.verify(&value), Some(OwnerId::new("userA")));
    }

    #[test]
    fn test_tampered_owner_is_rejected() {
        let signer = signer("secret");
        let value = signer.sign(&OwnerId::new("userA"));
        let (_, signature) = value.rsplit_once('.').unwrap();

        assert_eq!(signer.verify(&format!("userB.{signature}")), None);
    }

    #[test]
    fn test_other_key_is_rejected() {
        let value = signer("secret").sign(&OwnerId::new("userA"));
        assert_eq!(signer("other").verify(&value), None);
    }

    #[test]
    fn test_unsigned_values_are_rejected() {
        let signer = signer("secret");
        assert_eq!(signer.verify("userA"), None);
        assert_eq!(signer.verify("userA.not-hex"), None);
        assert_eq!(signer.verify("userA.abcd"), None);
        assert_eq!(signer.verify(".abcd"), None);
    }

    #[test]
    fn test_cookie_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("user_id=userA.ff"));
        assert_eq!(owner_cookie(&headers), Some("userA.ff"));

        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; user_id=userB.ff; lang=en"),
        );
        assert_eq!(owner_cookie(&headers), Some("userB.ff"));
    }

    #[test]
    fn test_missing_or_empty_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(owner_cookie(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("user_id="));
        assert_eq!(owner_cookie(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("token=abc"));
        assert_eq!(owner_cookie(&headers), None);
    }
}
