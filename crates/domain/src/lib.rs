//! Domain layer for the URL shortener.
//!
//! This crate provides:
//! - URL validation and the deterministic short-code function
//! - `LinkService`, the shorten / resolve / list API used by the HTTP layer

pub mod error;
pub mod link;

pub use error::DomainError;
pub use link::{
    BatchItem, BatchShortened, BatchShortening, LinkService, OriginalUrl, Resolution,
    SHORT_CODE_LEN, Shortened, short_code_for,
};
