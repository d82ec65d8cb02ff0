//! Identifiers shared by every crate of the URL shortener.

mod types;

pub use types::{DeletionRequest, OwnerId, ShortCode};
