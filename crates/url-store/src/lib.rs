pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::{OwnerId, ShortCode};
pub use error::{Result, StoreError};
pub use memory::{InMemoryTransaction, InMemoryUrlStore};
pub use postgres::{PostgresTransaction, PostgresUrlStore};
pub use record::{InsertOutcome, NewUrl, UrlRecord};
pub use store::{UrlStore, UrlStoreExt, UrlTransaction};
