//! Short links: validation, code derivation and the link service.

mod service;
mod value_objects;

pub use service::{BatchItem, BatchShortened, BatchShortening, LinkService, Resolution, Shortened};
pub use value_objects::{OriginalUrl, SHORT_CODE_LEN, short_code_for};
