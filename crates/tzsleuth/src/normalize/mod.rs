//! Record normalization: decoded endpoint schemas and their conversion into
//! canonical records.

pub mod convert;
pub mod types;

pub use convert::{EventConversion, event_records, excerpt, extract_repository};
