//! bibjoin library interface
//!
//! Deferred correlation of package-level and item-level metadata records.
//! A record arriving without its counterpart is parked in the crawl's
//! [`pending::PendingStore`]; the second half triggers the merge and exactly
//! one emission.

pub mod engine;
pub mod error;
pub mod key;
pub mod merge;
pub mod pending;
pub mod probe;
pub mod runner;
pub mod sink;
pub mod source;
pub mod stats;
pub mod types;

pub use crate::engine::{CrawlSession, DeferredExtractor, IngestOutcome};
pub use crate::error::{CorrelateError, CorrelateResult};
pub use crate::types::{
    CorrelationKey, FieldId, ItemHandle, ItemType, MergedRecord, PublicationType, RawRecord,
    RecordKind, SchemaFamily,
};
