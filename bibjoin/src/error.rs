//! Error types for bibjoin
//!
//! Every variant is scoped to a single record: the crawl driver logs it and
//! moves on to the next record.

use crate::sink::SinkError;
use crate::types::{CorrelationKey, RecordKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorrelateError {
    /// Origin path does not match `<prefix>/<set><letter>.<ext>!/<set>/<rest>`
    #[error("Unparsable origin path {path}: {reason}")]
    UnparsablePath { path: String, reason: String },

    /// Package entry without an item-relative path in its family's raw field
    #[error("Package entry in {path} has no {field} value")]
    MissingItemPath { path: String, field: &'static str },

    /// Second half of the same kind arrived for a pending key
    #[error("Duplicate {kind} record for pending key {key}")]
    DuplicateHalf { key: CorrelationKey, kind: RecordKind },

    /// `put` on a key that already holds an unresolved half
    #[error("Key {0} already has a pending record")]
    DuplicatePending(CorrelationKey),

    /// Any half arriving for a key that has already been matched
    #[error("Key {0} was already resolved in this crawl")]
    AlreadyResolved(CorrelationKey),

    /// Merge called with two records of the same kind
    #[error("Cannot merge two {0} records")]
    InvalidPair(RecordKind),

    #[error("Sink failed for {key}: {source}")]
    Sink {
        key: CorrelationKey,
        #[source]
        source: SinkError,
    },
}

impl CorrelateError {
    pub(crate) fn unparsable(path: &str, reason: impl Into<String>) -> Self {
        CorrelateError::UnparsablePath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

pub type CorrelateResult<T> = Result<T, CorrelateError>;
