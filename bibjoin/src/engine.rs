//! Deferred Extractor
//!
//! Entry point for every record of a crawl. The first half of a pair is
//! parked in the session's pending store; the second half triggers
//! merge and emission.
//!
//! **Flow per record:**
//! 1. Derive the correlation key (unparsable records are dropped)
//! 2. Item records: fill volume/issue from the path, resolve the access URL
//! 3. `take_or_put` on the pending store
//! 4. On a match: merge, check full text, emit once

use crate::error::{CorrelateError, CorrelateResult};
use crate::key::{derive_key, volume_issue};
use crate::merge::{merge, MergePolicy};
use crate::pending::{Offer, PendingStore};
use crate::probe::{sibling_path, ContentProbe};
use crate::sink::EmissionSink;
use crate::stats::{Counter, CrawlStats, StatsSnapshot};
use crate::types::{CorrelationKey, FieldId, ItemHandle, RawRecord, RecordKind};
use bibjoin_common::config::CorrelationConfig;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// Crawl Session
// ============================================================================

/// State owned by one crawl
///
/// Created when a crawl starts and passed by reference to every
/// [`DeferredExtractor::extract`] call. Dropping it discards whatever is
/// still pending.
#[derive(Debug)]
pub struct CrawlSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    pending: PendingStore,
    stats: CrawlStats,
}

impl Default for CrawlSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            pending: PendingStore::new(),
            stats: CrawlStats::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn pending(&self) -> &PendingStore {
        &self.pending
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Log the crawl summary and report unresolved entries
    ///
    /// Stale entries are not an error; they stay in the store.
    pub fn finish(&self) -> StatsSnapshot {
        let stats = self.stats.snapshot();
        let elapsed = Utc::now().signed_duration_since(self.started_at);

        info!(
            session_id = %self.id,
            elapsed_ms = elapsed.num_milliseconds(),
            "Crawl complete: {}",
            stats.display_string()
        );

        let stale = self.pending.len();
        if stale > 0 {
            warn!(
                session_id = %self.id,
                stale,
                "Records still waiting for their counterpart"
            );
            for key in self.pending.pending_keys() {
                debug!(session_id = %self.id, key = %key, "Unresolved pending entry");
            }
        }
        stats
    }
}

// ============================================================================
// Extractor
// ============================================================================

/// What happened to one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// First half of its pair; now pending
    Deferred(CorrelationKey),
    /// Completed a pair; the merged record went to the sink
    Emitted(CorrelationKey),
    /// Completed a pair, but the item has no full text and nothing was emitted
    NoFullText(CorrelationKey),
}

impl IngestOutcome {
    pub fn key(&self) -> &CorrelationKey {
        match self {
            IngestOutcome::Deferred(key)
            | IngestOutcome::Emitted(key)
            | IngestOutcome::NoFullText(key) => key,
        }
    }
}

pub struct DeferredExtractor {
    policy: MergePolicy,
    probe: Arc<dyn ContentProbe>,
    full_text_file: String,
    require_full_text: bool,
}

impl DeferredExtractor {
    pub fn new(config: &CorrelationConfig, probe: Arc<dyn ContentProbe>) -> Self {
        Self {
            policy: MergePolicy::from(config),
            probe,
            full_text_file: config.full_text_file.clone(),
            require_full_text: config.require_full_text,
        }
    }

    pub fn policy(&self) -> &MergePolicy {
        &self.policy
    }

    /// Handle one record of the crawl
    ///
    /// Errors describe this record only. The pending store is left
    /// consistent whatever the outcome.
    pub fn extract(
        &self,
        session: &CrawlSession,
        record: RawRecord,
        sink: &dyn EmissionSink,
    ) -> CorrelateResult<IngestOutcome> {
        let stats = &session.stats;
        stats.bump(Counter::Received);

        let key = derive_key(&record).map_err(|e| {
            match e {
                CorrelateError::MissingItemPath { .. } => stats.bump(Counter::MissingItemPath),
                _ => stats.bump(Counter::Unparsable),
            }
            e
        })?;

        let record = match record.kind {
            RecordKind::ItemLevel => self.prepare_item(&key, record),
            RecordKind::PackageLevel => record,
        };

        let (arrived, pending) = match session.pending.take_or_put(key.clone(), record) {
            Ok(Offer::Parked) => {
                stats.bump(Counter::Deferred);
                debug!(key = %key, "Deferred until counterpart arrives");
                return Ok(IngestOutcome::Deferred(key));
            }
            Ok(Offer::Matched { arrived, pending }) => (arrived, pending),
            Err(e) => {
                stats.bump(Counter::Duplicate);
                return Err(e);
            }
        };

        let item_origin = if arrived.kind == RecordKind::ItemLevel {
            arrived.origin_path.clone()
        } else {
            pending.origin_path.clone()
        };

        let merged = merge(arrived, pending, &self.policy).map_err(|e| {
            stats.bump(Counter::MergeFailure);
            e
        })?;

        if merged.access_url.is_none() {
            stats.bump(Counter::NoFullText);
            warn!(key = %key, path = %item_origin, "No full text for item, not emitting");
            return Ok(IngestOutcome::NoFullText(key));
        }

        let handle = ItemHandle {
            key: key.clone(),
            origin_path: item_origin,
        };
        sink.emit(handle, merged).map_err(|source| {
            stats.bump(Counter::SinkFailure);
            CorrelateError::Sink {
                key: key.clone(),
                source,
            }
        })?;

        stats.bump(Counter::Emitted);
        debug!(key = %key, "Emitted merged record");
        Ok(IngestOutcome::Emitted(key))
    }

    /// Fill path-derived fields on an item record
    fn prepare_item(&self, key: &CorrelationKey, mut item: RawRecord) -> RawRecord {
        if let Some(parsed) = volume_issue(&key.item_path) {
            if item.field(FieldId::Volume).is_none() {
                item.fields.insert(FieldId::Volume, parsed.volume);
            }
            if let Some(issue) = parsed.issue {
                if item.field(FieldId::Issue).is_none() {
                    item.fields.insert(FieldId::Issue, issue);
                }
            }
        }

        if item.field(FieldId::AccessUrl).is_none() {
            let candidate = sibling_path(&item.origin_path, &self.full_text_file);
            match candidate {
                Some(path) if self.probe.exists(&path) => {
                    item.fields.insert(FieldId::AccessUrl, path);
                }
                _ if !self.require_full_text => {
                    let own = item.origin_path.clone();
                    item.fields.insert(FieldId::AccessUrl, own);
                }
                _ => {
                    debug!(key = %key, "Full text sibling not found");
                }
            }
        }
        item
    }
}
