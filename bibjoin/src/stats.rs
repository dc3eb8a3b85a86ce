//! Crawl statistics
//!
//! Counters are atomics so parallel workers can share one session.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct CrawlStats {
    received: AtomicUsize,
    deferred: AtomicUsize,
    emitted: AtomicUsize,
    unparsable: AtomicUsize,
    missing_item_path: AtomicUsize,
    duplicates: AtomicUsize,
    no_full_text: AtomicUsize,
    merge_failures: AtomicUsize,
    sink_failures: AtomicUsize,
}

/// Counter kinds bumped by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Received,
    Deferred,
    Emitted,
    Unparsable,
    MissingItemPath,
    Duplicate,
    NoFullText,
    MergeFailure,
    SinkFailure,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self, counter: Counter) {
        let slot = match counter {
            Counter::Received => &self.received,
            Counter::Deferred => &self.deferred,
            Counter::Emitted => &self.emitted,
            Counter::Unparsable => &self.unparsable,
            Counter::MissingItemPath => &self.missing_item_path,
            Counter::Duplicate => &self.duplicates,
            Counter::NoFullText => &self.no_full_text,
            Counter::MergeFailure => &self.merge_failures,
            Counter::SinkFailure => &self.sink_failures,
        };
        slot.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let get = |c: &AtomicUsize| c.load(Ordering::Relaxed);
        StatsSnapshot {
            received: get(&self.received),
            deferred: get(&self.deferred),
            emitted: get(&self.emitted),
            unparsable: get(&self.unparsable),
            missing_item_path: get(&self.missing_item_path),
            duplicates: get(&self.duplicates),
            no_full_text: get(&self.no_full_text),
            merge_failures: get(&self.merge_failures),
            sink_failures: get(&self.sink_failures),
        }
    }
}

/// Point-in-time copy of [`CrawlStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Records handed to the extractor
    pub received: usize,
    /// Records parked waiting for their counterpart
    pub deferred: usize,
    /// Merged records accepted by the sink
    pub emitted: usize,
    pub unparsable: usize,
    pub missing_item_path: usize,
    pub duplicates: usize,
    /// Pairs merged but withheld because the full text is missing
    pub no_full_text: usize,
    pub merge_failures: usize,
    pub sink_failures: usize,
}

impl StatsSnapshot {
    /// Records that never reached the pending store or a merge
    pub fn dropped(&self) -> usize {
        self.unparsable + self.missing_item_path + self.duplicates
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} records received, {} emitted, {} deferred, {} dropped, {} without full text, {} sink failures",
            self.received,
            self.emitted,
            self.deferred,
            self.dropped(),
            self.no_full_text,
            self.sink_failures
        )
    }
}
