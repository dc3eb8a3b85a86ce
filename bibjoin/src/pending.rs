//! Pending Record Store
//!
//! Holds whichever half of a correlated pair arrived first. Entries leave the
//! store only when their counterpart takes them; an entry whose counterpart
//! never arrives stays until the crawl session is dropped. Keys that have been
//! taken are remembered for the rest of the crawl and accept no further halves.

use crate::error::{CorrelateError, CorrelateResult};
use crate::types::{CorrelationKey, RawRecord};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Result of offering a record to the store
#[derive(Debug)]
pub enum Offer {
    /// No counterpart yet; the record now waits in the store
    Parked,
    /// The counterpart was waiting and has been removed
    Matched { arrived: RawRecord, pending: RawRecord },
}

#[derive(Debug, Default)]
struct Entries {
    waiting: HashMap<CorrelationKey, RawRecord>,
    resolved: HashSet<CorrelationKey>,
}

#[derive(Debug, Default)]
pub struct PendingStore {
    entries: Mutex<Entries>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section leaves both collections consistent, so a
    // poisoned lock still guards a usable store.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a record; a key may hold at most one unresolved half
    pub fn put(&self, key: CorrelationKey, record: RawRecord) -> CorrelateResult<()> {
        let mut entries = self.lock();
        if entries.resolved.contains(&key) {
            return Err(CorrelateError::AlreadyResolved(key));
        }
        if entries.waiting.contains_key(&key) {
            return Err(CorrelateError::DuplicatePending(key));
        }
        entries.waiting.insert(key, record);
        Ok(())
    }

    /// Remove and return the entry for `key`, if any
    ///
    /// A successful take resolves the key.
    pub fn take_if_present(&self, key: &CorrelationKey) -> Option<RawRecord> {
        let mut entries = self.lock();
        let taken = entries.waiting.remove(key)?;
        entries.resolved.insert(key.clone());
        Some(taken)
    }

    /// Take the counterpart of `record`, or park `record` until it arrives
    ///
    /// Both steps happen under one lock, so two halves arriving at the same
    /// time resolve to exactly one `Matched`. A pending entry of the same kind
    /// as `record` is left in place and the arrival is rejected. Once a key
    /// has matched, every later arrival for it is rejected.
    pub fn take_or_put(&self, key: CorrelationKey, record: RawRecord) -> CorrelateResult<Offer> {
        let mut entries = self.lock();
        if entries.resolved.contains(&key) {
            return Err(CorrelateError::AlreadyResolved(key));
        }
        match entries.waiting.remove(&key) {
            Some(pending) if pending.kind == record.kind => {
                let kind = record.kind;
                entries.waiting.insert(key.clone(), pending);
                Err(CorrelateError::DuplicateHalf { key, kind })
            }
            Some(pending) => {
                entries.resolved.insert(key);
                Ok(Offer::Matched {
                    arrived: record,
                    pending,
                })
            }
            None => {
                entries.waiting.insert(key, record);
                Ok(Offer::Parked)
            }
        }
    }

    /// Number of records waiting for a counterpart
    pub fn len(&self) -> usize {
        self.lock().waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().waiting.is_empty()
    }

    pub fn contains(&self, key: &CorrelationKey) -> bool {
        self.lock().waiting.contains_key(key)
    }

    /// Whether `key` has already been matched in this crawl
    pub fn is_resolved(&self, key: &CorrelationKey) -> bool {
        self.lock().resolved.contains(key)
    }

    pub fn resolved_len(&self) -> usize {
        self.lock().resolved.len()
    }

    /// Keys still waiting for a counterpart, sorted
    pub fn pending_keys(&self) -> Vec<CorrelationKey> {
        let mut keys: Vec<_> = self.lock().waiting.keys().cloned().collect();
        keys.sort();
        keys
    }
}
