//! Emission sinks
//!
//! The engine calls [`EmissionSink::emit`] at most once per correlation key,
//! so sinks never need to deduplicate.

use crate::types::{ItemHandle, MergedRecord};
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Sink refused the record
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Receives finished records
pub trait EmissionSink: Send + Sync {
    fn emit(&self, handle: ItemHandle, record: MergedRecord) -> Result<(), SinkError>;
}

/// Keeps every emitted record in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    emitted: Mutex<Vec<(ItemHandle, MergedRecord)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of everything emitted so far, in emission order
    pub fn emitted(&self) -> Vec<(ItemHandle, MergedRecord)> {
        self.lock().clone()
    }

    pub fn into_inner(self) -> Vec<(ItemHandle, MergedRecord)> {
        self.emitted
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ItemHandle, MergedRecord)>> {
        self.emitted.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EmissionSink for CollectingSink {
    fn emit(&self, handle: ItemHandle, record: MergedRecord) -> Result<(), SinkError> {
        self.lock().push((handle, record));
        Ok(())
    }
}

#[derive(Serialize)]
struct EmittedLine<'a> {
    item: &'a ItemHandle,
    record: &'a MergedRecord,
}

/// Writes one JSON object per record: `{"item": ..., "record": ...}`
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn flush(&self) -> Result<(), SinkError> {
        self.lock().flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, W> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> EmissionSink for JsonLinesSink<W> {
    fn emit(&self, handle: ItemHandle, record: MergedRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(&EmittedLine {
            item: &handle,
            record: &record,
        })?;
        line.push(b'\n');
        self.lock().write_all(&line)?;
        Ok(())
    }
}
