//! Crawl driver
//!
//! Feeds records into a [`DeferredExtractor`] and absorbs per-record
//! failures: each is logged and counted, and the crawl moves on.

use crate::engine::{CrawlSession, DeferredExtractor, IngestOutcome};
use crate::error::CorrelateError;
use crate::sink::EmissionSink;
use crate::stats::StatsSnapshot;
use crate::types::RawRecord;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct CrawlRunner {
    extractor: Arc<DeferredExtractor>,
    session: Arc<CrawlSession>,
    sink: Arc<dyn EmissionSink>,
}

impl CrawlRunner {
    pub fn new(
        extractor: Arc<DeferredExtractor>,
        session: Arc<CrawlSession>,
        sink: Arc<dyn EmissionSink>,
    ) -> Self {
        Self {
            extractor,
            session,
            sink,
        }
    }

    pub fn session(&self) -> &Arc<CrawlSession> {
        &self.session
    }

    /// Process one record; never fails the crawl
    pub fn ingest(&self, record: RawRecord) -> Option<IngestOutcome> {
        let origin = record.origin_path.clone();
        match self
            .extractor
            .extract(&self.session, record, self.sink.as_ref())
        {
            Ok(outcome) => Some(outcome),
            Err(e @ CorrelateError::Sink { .. }) => {
                error!(path = %origin, error = %e, "Failed to emit merged record");
                None
            }
            Err(e) => {
                warn!(path = %origin, error = %e, "Dropped record");
                None
            }
        }
    }

    /// Process records one at a time, in order
    pub fn run_sequential<I>(&self, records: I) -> StatsSnapshot
    where
        I: IntoIterator<Item = RawRecord>,
    {
        for record in records {
            self.ingest(record);
        }
        self.session.stats()
    }

    /// Process records on up to `workers` blocking tasks sharing one session
    ///
    /// Records are dealt round-robin, so the two halves of a pair usually
    /// land on different workers.
    pub async fn run_parallel(&self, records: Vec<RawRecord>, workers: usize) -> StatsSnapshot {
        let workers = workers.max(1);
        if workers == 1 {
            return self.run_sequential(records);
        }

        let mut batches: Vec<Vec<RawRecord>> = (0..workers).map(|_| Vec::new()).collect();
        for (i, record) in records.into_iter().enumerate() {
            batches[i % workers].push(record);
        }

        info!(
            session_id = %self.session.id(),
            workers,
            "Starting parallel crawl"
        );

        let mut join_set = JoinSet::new();
        for (worker, batch) in batches.into_iter().enumerate() {
            let runner = self.clone();
            join_set.spawn_blocking(move || {
                let count = batch.len();
                for record in batch {
                    runner.ingest(record);
                }
                (worker, count)
            });
        }

        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((worker, count)) => {
                    debug!(worker, records = count, "Worker finished");
                }
                Err(e) => {
                    error!(error = %e, "Crawl worker failed");
                }
            }
        }

        self.session.stats()
    }
}
