//! Integration tests for concurrent crawls
//!
//! Two halves of a pair racing on different workers must produce exactly one
//! emission.

mod helpers;

use bibjoin::pending::{Offer, PendingStore};
use bibjoin::{CorrelationKey, RawRecord, RecordKind, SchemaFamily};
use helpers::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinSet;

fn crawl_records(count: usize) -> Vec<RawRecord> {
    let paths: Vec<String> = (0..count)
        .map(|i| format!("21735794/v{}i1/S{:04}/main.xml", 10 + i % 7, i))
        .collect();

    // Interleave so halves of one pair sit next to each other and get dealt
    // to different workers
    let mut records = Vec::with_capacity(count * 2);
    for (i, path) in paths.iter().enumerate() {
        if i % 2 == 0 {
            records.push(package_entry(path));
            records.push(item_file(path));
        } else {
            records.push(item_file(path));
            records.push(package_entry(path));
        }
    }
    records
}

fn emitted_keys(harness: &Harness) -> BTreeSet<String> {
    harness
        .sink
        .emitted()
        .iter()
        .map(|(handle, _)| handle.key.to_string())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_matches_sequential() {
    let records = crawl_records(200);

    let sequential = Harness::new();
    sequential.runner.run_sequential(records.clone());

    let parallel = Harness::new();
    let stats = parallel.runner.run_parallel(records, 4).await;

    assert_eq!(stats.received, 400);
    assert_eq!(stats.emitted, 200);
    assert_eq!(parallel.sink.len(), 200);
    assert_eq!(emitted_keys(&parallel), emitted_keys(&sequential));
    assert!(parallel.session.pending().is_empty());
}

#[tokio::test]
async fn test_parallel_single_worker_is_sequential() {
    let parallel = Harness::new();
    let stats = parallel.runner.run_parallel(crawl_records(10), 1).await;
    assert_eq!(stats.emitted, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_take_or_put_race_resolves_once() {
    for round in 0..50 {
        let store = Arc::new(PendingStore::new());
        let key = CorrelationKey::new("0003", format!("c/v1/S{}/main.xml", round));

        let mut join_set = JoinSet::new();
        for kind in [RecordKind::PackageLevel, RecordKind::ItemLevel] {
            let store = Arc::clone(&store);
            let key = key.clone();
            join_set.spawn_blocking(move || {
                let record = RawRecord::new(kind, SchemaFamily::Journal, "origin");
                store.take_or_put(key, record).expect("distinct kinds never collide")
            });
        }

        let mut matched = 0;
        let mut parked = 0;
        while let Some(result) = join_set.join_next().await {
            match result.expect("Task panicked") {
                Offer::Matched { .. } => matched += 1,
                Offer::Parked => parked += 1,
            }
        }

        assert_eq!((matched, parked), (1, 1), "round {}", round);
        assert!(store.is_empty());
    }
}
