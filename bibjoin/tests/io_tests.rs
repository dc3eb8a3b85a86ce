//! Integration tests for record files in and merged JSON lines out

mod helpers;

use bibjoin::probe::{AlwaysPresent, KnownPaths};
use bibjoin::runner::CrawlRunner;
use bibjoin::sink::JsonLinesSink;
use bibjoin::source::JsonLinesSource;
use bibjoin::{CrawlSession, DeferredExtractor};
use bibjoin_common::config::CorrelationConfig;
use helpers::*;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::sync::Arc;
use tempfile::TempDir;

fn write_records(path: &std::path::Path, records: &[bibjoin::RawRecord]) {
    let mut file = File::create(path).unwrap();
    for record in records {
        writeln!(file, "{}", serde_json::to_string(record).unwrap()).unwrap();
    }
}

#[test]
fn test_crawl_from_files_to_json_lines() {
    let temp_dir = TempDir::new().unwrap();
    let packages = temp_dir.path().join("packages.jsonl");
    let items = temp_dir.path().join("items.jsonl");
    let output = temp_dir.path().join("merged.jsonl");

    let (pkg_a, item_a) = scenario_a();
    let other = "21735794/v89i9/S002/main.xml";
    write_records(&packages, &[pkg_a, package_entry(other)]);
    write_records(&items, &[item_file(other), item_a]);

    let sink = Arc::new(JsonLinesSink::new(File::create(&output).unwrap()));
    let extractor = DeferredExtractor::new(&CorrelationConfig::default(), Arc::new(AlwaysPresent));
    let session = Arc::new(CrawlSession::new());
    let runner = CrawlRunner::new(Arc::new(extractor), Arc::clone(&session), sink.clone());

    for path in [&items, &packages] {
        let source = JsonLinesSource::open(path).unwrap();
        runner.run_sequential(source.map(Result::unwrap));
    }
    sink.flush().unwrap();

    let content = fs::read_to_string(&output).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);

    let scenario = lines
        .iter()
        .find(|v| v["item"]["key"]["itemPath"] == SCENARIO_ITEM)
        .unwrap();
    assert_eq!(scenario["item"]["key"]["archiveSetId"], SET);
    assert_eq!(scenario["record"]["doi"], "10.1/x");
    assert_eq!(scenario["record"]["articleTitle"], "Bar");
    assert_eq!(scenario["record"]["itemType"], "journalarticle");
    assert_eq!(scenario["record"]["publicationType"], "journal");
    assert!(session.pending().is_empty());
}

#[test]
fn test_malformed_lines_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("records.jsonl");

    let (pkg, item) = scenario_a();
    let mut file = File::create(&path).unwrap();
    writeln!(file, "{}", serde_json::to_string(&pkg).unwrap()).unwrap();
    writeln!(file, "{{\"kind\": \"somethingElse\"}}").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "{}", serde_json::to_string(&item).unwrap()).unwrap();
    drop(file);

    let mut source = JsonLinesSource::open(&path).unwrap();
    let records: Vec<_> = source.by_ref().map(Result::unwrap).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(source.skipped(), 1);

    let emitted = Harness::new().run(records);
    assert_eq!(emitted.len(), 1);
}

#[test]
fn test_listing_file_probe() {
    let temp_dir = TempDir::new().unwrap();
    let listing_path = temp_dir.path().join("listing.txt");
    fs::write(
        &listing_path,
        format!(
            "# members of archive-set {}\n{}\n",
            SET,
            item_origin("21735794/v89i9/S001/main.pdf")
        ),
    )
    .unwrap();

    let listing = KnownPaths::from_reader(BufReader::new(File::open(&listing_path).unwrap())).unwrap();
    assert_eq!(listing.len(), 1);

    let (pkg, item) = scenario_a();
    let harness = Harness::with_probe(&CorrelationConfig::default(), Arc::new(listing));
    let emitted = harness.run(vec![pkg, item]);
    assert_eq!(
        emitted[0].1.access_url.as_deref(),
        Some(item_origin("21735794/v89i9/S001/main.pdf").as_str())
    );
}
