//! Test Helper Utilities
//!
//! Record fixtures and a small crawl harness shared by the integration tests

#![allow(dead_code)]

use bibjoin::probe::{AlwaysPresent, ContentProbe};
use bibjoin::runner::CrawlRunner;
use bibjoin::sink::CollectingSink;
use bibjoin::types::raw_keys;
use bibjoin::{
    CrawlSession, DeferredExtractor, FieldId, ItemHandle, MergedRecord, RawRecord, RecordKind,
    SchemaFamily,
};
use bibjoin_common::config::CorrelationConfig;
use std::sync::Arc;

pub const SET: &str = "0003";
pub const PREFIX: &str = "http://www.source.org/2014";

/// Origin path of the package descriptor of archive-set `SET`
pub fn descriptor_origin() -> String {
    format!("{}/{}A.tar!/{}/dataset.xml", PREFIX, SET, SET)
}

/// Origin path of an item file, stored in part `B`
pub fn item_origin(item_path: &str) -> String {
    format!("{}/{}B.tar!/{}/{}", PREFIX, SET, SET, item_path)
}

/// Journal package entry naming `item_path`
pub fn package_entry(item_path: &str) -> RawRecord {
    RawRecord::new(
        RecordKind::PackageLevel,
        SchemaFamily::Journal,
        descriptor_origin(),
    )
    .with_raw(raw_keys::JOURNAL_ITEM_PATH, item_path)
}

pub fn item_file(item_path: &str) -> RawRecord {
    RawRecord::new(
        RecordKind::ItemLevel,
        SchemaFamily::Journal,
        item_origin(item_path),
    )
}

pub const SCENARIO_ITEM: &str = "21735794/v89i9/S001/main.xml";

/// Journal article pair: package `doi` and title, item `articleTitle` and author
pub fn scenario_a() -> (RawRecord, RawRecord) {
    let pkg = package_entry(SCENARIO_ITEM)
        .with_field(FieldId::Doi, "10.1/x")
        .with_field(FieldId::PublicationTitle, "Foo Journal")
        .with_field(FieldId::Isbn, "");
    let item = item_file(SCENARIO_ITEM)
        .with_field(FieldId::ArticleTitle, "Bar")
        .with_field(FieldId::Author, "Smith, J");
    (pkg, item)
}

/// Book series chapter published in a journal dataset
pub fn scenario_b() -> (RawRecord, RawRecord) {
    let (pkg, item) = scenario_a();
    let pkg = pkg
        .with_field(FieldId::Isbn, "9781234567890")
        .with_raw(raw_keys::FORMAT_FAMILY, "JOURNALBOOKSERIES");
    (pkg, item)
}

/// Book dataset chapter with the given isbn
pub fn scenario_c(isbn: &str) -> (RawRecord, RawRecord) {
    let (pkg, item) = scenario_a();
    let pkg = pkg
        .with_field(FieldId::Isbn, isbn)
        .with_raw(raw_keys::FORMAT_FAMILY, "BOOKCHAPTER");
    (pkg, item)
}

pub struct Harness {
    pub runner: CrawlRunner,
    pub session: Arc<CrawlSession>,
    pub sink: Arc<CollectingSink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_probe(&CorrelationConfig::default(), Arc::new(AlwaysPresent))
    }

    pub fn with_probe(config: &CorrelationConfig, probe: Arc<dyn ContentProbe>) -> Self {
        let session = Arc::new(CrawlSession::new());
        let sink = Arc::new(CollectingSink::new());
        let extractor = Arc::new(DeferredExtractor::new(config, probe));
        let runner = CrawlRunner::new(extractor, Arc::clone(&session), sink.clone());
        Self {
            runner,
            session,
            sink,
        }
    }

    /// Run `records` in order and return what was emitted
    pub fn run(&self, records: Vec<RawRecord>) -> Vec<(ItemHandle, MergedRecord)> {
        self.runner.run_sequential(records);
        self.sink.emitted()
    }
}

/// Both arrival orders of a pair
pub fn both_orders(pkg: RawRecord, item: RawRecord) -> [Vec<RawRecord>; 2] {
    [vec![pkg.clone(), item.clone()], vec![item, pkg]]
}
