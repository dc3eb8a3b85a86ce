// Shared Types and Data Contracts
//
// Records coming in from the extraction layer, the join key between the two
// halves, and the merged record handed to downstream sinks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Input Records
// ============================================================================

/// Which side of the correlation a record belongs to
///
/// Selected once per source file: a package descriptor lists many items, an
/// item file describes exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    PackageLevel,
    ItemLevel,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::PackageLevel => write!(f, "package-level"),
            RecordKind::ItemLevel => write!(f, "item-level"),
        }
    }
}

/// Schema family of the dataset a record was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaFamily {
    Journal,
    Book,
}

impl SchemaFamily {
    /// Raw field carrying a package entry's item-relative path
    pub fn item_path_field(self) -> &'static str {
        match self {
            SchemaFamily::Journal => raw_keys::JOURNAL_ITEM_PATH,
            SchemaFamily::Book => raw_keys::BOOK_ITEM_PATH,
        }
    }
}

/// Cooked metadata fields shared by both record kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    Doi,
    Isbn,
    Issn,
    PublicationTitle,
    ArticleTitle,
    Author,
    Date,
    Volume,
    Issue,
    AccessUrl,
}

/// Raw (uncooked) field names the engine reads
pub mod raw_keys {
    /// Package: dataset format, e.g. `BOOKCHAPTER` or `JOURNALBOOKSERIES`
    pub const FORMAT_FAMILY: &str = "formatFamily";
    /// Package: document heading, article title of last resort
    pub const DOC_HEADING: &str = "docHeading";
    /// Book chapter DOI, used when the package carries none
    pub const CHAPTER_DOI: &str = "chapterDoi";
    /// Book chapter date, used when neither half carries one
    pub const CHAPTER_DATE: &str = "chapterDate";
    /// Journal dataset entry: item-relative path of the item file
    pub const JOURNAL_ITEM_PATH: &str = "journalItemPath";
    /// Book dataset entry: item-relative path of the item file
    pub const BOOK_ITEM_PATH: &str = "bookItemPath";
}

/// A partially populated record produced by the extraction layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub kind: RecordKind,
    pub family: SchemaFamily,
    /// Locates one physical file within one archive-set
    pub origin_path: String,
    #[serde(default)]
    pub fields: BTreeMap<FieldId, String>,
    #[serde(default)]
    pub raw_fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new(kind: RecordKind, family: SchemaFamily, origin_path: impl Into<String>) -> Self {
        Self {
            kind,
            family,
            origin_path: origin_path.into(),
            fields: BTreeMap::new(),
            raw_fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, id: FieldId, value: impl Into<String>) -> Self {
        self.fields.insert(id, value.into());
        self
    }

    pub fn with_raw(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.raw_fields.insert(key.into(), value.into());
        self
    }

    /// Trimmed field value; whitespace-only counts as absent
    pub fn field(&self, id: FieldId) -> Option<&str> {
        non_empty(self.fields.get(&id).map(String::as_str))
    }

    /// Trimmed raw value; whitespace-only counts as absent
    pub fn raw(&self, key: &str) -> Option<&str> {
        non_empty(self.raw_fields.get(key).map(String::as_str))
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// Correlation
// ============================================================================

/// Join key between a package entry and an item file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationKey {
    pub archive_set_id: String,
    pub item_path: String,
}

impl CorrelationKey {
    pub fn new(archive_set_id: impl Into<String>, item_path: impl Into<String>) -> Self {
        Self {
            archive_set_id: archive_set_id.into(),
            item_path: item_path.into(),
        }
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.archive_set_id, self.item_path)
    }
}

/// Identifies the item-level file a merged record was built for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemHandle {
    pub key: CorrelationKey,
    pub origin_path: String,
}

// ============================================================================
// Output Records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    BookChapter,
    JournalArticle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationType {
    Book,
    BookSeries,
    Journal,
}

/// One finished bibliographic record per correlated item
///
/// This is the stable output schema handed to downstream sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRecord {
    pub doi: Option<String>,
    pub isbn: Option<String>,
    pub issn: Option<String>,
    pub publication_title: Option<String>,
    pub series_title: Option<String>,
    pub article_title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub access_url: Option<String>,
    pub publisher: Option<String>,
    pub provider: Option<String>,
    pub item_type: ItemType,
    pub publication_type: PublicationType,
    #[serde(default)]
    pub raw: BTreeMap<String, String>,
}
