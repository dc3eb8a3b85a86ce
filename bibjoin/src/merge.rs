// Merge & Classify
//
// Combines one package entry and one item record into a MergedRecord.
// Roles come from each record's kind tag, so merge(a, b) == merge(b, a).
//
// Algorithm:
// 1. Partition the pair into pkg and item
// 2. Take author, article title, access URL, date, volume, issue from item
// 3. Fill-if-better from pkg: doi, publication title, issn, then isbn,
//    volume, issue, date, author
// 4. Union raw fields, item keys win
// 5. Publisher/provider defaults
// 6. Classify (book dataset / book series / journal) and apply the
//    classification's fallbacks
//
// Every date candidate is validated before it takes part, so a malformed
// value counts as empty and the next source still gets its turn.

use crate::error::{CorrelateError, CorrelateResult};
use crate::types::{
    non_empty, raw_keys, FieldId, ItemType, MergedRecord, PublicationType, RawRecord, RecordKind,
};
use bibjoin_common::config::CorrelationConfig;
use chrono::{DateTime, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Static values applied during merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergePolicy {
    pub publisher: String,
    pub provider: String,
    pub book_family_prefix: String,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::from(&CorrelationConfig::default())
    }
}

impl From<&CorrelationConfig> for MergePolicy {
    fn from(config: &CorrelationConfig) -> Self {
        Self {
            publisher: config.publisher.clone(),
            provider: config.provider.clone(),
            book_family_prefix: config.book_family_prefix.clone(),
        }
    }
}

/// Outcome of the three-way type decision
///
/// Fully determined by two package signals: the `formatFamily` token and the
/// presence of an ISBN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Chapter of a book dataset
    Book,
    /// Chapter of a book series published through a journal dataset
    BookSeries { series_title: Option<String> },
    Journal,
}

impl Classification {
    pub fn classify(pkg: &RawRecord, book_family_prefix: &str) -> Self {
        let is_book_family = pkg
            .raw(raw_keys::FORMAT_FAMILY)
            .map_or(false, |family| family.starts_with(book_family_prefix));

        if is_book_family {
            Classification::Book
        } else if pkg.field(FieldId::Isbn).is_some() {
            Classification::BookSeries {
                series_title: pkg.field(FieldId::PublicationTitle).map(str::to_string),
            }
        } else {
            Classification::Journal
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            Classification::Book | Classification::BookSeries { .. } => ItemType::BookChapter,
            Classification::Journal => ItemType::JournalArticle,
        }
    }

    pub fn publication_type(&self) -> PublicationType {
        match self {
            Classification::Book => PublicationType::Book,
            Classification::BookSeries { .. } => PublicationType::BookSeries,
            Classification::Journal => PublicationType::Journal,
        }
    }
}

/// Set `slot` only when it is still empty
fn fill_if_better(slot: &mut Option<String>, value: Option<&str>) {
    let is_empty = slot.as_deref().map_or(true, |v| v.trim().is_empty());
    if is_empty {
        if let Some(value) = non_empty(value) {
            *slot = Some(value.to_string());
        }
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

/// Normalized date, or `None` when the value is absent or malformed
fn valid_date(value: Option<&str>, origin: &str) -> Option<String> {
    let value = non_empty(value)?;
    let normalized = normalize_date(value);
    if normalized.is_none() {
        warn!(date = %value, origin = %origin, "Malformed date, ignoring it");
    }
    normalized
}

/// Merge a correlated pair
pub fn merge(a: RawRecord, b: RawRecord, policy: &MergePolicy) -> CorrelateResult<MergedRecord> {
    let (pkg, item) = match (a.kind, b.kind) {
        (RecordKind::PackageLevel, RecordKind::ItemLevel) => (a, b),
        (RecordKind::ItemLevel, RecordKind::PackageLevel) => (b, a),
        (kind, _) => return Err(CorrelateError::InvalidPair(kind)),
    };

    let classification = Classification::classify(&pkg, &policy.book_family_prefix);
    let doc_heading = owned(pkg.raw(raw_keys::DOC_HEADING));

    // Authoritative item fields
    let mut author = owned(item.field(FieldId::Author));
    let mut article_title = owned(item.field(FieldId::ArticleTitle));
    let access_url = owned(item.field(FieldId::AccessUrl));
    let mut date = valid_date(item.field(FieldId::Date), &item.origin_path);
    let mut volume = owned(item.field(FieldId::Volume));
    let mut issue = owned(item.field(FieldId::Issue));

    // Package fill-if-better, in order
    let mut doi = None;
    let mut publication_title = None;
    let mut issn = None;
    let mut isbn = None;
    fill_if_better(&mut doi, pkg.field(FieldId::Doi));
    fill_if_better(&mut publication_title, pkg.field(FieldId::PublicationTitle));
    fill_if_better(&mut issn, pkg.field(FieldId::Issn));
    fill_if_better(&mut isbn, pkg.field(FieldId::Isbn));
    fill_if_better(&mut volume, pkg.field(FieldId::Volume));
    fill_if_better(&mut issue, pkg.field(FieldId::Issue));
    if date.is_none() {
        date = valid_date(pkg.field(FieldId::Date), &pkg.origin_path);
    }
    fill_if_better(&mut author, pkg.field(FieldId::Author));

    let mut raw: BTreeMap<String, String> = item.raw_fields;
    for (key, value) in pkg.raw_fields {
        raw.entry(key).or_insert(value);
    }

    let mut publisher = None;
    let mut provider = None;
    fill_if_better(&mut publisher, Some(policy.publisher.as_str()));
    fill_if_better(&mut provider, Some(policy.provider.as_str()));

    let mut series_title = None;
    match &classification {
        Classification::Book => {
            fill_if_better(&mut doi, raw.get(raw_keys::CHAPTER_DOI).map(String::as_str));
            if date.is_none() {
                let chapter_date = raw.get(raw_keys::CHAPTER_DATE).map(String::as_str);
                date = valid_date(chapter_date, &item.origin_path);
            }
        }
        Classification::BookSeries { series_title: title } => {
            series_title = title.clone();
        }
        Classification::Journal => {
            fill_if_better(&mut article_title, doc_heading.as_deref());
        }
    }

    debug!(
        origin = %item.origin_path,
        ?classification,
        doi = ?doi,
        "Merged package entry with item"
    );

    Ok(MergedRecord {
        doi,
        isbn,
        issn,
        publication_title,
        series_title,
        article_title,
        author,
        date,
        volume,
        issue,
        access_url,
        publisher,
        provider,
        item_type: classification.item_type(),
        publication_type: classification.publication_type(),
        raw,
    })
}

/// Validate a date value
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM`, `YYYY` and RFC 3339 timestamps (reduced to
/// their date). Returns `None` for anything else.
pub fn normalize_date(value: &str) -> Option<String> {
    let value = value.trim();
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    match value.len() {
        10 => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .map(|d| d.format("%Y-%m-%d").to_string()),
        7 => {
            let (year, month) = value.split_once('-')?;
            if !all_digits(year) || !all_digits(month) {
                return None;
            }
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
                .map(|_| value.to_string())
        }
        4 if all_digits(value) => Some(value.to_string()),
        _ => DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SchemaFamily;

    fn pkg() -> RawRecord {
        RawRecord::new(
            RecordKind::PackageLevel,
            SchemaFamily::Journal,
            "http://h/CLKS003A.tar!/CLKS003/dataset.xml",
        )
    }

    fn item() -> RawRecord {
        RawRecord::new(
            RecordKind::ItemLevel,
            SchemaFamily::Journal,
            "http://h/CLKS003B.tar!/CLKS003/01420615/v64sC/S1/main.xml",
        )
    }

    #[test]
    fn test_fill_if_better() {
        let mut slot = Some("kept".to_string());
        fill_if_better(&mut slot, Some("other"));
        assert_eq!(slot.as_deref(), Some("kept"));

        let mut slot = Some("  ".to_string());
        fill_if_better(&mut slot, Some("filled"));
        assert_eq!(slot.as_deref(), Some("filled"));

        let mut slot = None;
        fill_if_better(&mut slot, Some(" "));
        assert_eq!(slot, None);
    }

    #[test]
    fn test_same_kind_pair_rejected() {
        let result = merge(item(), item(), &MergePolicy::default());
        assert!(matches!(result, Err(CorrelateError::InvalidPair(RecordKind::ItemLevel))));
    }

    #[test]
    fn test_item_date_wins_over_package() {
        let p = pkg().with_field(FieldId::Date, "2014-01-01");
        let i = item().with_field(FieldId::Date, "2014-07-30");
        let merged = merge(p, i, &MergePolicy::default()).unwrap();
        assert_eq!(merged.date.as_deref(), Some("2014-07-30"));
    }

    #[test]
    fn test_raw_union_keeps_item_values() {
        let p = pkg().with_raw("shared", "pkg").with_raw("pkgOnly", "p");
        let i = item().with_raw("shared", "item");
        let merged = merge(p, i, &MergePolicy::default()).unwrap();
        assert_eq!(merged.raw.get("shared").map(String::as_str), Some("item"));
        assert_eq!(merged.raw.get("pkgOnly").map(String::as_str), Some("p"));
    }

    #[test]
    fn test_defaults_applied() {
        let policy = MergePolicy {
            publisher: "Academic Press".to_string(),
            provider: "Elsevier".to_string(),
            book_family_prefix: "BOOK".to_string(),
        };
        let merged = merge(pkg(), item(), &policy).unwrap();
        assert_eq!(merged.publisher.as_deref(), Some("Academic Press"));
        assert_eq!(merged.provider.as_deref(), Some("Elsevier"));
    }

    #[test]
    fn test_book_fallbacks_from_raw() {
        let p = pkg()
            .with_raw(raw_keys::FORMAT_FAMILY, "BOOKCHAPTER")
            .with_field(FieldId::PublicationTitle, "Handbook");
        let i = item()
            .with_raw(raw_keys::CHAPTER_DOI, "10.1016/B978-0-85700-000-0.50027-3")
            .with_raw(raw_keys::CHAPTER_DATE, "2014-01-28");
        let merged = merge(p, i, &MergePolicy::default()).unwrap();
        assert_eq!(merged.doi.as_deref(), Some("10.1016/B978-0-85700-000-0.50027-3"));
        assert_eq!(merged.date.as_deref(), Some("2014-01-28"));
        assert_eq!(merged.series_title, None);
    }

    #[test]
    fn test_journal_title_falls_back_to_doc_heading() {
        let p = pkg().with_raw(raw_keys::DOC_HEADING, "Newsdesk Simple Dochead");
        let merged = merge(p, item(), &MergePolicy::default()).unwrap();
        assert_eq!(merged.article_title.as_deref(), Some("Newsdesk Simple Dochead"));
    }

    #[test]
    fn test_malformed_date_left_empty() {
        let i = item().with_field(FieldId::Date, "30/07/2014");
        let merged = merge(pkg(), i, &MergePolicy::default()).unwrap();
        assert_eq!(merged.date, None);
    }

    #[test]
    fn test_malformed_item_date_falls_back_to_package() {
        let p = pkg().with_field(FieldId::Date, "2014-01");
        let i = item().with_field(FieldId::Date, "30/07/2014");
        let merged = merge(p, i, &MergePolicy::default()).unwrap();
        assert_eq!(merged.date.as_deref(), Some("2014-01"));
    }

    #[test]
    fn test_malformed_dates_fall_back_to_chapter_date() {
        let p = pkg()
            .with_raw(raw_keys::FORMAT_FAMILY, "BOOKCHAPTER")
            .with_field(FieldId::Date, "sometime");
        let i = item()
            .with_field(FieldId::Date, "30/07/2014")
            .with_raw(raw_keys::CHAPTER_DATE, "2014-01-28");
        let merged = merge(i, p, &MergePolicy::default()).unwrap();
        assert_eq!(merged.date.as_deref(), Some("2014-01-28"));
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("2014-07-30").as_deref(), Some("2014-07-30"));
        assert_eq!(normalize_date(" 2014-07 ").as_deref(), Some("2014-07"));
        assert_eq!(normalize_date("2014").as_deref(), Some("2014"));
        assert_eq!(
            normalize_date("2014-09-01T10:00:00Z").as_deref(),
            Some("2014-09-01")
        );
        assert_eq!(normalize_date("2014-13-01"), None);
        assert_eq!(normalize_date("2014-02-30"), None);
        assert_eq!(normalize_date("2014-13"), None);
        assert_eq!(normalize_date("July 2014"), None);
        assert_eq!(normalize_date(""), None);
    }
}
