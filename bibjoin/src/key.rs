//! Correlation Key Derivation
//!
//! Origin paths look like
//! `<prefix>/<setNumber><letter>.<archiveExt>!/<setNumber>/<rest>`, for example
//! `http://host/2014/CLKS003A.tar!/CLKS003/01420615/v64sC/S0142061514004608/main.xml`.
//! The part letter (`A`, `B`, ...) is dropped: items of one archive-set
//! correlate no matter which physical part holds them.

use crate::error::{CorrelateError, CorrelateResult};
use crate::types::{CorrelationKey, RawRecord, RecordKind};

const MEMBER_SEPARATOR: &str = "!/";

/// Components of a parsed origin path, borrowed from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginPath<'a> {
    /// Everything before the archive file name, without trailing `/`
    pub prefix: &'a str,
    pub set_number: &'a str,
    pub part_letter: char,
    pub archive_ext: &'a str,
    /// Member path below `<setNumber>/`
    pub rest: &'a str,
}

impl<'a> OriginPath<'a> {
    pub fn parse(path: &'a str) -> CorrelateResult<Self> {
        let separators = path.matches(MEMBER_SEPARATOR).count();
        if separators != 1 {
            return Err(CorrelateError::unparsable(
                path,
                format!("expected one archive member separator, found {}", separators),
            ));
        }
        let (archive, member) = path
            .split_once(MEMBER_SEPARATOR)
            .ok_or_else(|| CorrelateError::unparsable(path, "missing archive member separator"))?;

        let (prefix, archive_name) = match archive.rsplit_once('/') {
            Some((prefix, name)) => (prefix, name),
            None => ("", archive),
        };
        // set numbers never contain dots; `.tar.gz` stays one extension
        let (stem, archive_ext) = archive_name
            .split_once('.')
            .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
            .ok_or_else(|| {
                CorrelateError::unparsable(path, format!("archive name {:?} has no extension", archive_name))
            })?;

        let part_letter = stem
            .chars()
            .last()
            .filter(char::is_ascii_uppercase)
            .ok_or_else(|| {
                CorrelateError::unparsable(path, format!("archive stem {:?} lacks a part letter", stem))
            })?;
        let set_number = &stem[..stem.len() - part_letter.len_utf8()];
        if set_number.is_empty() {
            return Err(CorrelateError::unparsable(path, "empty set number"));
        }

        let rest = member
            .strip_prefix(set_number)
            .and_then(|m| m.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| {
                CorrelateError::unparsable(
                    path,
                    format!("member path does not start with {}/", set_number),
                )
            })?;

        Ok(Self {
            prefix,
            set_number,
            part_letter,
            archive_ext,
            rest,
        })
    }
}

impl RecordKind {
    /// Item-relative path the key is built from
    ///
    /// Item files are their own item; package entries name their item in a
    /// raw field whose name depends on the schema family.
    fn item_path(self, origin: &OriginPath<'_>, record: &RawRecord) -> CorrelateResult<String> {
        match self {
            RecordKind::ItemLevel => {
                let segments: Vec<&str> = origin.rest.split('/').collect();
                if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
                    return Err(CorrelateError::unparsable(
                        &record.origin_path,
                        format!("item path {:?} needs a directory and a file name", origin.rest),
                    ));
                }
                Ok(origin.rest.to_string())
            }
            RecordKind::PackageLevel => {
                let field = record.family.item_path_field();
                let entry_path = record
                    .raw(field)
                    .map(normalize_entry_path)
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| CorrelateError::MissingItemPath {
                        path: record.origin_path.clone(),
                        field,
                    })?;
                Ok(entry_path.to_string())
            }
        }
    }
}

fn normalize_entry_path(path: &str) -> &str {
    let mut path = path.trim();
    loop {
        if let Some(stripped) = path.strip_prefix("./") {
            path = stripped;
        } else if let Some(stripped) = path.strip_prefix('/') {
            path = stripped;
        } else {
            return path;
        }
    }
}

/// Derive the correlation key for one record
pub fn derive_key(record: &RawRecord) -> CorrelateResult<CorrelationKey> {
    let origin = OriginPath::parse(&record.origin_path)?;
    let item_path = record.kind.item_path(&origin, record)?;
    Ok(CorrelationKey::new(origin.set_number, item_path))
}

/// Volume and issue encoded in a journal item path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeIssue {
    pub volume: String,
    pub issue: Option<String>,
}

/// Parse the `v<volume>[i<issue>][s<supplement>]` segment of an item path
///
/// The segment is the second one (`<collectionId>/<volumeIssue>/...`). The
/// issue falls back to the supplement when there is no `i` part, so `v64sC`
/// is volume 64 issue C.
pub fn volume_issue(item_path: &str) -> Option<VolumeIssue> {
    let segment = item_path.split('/').nth(1)?;
    let body = segment.strip_prefix('v')?;

    let volume_len = body
        .find(|c: char| !(c.is_ascii_digit() || c == '-'))
        .unwrap_or(body.len());
    let volume = &body[..volume_len];
    if volume.is_empty() || !volume.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let mut remainder = &body[volume_len..];
    let mut issue = None;
    let mut supplement = None;

    if let Some(after) = remainder.strip_prefix('i') {
        let end = after.find('s').unwrap_or(after.len());
        issue = Some(&after[..end]);
        remainder = &after[end..];
    }
    if let Some(after) = remainder.strip_prefix('s') {
        supplement = Some(after);
        remainder = "";
    }
    if !remainder.is_empty() {
        return None;
    }

    let issue = issue
        .filter(|i| !i.is_empty())
        .or(supplement.filter(|s| !s.is_empty()))
        .map(str::to_string);
    Some(VolumeIssue {
        volume: volume.to_string(),
        issue,
    })
}
