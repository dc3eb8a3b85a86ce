//! Content existence probe
//!
//! The engine never touches archives itself. Whether an item's full-text
//! sibling exists is answered by whoever owns the archive listing.

use std::collections::HashSet;
use std::io::BufRead;

/// "Does a candidate file exist at path P"
pub trait ContentProbe: Send + Sync {
    fn exists(&self, path: &str) -> bool;
}

/// Treats every candidate as present
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPresent;

impl ContentProbe for AlwaysPresent {
    fn exists(&self, _path: &str) -> bool {
        true
    }
}

/// Treats every candidate as missing
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverPresent;

impl ContentProbe for NeverPresent {
    fn exists(&self, _path: &str) -> bool {
        false
    }
}

/// Answers from a fixed listing of archive members
#[derive(Debug, Clone, Default)]
pub struct KnownPaths {
    paths: HashSet<String>,
}

impl KnownPaths {
    /// One path per line; blank lines and `#` comments are ignored
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut paths = HashSet::new();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            paths.insert(line.to_string());
        }
        Ok(Self { paths })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KnownPaths {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl ContentProbe for KnownPaths {
    fn exists(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

impl<F> ContentProbe for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn exists(&self, path: &str) -> bool {
        self(path)
    }
}

/// Sibling of `origin_path` named `file_name` (same directory)
pub fn sibling_path(origin_path: &str, file_name: &str) -> Option<String> {
    let (dir, _) = origin_path.rsplit_once('/')?;
    Some(format!("{}/{}", dir, file_name))
}
