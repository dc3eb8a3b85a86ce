//! JSON-lines record source
//!
//! One serialized [`RawRecord`] per line, as produced by the extraction
//! layer. Blank lines are ignored. A line that does not deserialize is logged
//! and skipped; only I/O failures end the stream with an error.

use crate::types::RawRecord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Read failed in {label} at line {line}: {source}")]
    Read {
        label: String,
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

pub struct JsonLinesSource<R: BufRead> {
    reader: R,
    label: String,
    line_no: usize,
    skipped: usize,
    failed: bool,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
            line_no: 0,
            skipped: 0,
            failed: false,
        }
    }

    /// Lines dropped because they were not valid records
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for JsonLinesSource<R> {
    type Item = Result<RawRecord, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let mut line = String::new();
        loop {
            line.clear();
            self.line_no += 1;
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(source) => {
                    self.failed = true;
                    return Some(Err(SourceError::Read {
                        label: self.label.clone(),
                        line: self.line_no,
                        source,
                    }));
                }
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawRecord>(trimmed) {
                Ok(record) => return Some(Ok(record)),
                Err(e) => {
                    self.skipped += 1;
                    warn!(
                        source = %self.label,
                        line = self.line_no,
                        error = %e,
                        "Skipping malformed record line"
                    );
                }
            }
        }
    }
}
