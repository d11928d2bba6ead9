//! Row and statistics types persisted by the pipeline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::download::{DownloadOutcome, PLACEHOLDER};
use crate::files::UNKNOWN_TYPE;

/// A row type of a `;`-separated results table.
pub trait CsvRow: Serialize {
    /// Column names, in field order.
    const HEADER: &'static [&'static str];
}

/// One row of `download_infos_<signature>.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub dataset_id: u64,
    pub linkname: String,
    pub link: String,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub filename: String,
    pub filetype: String,
}

impl CsvRow for DownloadRecord {
    const HEADER: &'static [&'static str] = &[
        "dataset_id",
        "linkname",
        "link",
        "code",
        "type",
        "filename",
        "filetype",
    ];
}

impl DownloadRecord {
    /// Row for a link rejected by extension before any download.
    #[must_use]
    pub fn discarded(dataset_id: u64, linkname: String, link: String) -> Self {
        Self {
            dataset_id,
            linkname,
            link,
            code: PLACEHOLDER.to_string(),
            kind: "format".to_string(),
            filename: PLACEHOLDER.to_string(),
            filetype: PLACEHOLDER.to_string(),
        }
    }

    /// Row for a classified download attempt.
    ///
    /// `filename` is the saved file relative to the dataset folder, or the
    /// placeholder when nothing was saved.
    #[must_use]
    pub fn from_outcome(
        dataset_id: u64,
        linkname: String,
        link: String,
        outcome: &DownloadOutcome,
        filename: String,
    ) -> Self {
        Self {
            dataset_id,
            linkname,
            link,
            code: outcome.code().to_string(),
            kind: outcome.type_label().to_string(),
            filename,
            filetype: outcome.file_type().to_string(),
        }
    }
}

/// One row of `parsing_infos_<signature>.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseRecord {
    pub dataset_id: u64,
    pub filename: String,
    pub file: String,
    pub filetype: String,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub classes: usize,
    pub properties: usize,
    pub entities: usize,
    pub literals: usize,
}

impl CsvRow for ParseRecord {
    const HEADER: &'static [&'static str] = &[
        "dataset_id",
        "filename",
        "file",
        "filetype",
        "code",
        "type",
        "classes",
        "properties",
        "entities",
        "literals",
    ];
}

impl ParseRecord {
    /// Row for a file that was not parsed, with zero counts.
    #[must_use]
    pub fn rejected(
        dataset_id: u64,
        filename: String,
        file: String,
        filetype: String,
        code: &str,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            dataset_id,
            filename,
            file,
            filetype,
            code: code.to_string(),
            kind: kind.into(),
            classes: 0,
            properties: 0,
            entities: 0,
            literals: 0,
        }
    }
}

/// Per-dataset counters of the download phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadStats {
    pub number_of_links: usize,
    pub downloaded_links: usize,
    pub exception_links: usize,
}

/// Per-dataset counters of the parse phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub number_of_links: usize,
    pub parsed_files: usize,
    pub exception_files: usize,
}

/// Declared content type of each downloaded file, keyed by dataset and filename.
#[derive(Debug, Clone, Default)]
pub struct DeclaredTypes {
    types: HashMap<(u64, String), String>,
}

impl DeclaredTypes {
    /// Records a declared type.
    pub fn insert(&mut self, dataset_id: u64, filename: impl Into<String>, filetype: impl Into<String>) {
        self.types.insert((dataset_id, filename.into()), filetype.into());
    }

    /// Declared type of a file, or `unknown` if the download phase never saw it.
    #[must_use]
    pub fn get(&self, dataset_id: u64, filename: &str) -> &str {
        self.types
            .get(&(dataset_id, filename.to_string()))
            .map_or(UNKNOWN_TYPE, String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl<'a> FromIterator<&'a DownloadRecord> for DeclaredTypes {
    fn from_iter<I: IntoIterator<Item = &'a DownloadRecord>>(iter: I) -> Self {
        let mut declared = Self::default();
        for record in iter.into_iter().filter(|r| r.filename != PLACEHOLDER) {
            declared.insert(record.dataset_id, record.filename.clone(), record.filetype.clone());
        }
        declared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(dataset_id: u64, filename: &str, filetype: &str) -> DownloadRecord {
        DownloadRecord {
            dataset_id,
            linkname: "link_1".to_string(),
            link: "http://a.org/x".to_string(),
            code: "200".to_string(),
            kind: "OK".to_string(),
            filename: filename.to_string(),
            filetype: filetype.to_string(),
        }
    }

    #[test]
    fn test_declared_types_lookup() {
        let records = [
            record(1, "x.ttl", "[text/turtle]"),
            record(1, PLACEHOLDER, PLACEHOLDER),
            record(2, "x.ttl", "[application/gzip]"),
        ];
        let declared: DeclaredTypes = records.iter().collect();

        assert_eq!(declared.len(), 2);
        assert_eq!(declared.get(1, "x.ttl"), "[text/turtle]");
        assert_eq!(declared.get(2, "x.ttl"), "[application/gzip]");
        assert_eq!(declared.get(1, "bundle/member.ttl"), UNKNOWN_TYPE);
    }

    #[test]
    fn test_discarded_row_uses_placeholders() {
        let row = DownloadRecord::discarded(3, "link_1".to_string(), "http://a.org/p.html".to_string());
        assert_eq!(row.code, PLACEHOLDER);
        assert_eq!(row.kind, "format");
        assert_eq!(row.filename, PLACEHOLDER);
        assert_eq!(row.filetype, PLACEHOLDER);
    }

    #[test]
    fn test_download_stats_json_field_names() {
        let stats = DownloadStats {
            number_of_links: 3,
            downloaded_links: 2,
            exception_links: 1,
        };
        let json = serde_json::to_value(stats).expect("serialize");
        assert_eq!(json["number_of_links"], 3);
        assert_eq!(json["downloaded_links"], 2);
        assert_eq!(json["exception_links"], 1);
    }

    #[test]
    fn test_header_matches_field_count() {
        assert_eq!(DownloadRecord::HEADER.len(), 7);
        assert_eq!(ParseRecord::HEADER.len(), 10);
    }
}
