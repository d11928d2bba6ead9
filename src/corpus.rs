//! Loading the dataset corpus.
//!
//! The corpus is a JSON document `{"datasets": [{"dataset_id": .., "download": [..]}]}`.
//! Real dumps contain raw control characters inside string values, which
//! strict JSON rejects, so they are escaped before deserialization.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while loading the corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The corpus file could not be read.
    #[error("failed to read corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The corpus is not the expected JSON shape.
    #[error("invalid corpus {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CorpusError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One dataset record: its identifier and the URLs to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Dataset {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub dataset_id: u64,
    #[serde(default)]
    pub download: Vec<String>,
}

#[derive(Deserialize)]
struct RawCorpus {
    datasets: Vec<Dataset>,
}

/// Datasets keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    datasets: BTreeMap<u64, Dataset>,
}

impl Corpus {
    /// Looks up one dataset.
    #[must_use]
    pub fn get(&self, dataset_id: u64) -> Option<&Dataset> {
        self.datasets.get(&dataset_id)
    }

    /// Datasets whose identifier falls in `range`, in ascending order.
    pub fn in_range(&self, range: RangeInclusive<u64>) -> impl Iterator<Item = &Dataset> {
        self.datasets.range(range).map(|(_, dataset)| dataset)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl FromIterator<Dataset> for Corpus {
    fn from_iter<I: IntoIterator<Item = Dataset>>(iter: I) -> Self {
        let datasets = iter
            .into_iter()
            .map(|dataset| (dataset.dataset_id, dataset))
            .collect();
        Self { datasets }
    }
}

/// Reads and parses the corpus file.
///
/// Later records with a duplicate identifier replace earlier ones.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid corpus.
pub fn load_corpus(path: &Path) -> Result<Corpus, CorpusError> {
    let raw = std::fs::read_to_string(path).map_err(|e| CorpusError::io(path, e))?;
    let corpus = parse_corpus(&raw).map_err(|e| CorpusError::json(path, e))?;
    info!(path = %path.display(), datasets = corpus.len(), "corpus loaded");
    Ok(corpus)
}

fn parse_corpus(raw: &str) -> Result<Corpus, serde_json::Error> {
    let escaped = escape_control_chars(raw);
    let parsed: RawCorpus = serde_json::from_str(&escaped)?;
    debug!(records = parsed.datasets.len(), "corpus records parsed");
    Ok(parsed.datasets.into_iter().collect())
}

/// Escapes raw control characters that appear inside JSON strings.
fn escape_control_chars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in raw.chars() {
        if !in_string {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
            continue;
        }
        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }
        match ch {
            '\\' => {
                escaped = true;
                out.push(ch);
            }
            '"' => {
                in_string = false;
                out.push(ch);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if u32::from(c) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid dataset_id: {text:?}"))),
    }
}
