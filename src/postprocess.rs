//! Post-processing of a finished run: indexable content, empty-dataset
//! report and download inventory.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::corpus::Corpus;
use crate::files::list_files;
use crate::output::{CsvRow, OutputError, OutputLayout, read_json, write_csv, write_json};
use crate::rdf::ContentBundle;

const BYTES_PER_MB: f64 = 1_048_576.0;

/// One whitespace-joined document per category, ready for a search index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexableContent {
    pub classes: String,
    pub properties: String,
    pub entities: String,
    pub literals: String,
}

impl From<&ContentBundle> for IndexableContent {
    fn from(content: &ContentBundle) -> Self {
        Self {
            classes: content.classes.join(" "),
            properties: content.properties.join(" "),
            entities: content.entities.join(" "),
            literals: content.literals.join(" "),
        }
    }
}

/// One row of `files_dimension.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDimension {
    pub dataset_id: u64,
    pub file: String,
    /// Size in MB.
    pub dimensions: f64,
}

impl CsvRow for FileDimension {
    const HEADER: &'static [&'static str] = &["dataset_id", "file", "dimensions"];
}

/// Summary of [`build_index`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Datasets whose content was turned into indexable documents.
    pub indexed: usize,
    /// Datasets with no content in any category.
    pub empty: Vec<u64>,
}

/// Summary of [`build_inventory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryReport {
    pub datasets: usize,
    pub files: usize,
}

/// Writes indexable content for each parsed dataset and the empty-dataset report.
///
/// Datasets without a content file are skipped.
///
/// # Errors
///
/// Returns an error if a content file is malformed or an output cannot be written.
#[instrument(skip(layout, corpus))]
pub fn build_index(
    layout: &OutputLayout,
    corpus: &Corpus,
    range: RangeInclusive<u64>,
) -> Result<IndexReport, OutputError> {
    let mut report = IndexReport::default();
    let mut empty_datasets: BTreeMap<u64, u8> = BTreeMap::new();

    for dataset in corpus.in_range(range) {
        let dataset_id = dataset.dataset_id;
        let source = layout.dataset_content(dataset_id);
        if !source.is_file() {
            debug!(dataset_id, "no content file, skipping");
            continue;
        }

        let content: ContentBundle = read_json(&source)?;
        if content.is_empty() {
            info!(dataset_id, "dataset has no content available");
            empty_datasets.insert(dataset_id, 1);
            report.empty.push(dataset_id);
        }
        write_json(
            &layout.indexable_content(dataset_id),
            &IndexableContent::from(&content),
        )?;
        report.indexed += 1;
    }

    write_json(&layout.empty_datasets(), &empty_datasets)?;
    info!(
        indexed = report.indexed,
        empty = report.empty.len(),
        "indexable content written"
    );
    Ok(report)
}

/// Counts the downloaded files of each dataset and records their sizes.
///
/// # Errors
///
/// Returns an error if a download folder cannot be listed or an output cannot
/// be written.
#[instrument(skip(layout, corpus))]
pub fn build_inventory(
    layout: &OutputLayout,
    corpus: &Corpus,
    range: RangeInclusive<u64>,
) -> Result<InventoryReport, OutputError> {
    let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
    let mut dimensions = Vec::new();

    for dataset in corpus.in_range(range) {
        let dataset_id = dataset.dataset_id;
        let dir = layout.dataset_download_dir(dataset_id);
        if !dir.is_dir() {
            warn!(dataset_id, "no download folder");
            continue;
        }

        let files = list_files(&dir).map_err(|e| OutputError::io(&dir, e))?;
        counts.insert(dataset_id, files.len());
        for file in files {
            let path = dir.join(&file);
            let size = std::fs::metadata(&path)
                .map_err(|e| OutputError::io(&path, e))?
                .len();
            dimensions.push(FileDimension {
                dataset_id,
                file,
                dimensions: size_in_mb(size),
            });
        }
    }

    write_json(&layout.downloaded_files_count(), &counts)?;
    write_csv(&layout.files_dimension(), &dimensions)?;

    let report = InventoryReport {
        datasets: counts.len(),
        files: dimensions.len(),
    };
    info!(datasets = report.datasets, files = report.files, "inventory written");
    Ok(report)
}

#[allow(clippy::cast_precision_loss)]
fn size_in_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Dataset;

    fn corpus_of(ids: &[u64]) -> Corpus {
        ids.iter()
            .map(|&dataset_id| Dataset {
                dataset_id,
                download: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_indexable_content_joins_with_spaces() {
        let content = ContentBundle {
            classes: vec!["http://ex.org/A".to_string(), "http://ex.org/B".to_string()],
            literals: vec!["x".to_string()],
            ..ContentBundle::default()
        };
        let indexable = IndexableContent::from(&content);
        assert_eq!(indexable.classes, "http://ex.org/A http://ex.org/B");
        assert_eq!(indexable.literals, "x");
        assert!(indexable.properties.is_empty());
    }

    #[test]
    fn test_build_index_reports_empty_datasets() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let layout = OutputLayout::new(temp.path());
        let full = ContentBundle {
            entities: vec!["http://ex.org/e".to_string()],
            ..ContentBundle::default()
        };
        write_json(&layout.dataset_content(1), &full).expect("write content 1");
        write_json(&layout.dataset_content(2), &ContentBundle::default()).expect("write content 2");

        let report = build_index(&layout, &corpus_of(&[1, 2, 3]), 1..=3).expect("index");

        assert_eq!(report.indexed, 2);
        assert_eq!(report.empty, vec![2]);
        let empty: BTreeMap<String, u8> = read_json(&layout.empty_datasets()).expect("report");
        assert_eq!(empty.get("2"), Some(&1));
        let indexable: IndexableContent =
            read_json(&layout.indexable_content(1)).expect("indexable 1");
        assert_eq!(indexable.entities, "http://ex.org/e");
    }

    #[test]
    fn test_build_inventory_counts_and_sizes() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let layout = OutputLayout::new(temp.path());
        let dir = layout.dataset_download_dir(4);
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join("a.ttl"), vec![b'x'; 1_048_576]).expect("write a");
        std::fs::write(dir.join(".DS_Store"), b"junk").expect("write housekeeping");

        let report = build_inventory(&layout, &corpus_of(&[4, 5]), 1..=10).expect("inventory");

        assert_eq!(report, InventoryReport { datasets: 1, files: 1 });
        let counts: BTreeMap<String, usize> =
            read_json(&layout.downloaded_files_count()).expect("counts");
        assert_eq!(counts.get("4"), Some(&1));
        let table = std::fs::read_to_string(layout.files_dimension()).expect("table");
        assert!(table.starts_with("dataset_id;file;dimensions"));
        assert!(table.contains("4;a.ttl;1"));
    }
}
