//! Dataset pipeline orchestration.
//!
//! A [`Harvester`] walks the datasets of a corpus in identifier order and runs
//! the download phase, the parse phase, or both. Everything a run accumulates
//! (result rows, per-dataset statistics, the link to filename mapping) lives in
//! an explicit [`RunContext`] that the caller owns and passes to each phase, so
//! a `full` run can hand the download results straight to the parse phase.
//!
//! Per-item failures (ineligible links, remote errors, unparsable files,
//! inconsistent archives) are recorded as rows and counted; only run-level I/O
//! failures abort a phase.

mod download;
mod parse;

pub use parse::load_declared_types;

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::download::{DownloadError, DownloadTool};
use crate::output::{
    DeclaredTypes, DownloadRecord, DownloadStats, OutputError, OutputLayout, ParseRecord,
    ParseStats,
};
use crate::rdf::DEFAULT_MAX_ITEMS;

/// First dataset identifier processed by default.
pub const DEFAULT_START_ID: u64 = 1;

/// Last dataset identifier processed by default.
pub const DEFAULT_END_ID: u64 = 89_218;

/// Files above this size (in MB) are not parsed.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 150;

/// Files parsed per dataset.
pub const DEFAULT_MAX_FILES_PER_DATASET: usize = 100;

const BYTES_PER_MB: u64 = 1_048_576;

/// Errors that abort a pipeline phase.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The download tool could not be run.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// A run artifact could not be read or written.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// A dataset directory could not be prepared or listed.
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Builds the run signature `<start>_<end>_<yymmddHHMM>`.
#[must_use]
pub fn run_signature(start_id: u64, end_id: u64, started_at: NaiveDateTime) -> String {
    format!("{start_id}_{end_id}_{}", started_at.format("%y%m%d%H%M"))
}

/// Knobs of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub start_id: u64,
    pub end_id: u64,
    /// Names every run-level artifact.
    pub signature: String,
    /// Extract archives, or only rebuild the pending list from earlier output.
    pub decompress: bool,
    /// Cap on extracted items per category and file.
    pub max_items: usize,
    pub max_file_size_mb: u64,
    pub max_files_per_dataset: usize,
}

impl RunSettings {
    /// Settings with default limits for an inclusive id range.
    pub fn new(start_id: u64, end_id: u64, signature: impl Into<String>) -> Self {
        Self {
            start_id,
            end_id,
            signature: signature.into(),
            decompress: true,
            max_items: DEFAULT_MAX_ITEMS,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            max_files_per_dataset: DEFAULT_MAX_FILES_PER_DATASET,
        }
    }

    #[must_use]
    pub fn range(&self) -> RangeInclusive<u64> {
        self.start_id..=self.end_id
    }

    #[must_use]
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(BYTES_PER_MB)
    }
}

/// Accumulators of one run.
#[derive(Debug, Default)]
pub struct RunContext {
    pub download_rows: Vec<DownloadRecord>,
    pub download_stats: BTreeMap<u64, DownloadStats>,
    /// Dataset -> link -> saved filename (or `--`).
    pub link_mapping: BTreeMap<u64, BTreeMap<String, String>>,
    pub parse_rows: Vec<ParseRecord>,
    pub parse_stats: BTreeMap<u64, ParseStats>,
}

impl RunContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared types of the files downloaded in this run.
    #[must_use]
    pub fn declared_types(&self) -> DeclaredTypes {
        self.download_rows.iter().collect()
    }

    /// Run-wide download counters summed over datasets.
    #[must_use]
    pub fn download_totals(&self) -> DownloadStats {
        self.download_stats
            .values()
            .fold(DownloadStats::default(), |acc, stats| DownloadStats {
                number_of_links: acc.number_of_links + stats.number_of_links,
                downloaded_links: acc.downloaded_links + stats.downloaded_links,
                exception_links: acc.exception_links + stats.exception_links,
            })
    }

    /// Run-wide parse counters summed over datasets.
    #[must_use]
    pub fn parse_totals(&self) -> ParseStats {
        self.parse_stats
            .values()
            .fold(ParseStats::default(), |acc, stats| ParseStats {
                number_of_links: acc.number_of_links + stats.number_of_links,
                parsed_files: acc.parsed_files + stats.parsed_files,
                exception_files: acc.exception_files + stats.exception_files,
            })
    }
}

/// Drives the download and parse phases over a corpus.
pub struct Harvester {
    layout: OutputLayout,
    tool: Box<dyn DownloadTool>,
    settings: RunSettings,
}

impl std::fmt::Debug for Harvester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harvester")
            .field("layout", &self.layout)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Harvester {
    pub fn new(layout: OutputLayout, tool: Box<dyn DownloadTool>, settings: RunSettings) -> Self {
        Self {
            layout,
            tool,
            settings,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    #[must_use]
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    fn persist_download(&self, ctx: &RunContext) -> Result<(), OutputError> {
        let signature = &self.settings.signature;
        crate::output::write_json(&self.layout.download_stats(signature), &ctx.download_stats)?;
        crate::output::write_csv(&self.layout.download_results(signature), &ctx.download_rows)
    }

    fn persist_parse(&self, ctx: &RunContext) -> Result<(), OutputError> {
        let signature = &self.settings.signature;
        crate::output::write_json(&self.layout.parse_stats(signature), &ctx.parse_stats)?;
        crate::output::write_csv(&self.layout.parse_results(signature), &ctx.parse_rows)
    }
}

/// Saved path relative to the dataset folder.
fn relative_to_dataset(saved_path: &str, dataset_dir: &Path) -> String {
    let saved = Path::new(saved_path);
    if let Ok(relative) = saved.strip_prefix(dataset_dir) {
        return relative.to_string_lossy().into_owned();
    }
    saved
        .file_name()
        .map_or_else(|| saved_path.to_string(), |name| name.to_string_lossy().into_owned())
}
