//! Dataset Harvester Core Library
//!
//! This library turns a corpus of dataset records, each listing download
//! links, into per-dataset RDF content: classes, properties, entities and
//! literals, plus run-level CSV/JSON statistics.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - External download tool and log classification
//! - [`files`] - Link eligibility and downloaded file naming
//! - [`archive`] - Decompression dispatch for zip, tar and gzip files
//! - [`rdf`] - Graph loading and content extraction
//! - [`pipeline`] - Download and parse phases over a corpus
//! - [`postprocess`] - Indexable content, empty datasets, download inventory
//! - [`corpus`], [`output`], [`config`] - Inputs, artifacts and defaults

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod config;
pub mod corpus;
pub mod download;
pub mod files;
pub mod output;
pub mod pipeline;
pub mod postprocess;
pub mod rdf;

// Re-export commonly used types
pub use archive::{ArchiveError, ArchiveKind};
pub use corpus::{Corpus, CorpusError, Dataset, load_corpus};
pub use download::{DownloadError, DownloadOutcome, DownloadTool, ToolRun, WgetTool, classify};
pub use output::{OutputError, OutputLayout};
pub use pipeline::{
    DEFAULT_END_ID, DEFAULT_START_ID, Harvester, PipelineError, RunContext, RunSettings,
    load_declared_types, run_signature,
};
pub use postprocess::{build_index, build_inventory};
pub use rdf::{Category, ContentBundle, RdfError};
