//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use harvester_core::{DEFAULT_END_ID, DEFAULT_START_ID};

/// Which part of the pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Fetch every link of the selected datasets.
    Download,
    /// Parse files fetched by an earlier download run.
    Parse,
    /// Download, then parse with this run's results.
    Full,
    /// Build indexable content and the empty-dataset report.
    Index,
    /// Count downloaded files and record their sizes.
    Inventory,
}

impl Mode {
    /// Name used for the run log folder.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Parse => "parse",
            Self::Full => "full",
            Self::Index => "index",
            Self::Inventory => "inventory",
        }
    }

    #[must_use]
    pub fn downloads(self) -> bool {
        matches!(self, Self::Download | Self::Full)
    }

    #[must_use]
    pub fn parses(self) -> bool {
        matches!(self, Self::Parse | Self::Full)
    }
}

/// Download, decompress and mine RDF dataset dumps.
///
/// Harvester fetches every download link of a dataset corpus with an external
/// tool, parses the resulting files as RDF and records the classes,
/// properties, entities and literals they contain.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Pipeline stage(s) to run
    #[arg(short, long, value_enum, default_value_t = Mode::Full)]
    pub mode: Mode,

    /// Signature of the download run whose results feed parsing
    #[arg(short, long, required_if_eq("mode", "parse"))]
    pub signature: Option<String>,

    /// Extract archives while parsing (false reuses earlier extractions) [default: true]
    #[arg(long, action = ArgAction::Set)]
    pub decompress: Option<bool>,

    /// First dataset id to process
    #[arg(long, default_value_t = DEFAULT_START_ID)]
    pub start_id: u64,

    /// Last dataset id to process (inclusive)
    #[arg(long, default_value_t = DEFAULT_END_ID)]
    pub end_id: u64,

    /// Dataset corpus JSON file
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Root folder of all run artifacts
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Config file (defaults to $XDG_CONFIG_HOME/harvester/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum items kept per category and file
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=10_000_000))]
    pub max_items: Option<u64>,

    /// Program used to fetch links
    #[arg(long)]
    pub download_program: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
