//! CLI entry point for the dataset harvester.

use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::Parser;
use harvester_core::config::{FileConfig, load_config};
use harvester_core::download::DEFAULT_DOWNLOAD_PROGRAM;
use harvester_core::{
    Harvester, OutputLayout, RunContext, RunSettings, WgetTool, build_index, build_inventory,
    load_corpus, load_declared_types, run_signature,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;

use cli::{Args, Mode};

const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_CORPUS_PATH: &str = "datasets.json";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    if args.start_id > args.end_id {
        bail!(
            "--start-id ({}) must not exceed --end-id ({})",
            args.start_id,
            args.end_id
        );
    }

    let loaded = load_config(args.config.as_deref())?;
    let file_config = loaded.file_config();

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| file_config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let layout = OutputLayout::new(output_dir);
    layout
        .prepare()
        .context("Failed to prepare output directory")?;

    let started_at = chrono::Local::now().naive_local();
    let signature = run_signature(args.start_id, args.end_id, started_at);
    init_tracing(&args, &layout, &signature)?;

    debug!(?args, config = ?loaded.path, "CLI arguments parsed");
    info!(mode = args.mode.as_str(), %signature, "Harvester starting");

    let settings = resolve_settings(&args, &file_config, signature)?;
    let corpus_path = args
        .corpus
        .clone()
        .or_else(|| file_config.corpus_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS_PATH));
    let corpus = load_corpus(&corpus_path)?;

    match args.mode {
        Mode::Index => {
            build_index(&layout, &corpus, settings.range())?;
        }
        Mode::Inventory => {
            build_inventory(&layout, &corpus, settings.range())?;
        }
        Mode::Download | Mode::Parse | Mode::Full => {
            let program = args
                .download_program
                .clone()
                .or_else(|| file_config.download_program.clone())
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_PROGRAM.to_string());
            let selected = corpus.in_range(settings.range()).count();
            let harvester = Harvester::new(layout, Box::new(WgetTool::new(program)), settings);
            let mut ctx = RunContext::new();

            if args.mode.downloads() {
                let progress = progress_bar(&args, selected);
                harvester
                    .download_datasets(&corpus, &mut ctx, &progress)
                    .await?;
                progress.finish_and_clear();
            }

            if args.mode.parses() {
                let declared = match args.signature.as_deref() {
                    Some(info_signature) if args.mode == Mode::Parse => {
                        load_declared_types(harvester.layout(), info_signature)?
                    }
                    _ => ctx.declared_types(),
                };
                let progress = progress_bar(&args, selected);
                harvester.parse_datasets(&corpus, &mut ctx, &declared, &progress)?;
                progress.finish_and_clear();
            }
        }
    }

    info!("Harvester finished");
    Ok(())
}

/// Command-line values override file values; file values override defaults.
fn resolve_settings(args: &Args, file_config: &FileConfig, signature: String) -> Result<RunSettings> {
    let mut settings = RunSettings::new(args.start_id, args.end_id, signature);

    settings.decompress = args.decompress.or(file_config.decompress).unwrap_or(true);
    if let Some(max_items) = args.max_items {
        settings.max_items =
            usize::try_from(max_items).context("--max-items out of range for this platform")?;
    } else if let Some(max_items) = file_config.max_items {
        settings.max_items = max_items;
    }
    if let Some(size) = file_config.max_file_size_mb {
        settings.max_file_size_mb = size;
    }
    if let Some(files) = file_config.max_files_per_dataset {
        settings.max_files_per_dataset = files;
    }
    Ok(settings)
}

fn init_tracing(args: &Args, layout: &OutputLayout, signature: &str) -> Result<()> {
    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let log_path = layout.run_log(args.mode.as_str(), signature);
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory '{}'", parent.display()))?;
    }
    let log_file = File::create(&log_path)
        .with_context(|| format!("Failed to create run log '{}'", log_path.display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();
    Ok(())
}

fn progress_bar(args: &Args, datasets: usize) -> ProgressBar {
    if args.quiet || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(datasets).unwrap_or(u64::MAX));
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_for(argv: &[&str], file_config: &FileConfig) -> RunSettings {
        let args = Args::try_parse_from(argv).unwrap();
        resolve_settings(&args, file_config, "sig".to_string()).unwrap()
    }

    #[test]
    fn test_decompress_command_line_overrides_file() {
        let file_config = FileConfig {
            decompress: Some(false),
            ..FileConfig::default()
        };

        let enabled = settings_for(&["harvester", "--decompress", "true"], &file_config);
        assert!(enabled.decompress);

        let inherited = settings_for(&["harvester"], &file_config);
        assert!(!inherited.decompress);
    }

    #[test]
    fn test_decompress_defaults_to_true() {
        let settings = settings_for(&["harvester"], &FileConfig::default());
        assert!(settings.decompress);

        let disabled = settings_for(&["harvester", "--decompress", "false"], &FileConfig::default());
        assert!(!disabled.decompress);
    }

    #[test]
    fn test_limits_come_from_file_unless_overridden() {
        let file_config = FileConfig {
            max_items: Some(50),
            max_files_per_dataset: Some(3),
            ..FileConfig::default()
        };

        let from_file = settings_for(&["harvester"], &file_config);
        assert_eq!(from_file.max_items, 50);
        assert_eq!(from_file.max_files_per_dataset, 3);

        let overridden = settings_for(&["harvester", "--max-items", "7"], &file_config);
        assert_eq!(overridden.max_items, 7);
    }
}
