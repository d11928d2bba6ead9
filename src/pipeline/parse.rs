//! Parse phase: decompression, RDF parsing and content extraction.

use std::path::Path;

use indicatif::ProgressBar;
use tracing::{debug, error, info, instrument, warn};

use super::{Harvester, PipelineError, RunContext};
use crate::archive::{self, ArchiveError};
use crate::corpus::Corpus;
use crate::download::PLACEHOLDER;
use crate::files::{is_type_parsable, list_files, rename_if_weird};
use crate::output::{
    DeclaredTypes, DownloadRecord, OutputLayout, ParseRecord, ParseStats, read_csv, write_json,
};
use crate::rdf::{Category, ContentBundle, extract, load_graph};

const OK_CODE: &str = "200";
const OK_TYPE: &str = "OK";

/// Reads the declared types recorded by an earlier download run.
///
/// # Errors
///
/// Returns an error if `download_infos_<signature>.csv` is missing or malformed.
pub fn load_declared_types(
    layout: &OutputLayout,
    signature: &str,
) -> Result<DeclaredTypes, PipelineError> {
    let path = layout.download_results(signature);
    let records: Vec<DownloadRecord> = read_csv(&path)?;
    let declared: DeclaredTypes = records.iter().collect();
    info!(path = %path.display(), files = declared.len(), "declared types loaded");
    Ok(declared)
}

/// What happened to one pending file.
enum FileResult {
    Parsed(Box<ContentBundle>),
    Rejected,
}

impl Harvester {
    /// Parses the downloaded files of every dataset in the configured range.
    ///
    /// # Errors
    ///
    /// Returns an error if an artifact cannot be written or a dataset folder
    /// cannot be listed. Unparsable files are recorded, not returned.
    #[instrument(skip(self, corpus, ctx, declared, progress), fields(signature = %self.settings.signature))]
    pub fn parse_datasets(
        &self,
        corpus: &Corpus,
        ctx: &mut RunContext,
        declared: &DeclaredTypes,
        progress: &ProgressBar,
    ) -> Result<(), PipelineError> {
        info!(
            start_id = self.settings.start_id,
            end_id = self.settings.end_id,
            decompress = self.settings.decompress,
            "starting parse phase"
        );
        if !self.settings.decompress {
            info!("compressed files have already been extracted");
        }

        for dataset in corpus.in_range(self.settings.range()) {
            progress.set_message(format!("parsing dataset {}", dataset.dataset_id));
            let (stats, content) = self.parse_dataset(dataset.dataset_id, ctx, declared)?;
            ctx.parse_stats.insert(dataset.dataset_id, stats);
            self.persist_parse(ctx)?;
            write_json(&self.layout.dataset_content(dataset.dataset_id), &content)?;
            progress.inc(1);
        }

        let totals = ctx.parse_totals();
        info!(
            files = totals.number_of_links,
            parsed = totals.parsed_files,
            failed = totals.exception_files,
            "parse phase complete"
        );
        Ok(())
    }

    #[instrument(skip(self, ctx, declared))]
    fn parse_dataset(
        &self,
        dataset_id: u64,
        ctx: &mut RunContext,
        declared: &DeclaredTypes,
    ) -> Result<(ParseStats, ContentBundle), PipelineError> {
        let dir = self.layout.dataset_download_dir(dataset_id);
        let mut stats = ParseStats::default();
        let mut content = ContentBundle::default();

        if !dir.is_dir() {
            warn!(dir = %dir.display(), "no download folder for dataset");
            return Ok((stats, content));
        }

        let files = list_files(&dir).map_err(|e| PipelineError::io(&dir, e))?;
        let mut pending = files.clone();
        for file in &files {
            let filetype = declared.get(dataset_id, file);
            if let Err(e) =
                archive::dispatch(&dir, file, filetype, self.settings.decompress, &mut pending)
            {
                error!(%file, error = %e, "archive could not be unpacked");
                stats.number_of_links += 1;
                stats.exception_files += 1;
                ctx.parse_rows
                    .push(archive_failure_row(dataset_id, file, filetype, &e));
            }
        }
        info!(files = pending.len(), "beginning parsing of dataset");

        for (index, file) in pending
            .iter()
            .take(self.settings.max_files_per_dataset)
            .enumerate()
        {
            let ordinal = index + 1;
            stats.number_of_links += 1;
            match self.parse_pending_file(dataset_id, ordinal, file, &dir, ctx, declared)? {
                FileResult::Parsed(file_content) => {
                    stats.parsed_files += 1;
                    content.extend_from(&file_content);
                }
                FileResult::Rejected => stats.exception_files += 1,
            }
        }
        if pending.len() > self.settings.max_files_per_dataset {
            info!(
                skipped = pending.len() - self.settings.max_files_per_dataset,
                "file limit reached"
            );
        }

        info!(
            parsed = stats.parsed_files,
            broken = stats.exception_files,
            "end of parsing of dataset"
        );
        Ok((stats, content))
    }

    fn parse_pending_file(
        &self,
        dataset_id: u64,
        ordinal: usize,
        file: &str,
        dir: &Path,
        ctx: &mut RunContext,
        declared: &DeclaredTypes,
    ) -> Result<FileResult, PipelineError> {
        let filename = format!("file_{ordinal}");
        let filetype = declared.get(dataset_id, file).to_string();
        debug!(%file, %filetype, "trying to parse file");

        let reject = |ctx: &mut RunContext, file: &str, code: &str, kind: String| {
            ctx.parse_rows.push(ParseRecord::rejected(
                dataset_id,
                filename.clone(),
                file.to_string(),
                filetype.clone(),
                code,
                kind,
            ));
            FileResult::Rejected
        };

        if !is_type_parsable(&filetype) {
            info!(%file, %filetype, "unsuitable format");
            return Ok(reject(ctx, file, PLACEHOLDER, "format".to_string()));
        }

        let size = match std::fs::metadata(dir.join(file)) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                warn!(%file, error = %e, "file unreadable");
                return Ok(reject(ctx, file, "io_error", e.to_string()));
            }
        };
        if size >= self.settings.max_file_size_bytes() {
            info!(%file, size, "file too large");
            return Ok(reject(ctx, file, PLACEHOLDER, "too_large".to_string()));
        }

        let file = match rename_if_weird(dir, file) {
            Ok(renamed) => renamed,
            Err(e) => {
                warn!(%file, error = %e, "rename failed");
                return Ok(reject(ctx, file, "io_error", e.to_string()));
            }
        };

        let path = dir.join(&file);
        let graph = match load_graph(&path) {
            Ok((graph, format)) => {
                debug!(%file, ?format, "format resolved");
                graph
            }
            Err(e) => {
                info!(%file, error = %e, "exception occurred while parsing");
                return Ok(reject(ctx, &file, e.kind(), e.detail()));
            }
        };
        info!(%file, triples = graph.len(), "correctly parsed");

        let mut file_content = ContentBundle::default();
        let mut counts = [0_usize; 4];
        for (slot, category) in counts.iter_mut().zip(Category::ALL) {
            let extraction = extract(&graph, category, self.settings.max_items);
            *slot = extraction.count;
            file_content.set(category, extraction.items);
        }
        drop(graph);

        let [classes, properties, entities, literals] = counts;
        ctx.parse_rows.push(ParseRecord {
            dataset_id,
            filename,
            file,
            filetype,
            code: OK_CODE.to_string(),
            kind: OK_TYPE.to_string(),
            classes,
            properties,
            entities,
            literals,
        });
        write_json(&self.layout.file_content(dataset_id, ordinal), &file_content)?;

        Ok(FileResult::Parsed(Box::new(file_content)))
    }
}

fn archive_failure_row(dataset_id: u64, file: &str, filetype: &str, e: &ArchiveError) -> ParseRecord {
    let (code, kind) = match e {
        ArchiveError::NotDecompressed { .. } => (PLACEHOLDER, "not_decompressed".to_string()),
        other => ("archive_error", other.to_string()),
    };
    ParseRecord::rejected(
        dataset_id,
        PLACEHOLDER.to_string(),
        file.to_string(),
        filetype.to_string(),
        code,
        kind,
    )
}
