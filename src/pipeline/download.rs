//! Download phase: one tool invocation per eligible link.

use indicatif::ProgressBar;
use tracing::{debug, info, instrument, warn};

use super::{Harvester, PipelineError, RunContext, relative_to_dataset};
use crate::corpus::{Corpus, Dataset};
use crate::download::{PLACEHOLDER, classify};
use crate::files::is_link_eligible;
use crate::output::{DownloadRecord, DownloadStats, write_json};

impl Harvester {
    /// Downloads every dataset of the configured range.
    ///
    /// Stats and results are rewritten after each dataset; the link mapping is
    /// written once the whole range is done.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be spawned or an artifact cannot be
    /// written. Failed downloads are recorded, not returned.
    #[instrument(skip(self, corpus, ctx, progress), fields(signature = %self.settings.signature))]
    pub async fn download_datasets(
        &self,
        corpus: &Corpus,
        ctx: &mut RunContext,
        progress: &ProgressBar,
    ) -> Result<(), PipelineError> {
        info!(
            start_id = self.settings.start_id,
            end_id = self.settings.end_id,
            "starting download phase"
        );

        for dataset in corpus.in_range(self.settings.range()) {
            progress.set_message(format!("downloading dataset {}", dataset.dataset_id));
            let stats = self.download_dataset(dataset, ctx).await?;
            ctx.download_stats.insert(dataset.dataset_id, stats);
            self.persist_download(ctx)?;
            progress.inc(1);
        }

        write_json(
            &self.layout.link_mapping(&self.settings.signature),
            &ctx.link_mapping,
        )?;

        let totals = ctx.download_totals();
        info!(
            links = totals.number_of_links,
            downloaded = totals.downloaded_links,
            failed = totals.exception_links,
            "download phase complete"
        );
        Ok(())
    }

    #[instrument(skip(self, dataset, ctx), fields(dataset_id = dataset.dataset_id))]
    async fn download_dataset(
        &self,
        dataset: &Dataset,
        ctx: &mut RunContext,
    ) -> Result<DownloadStats, PipelineError> {
        let dataset_id = dataset.dataset_id;
        let dataset_dir = self.layout.dataset_download_dir(dataset_id);
        tokio::fs::create_dir_all(&dataset_dir)
            .await
            .map_err(|e| PipelineError::io(&dataset_dir, e))?;
        info!(links = dataset.download.len(), "beginning download of dataset");

        let mut stats = DownloadStats {
            number_of_links: dataset.download.len(),
            ..DownloadStats::default()
        };
        let mapping = ctx.link_mapping.entry(dataset_id).or_default();

        for (index, link) in dataset.download.iter().enumerate() {
            let linkname = format!("link_{}", index + 1);

            if !is_link_eligible(link) {
                info!(%link, "unsuitable format");
                stats.exception_links += 1;
                ctx.download_rows
                    .push(DownloadRecord::discarded(dataset_id, linkname, link.clone()));
                continue;
            }

            let log_file = self.layout.tool_log(dataset_id, index + 1);
            if let Some(log_dir) = log_file.parent() {
                tokio::fs::create_dir_all(log_dir)
                    .await
                    .map_err(|e| PipelineError::io(log_dir, e))?;
            }

            debug!(%link, log = %log_file.display(), "invoking download tool");
            let run = self.tool.fetch(link, &dataset_dir, &log_file).await?;
            let log_text = match tokio::fs::read(&log_file).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    warn!(error = %e, log = %log_file.display(), "tool log unreadable");
                    String::new()
                }
            };

            let outcome = classify(&log_text, run.exit_status);
            let filename = outcome
                .saved_path()
                .map_or_else(|| PLACEHOLDER.to_string(), |p| relative_to_dataset(p, &dataset_dir));

            if outcome.is_downloaded() {
                stats.downloaded_links += 1;
                info!(%link, %filename, filetype = outcome.file_type(), "correctly downloaded");
            } else {
                stats.exception_links += 1;
                info!(%link, code = outcome.code(), error = outcome.type_label(), "download failed");
            }

            mapping.insert(link.clone(), filename.clone());
            ctx.download_rows.push(DownloadRecord::from_outcome(
                dataset_id,
                linkname,
                link.clone(),
                &outcome,
                filename,
            ));
        }

        info!(
            downloaded = stats.downloaded_links,
            broken = stats.exception_links,
            "end of download of dataset"
        );
        Ok(stats)
    }
}
