//! Directory layout of a run's artifacts under the output root.

use std::path::{Path, PathBuf};

use super::error::OutputError;

/// Paths of every artifact the pipeline reads or writes.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the fixed directory skeleton.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn prepare(&self) -> Result<(), OutputError> {
        for dir in [
            self.root.join("downloads"),
            self.root.join("logs").join("download").join("wget"),
            self.root.join("results").join("download"),
            self.root.join("results").join("parse"),
            self.root.join("stats").join("download"),
            self.root.join("stats").join("parse"),
            self.root.join("content"),
            self.root.join("files_level_content"),
            self.root.join("indexable_content"),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| OutputError::io(&dir, e))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("downloads")
    }

    /// Folder the download tool saves a dataset's files into.
    #[must_use]
    pub fn dataset_download_dir(&self, dataset_id: u64) -> PathBuf {
        self.downloads_dir().join(format!("dataset_{dataset_id}"))
    }

    /// Per-link log of the download tool (`link_ordinal` is 1-based).
    #[must_use]
    pub fn tool_log(&self, dataset_id: u64, link_ordinal: usize) -> PathBuf {
        self.root
            .join("logs")
            .join("download")
            .join("wget")
            .join(format!("dataset_{dataset_id}"))
            .join(format!("link_{link_ordinal}.log"))
    }

    /// Run log of one mode.
    #[must_use]
    pub fn run_log(&self, mode: &str, signature: &str) -> PathBuf {
        self.root
            .join("logs")
            .join(mode)
            .join(format!("main_{signature}.log"))
    }

    #[must_use]
    pub fn download_results(&self, signature: &str) -> PathBuf {
        self.root
            .join("results")
            .join("download")
            .join(format!("download_infos_{signature}.csv"))
    }

    #[must_use]
    pub fn download_stats(&self, signature: &str) -> PathBuf {
        self.root
            .join("stats")
            .join("download")
            .join(format!("download_stats_{signature}.json"))
    }

    /// Dataset -> link -> saved filename mapping.
    #[must_use]
    pub fn link_mapping(&self, signature: &str) -> PathBuf {
        self.root
            .join("results")
            .join("download")
            .join(format!("downloaded_dataset_{signature}.json"))
    }

    #[must_use]
    pub fn parse_results(&self, signature: &str) -> PathBuf {
        self.root
            .join("results")
            .join("parse")
            .join(format!("parsing_infos_{signature}.csv"))
    }

    #[must_use]
    pub fn parse_stats(&self, signature: &str) -> PathBuf {
        self.root
            .join("stats")
            .join("parse")
            .join(format!("parsing_stats_{signature}.json"))
    }

    /// Content of one parsed file (`file_ordinal` is 1-based).
    #[must_use]
    pub fn file_content(&self, dataset_id: u64, file_ordinal: usize) -> PathBuf {
        self.root
            .join("files_level_content")
            .join(format!("dataset_{dataset_id}"))
            .join(format!("file_{file_ordinal}.json"))
    }

    #[must_use]
    pub fn content_dir(&self) -> PathBuf {
        self.root.join("content")
    }

    #[must_use]
    pub fn dataset_content(&self, dataset_id: u64) -> PathBuf {
        self.content_dir().join(format!("dataset_{dataset_id}.json"))
    }

    #[must_use]
    pub fn indexable_content(&self, dataset_id: u64) -> PathBuf {
        self.root
            .join("indexable_content")
            .join(format!("dataset_{dataset_id}.json"))
    }

    #[must_use]
    pub fn empty_datasets(&self) -> PathBuf {
        self.root.join("results").join("empty_datasets.json")
    }

    #[must_use]
    pub fn downloaded_files_count(&self) -> PathBuf {
        self.root
            .join("results")
            .join("download")
            .join("count_downloaded_files.json")
    }

    #[must_use]
    pub fn files_dimension(&self) -> PathBuf {
        self.root
            .join("results")
            .join("download")
            .join("files_dimension.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_naming_scheme() {
        let layout = OutputLayout::new("/out");
        assert_eq!(
            layout.dataset_download_dir(4),
            PathBuf::from("/out/downloads/dataset_4")
        );
        assert_eq!(
            layout.tool_log(4, 2),
            PathBuf::from("/out/logs/download/wget/dataset_4/link_2.log")
        );
        assert_eq!(
            layout.download_results("1_9_2401011200"),
            PathBuf::from("/out/results/download/download_infos_1_9_2401011200.csv")
        );
        assert_eq!(
            layout.parse_stats("s"),
            PathBuf::from("/out/stats/parse/parsing_stats_s.json")
        );
        assert_eq!(
            layout.file_content(4, 1),
            PathBuf::from("/out/files_level_content/dataset_4/file_1.json")
        );
        assert_eq!(
            layout.run_log("parse", "s"),
            PathBuf::from("/out/logs/parse/main_s.log")
        );
    }

    #[test]
    fn test_prepare_creates_skeleton() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let layout = OutputLayout::new(temp.path());

        layout.prepare().expect("prepare");

        assert!(temp.path().join("results/parse").is_dir());
        assert!(temp.path().join("logs/download/wget").is_dir());
        assert!(layout.content_dir().is_dir());
    }
}
