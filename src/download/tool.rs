//! Invocation of the external download tool.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::DownloadError;

/// Program invoked when no other tool is configured.
pub const DEFAULT_DOWNLOAD_PROGRAM: &str = "wget";

/// Exit status reported when the process was terminated by a signal.
const SIGNALLED_EXIT_STATUS: i32 = -1;

/// Result of one tool run. The log itself is left in the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolRun {
    /// Process exit status.
    pub exit_status: i32,
}

impl ToolRun {
    /// Whether the tool exited with status zero.
    #[must_use]
    pub fn succeeded(self) -> bool {
        self.exit_status == 0
    }
}

/// Something that fetches a URL into a directory and writes a log file.
#[async_trait]
pub trait DownloadTool: Send + Sync {
    /// Fetches `url` into `dest_dir`, writing the tool's log to `log_file`.
    async fn fetch(&self, url: &str, dest_dir: &Path, log_file: &Path)
    -> Result<ToolRun, DownloadError>;
}

/// Runs `wget -P <dir> -o <log> <url>` (or a compatible program).
#[derive(Debug, Clone)]
pub struct WgetTool {
    program: String,
}

impl WgetTool {
    /// Creates a tool that invokes `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The program this tool invokes.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for WgetTool {
    fn default() -> Self {
        Self::new(DEFAULT_DOWNLOAD_PROGRAM)
    }
}

#[async_trait]
impl DownloadTool for WgetTool {
    #[instrument(skip(self, dest_dir, log_file), fields(program = %self.program))]
    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        log_file: &Path,
    ) -> Result<ToolRun, DownloadError> {
        let output = Command::new(&self.program)
            .arg("-P")
            .arg(dest_dir)
            .arg("-o")
            .arg(log_file)
            .arg(url)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| DownloadError::spawn(&self.program, url, source))?;

        let exit_status = output.status.code().unwrap_or(SIGNALLED_EXIT_STATUS);
        debug!(exit_status, "download tool finished");
        Ok(ToolRun { exit_status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tool_is_wget() {
        assert_eq!(WgetTool::default().program(), "wget");
    }

    #[test]
    fn test_tool_run_succeeded() {
        assert!(ToolRun { exit_status: 0 }.succeeded());
        assert!(!ToolRun { exit_status: 8 }.succeeded());
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let tool = WgetTool::new("definitely-not-a-real-download-tool");
        let result = tool
            .fetch(
                "http://example.org/a.rdf",
                temp.path(),
                &temp.path().join("link_1.log"),
            )
            .await;
        assert!(matches!(result, Err(DownloadError::Spawn { .. })));
    }
}
