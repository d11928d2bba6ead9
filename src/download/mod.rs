//! Download-phase building blocks.
//!
//! Files are fetched by an external tool (`wget` by default) rather than an
//! in-process HTTP client. Each attempt leaves a log file behind, and the
//! outcome is inferred from that log.
//!
//! - [`tool`] runs the tool as a subprocess and reports its exit status.
//! - [`log`] classifies the attempt from the log text.
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::download::{DownloadTool, WgetTool, classify};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tool = WgetTool::default();
//! let log_file = Path::new("./logs/link_1.log");
//! let run = tool
//!     .fetch("https://example.org/data.ttl", Path::new("./downloads"), log_file)
//!     .await?;
//! let text = std::fs::read_to_string(log_file)?;
//! println!("{}", classify(&text, run.exit_status));
//! # Ok(())
//! # }
//! ```

mod error;
pub mod log;
mod tool;

pub use error::DownloadError;
pub use log::{DownloadOutcome, PLACEHOLDER, classify};
pub use tool::{DEFAULT_DOWNLOAD_PROGRAM, DownloadTool, ToolRun, WgetTool};
