//! Interpretation of the download tool's log output.
//!
//! The tool reports its progress as free text. [`classify`] turns one attempt's
//! log plus the process exit status into a [`DownloadOutcome`]. Callers only see
//! the outcome, so the heuristic below can be swapped for a structured
//! integration without touching them.

use std::fmt;

/// Line announcing that an HTTP response arrived; the status follows it.
pub const RESPONSE_MARKER: &str = "HTTP request sent, awaiting response...";

/// Phrase the tool prints when it stops retrying.
const GIVING_UP: &str = "Giving up";

/// Index of the first status token on a marker line.
const STATUS_TOKEN_INDEX: usize = 5;

/// Number of tokens kept when describing a log without a marker line.
const WEIRD_DESCRIPTION_TOKENS: usize = 6;

/// Status token reported for a successful transfer.
pub const SUCCESS_STATUS: &str = "200";

/// Code recorded when the failure did not come with an HTTP status.
pub const OTHER_CODE: &str = "other";

/// Placeholder for values the log did not provide.
pub const PLACEHOLDER: &str = "--";

/// Classification of a single download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The server answered with the success status and the file was saved.
    Success {
        /// Declared file type as printed by the tool, e.g. `[application/rdf+xml]`.
        file_type: String,
        /// Path the tool saved the file to.
        saved_path: String,
    },
    /// The server or the network refused the transfer.
    RemoteFailure {
        /// HTTP status token, or [`OTHER_CODE`].
        code: String,
        /// Human-readable description.
        description: String,
    },
    /// The tool exited cleanly but the log has no response line.
    Indeterminate {
        /// Truncated tail of the log.
        description: String,
        /// Path guessed from the description.
        saved_path: String,
    },
}

impl DownloadOutcome {
    /// Whether the outcome counts as a downloaded link.
    #[must_use]
    pub fn is_downloaded(&self) -> bool {
        !matches!(self, Self::RemoteFailure { .. })
    }

    /// Code column value for the results table.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Success { .. } | Self::Indeterminate { .. } => SUCCESS_STATUS,
            Self::RemoteFailure { code, .. } => code,
        }
    }

    /// Type column value for the results table.
    #[must_use]
    pub fn type_label(&self) -> &str {
        match self {
            Self::Success { .. } | Self::Indeterminate { .. } => "OK",
            Self::RemoteFailure { description, .. } => description,
        }
    }

    /// Declared file type, or the placeholder for failures.
    #[must_use]
    pub fn file_type(&self) -> &str {
        match self {
            Self::Success { file_type, .. } => file_type,
            Self::Indeterminate { .. } => OTHER_CODE,
            Self::RemoteFailure { .. } => PLACEHOLDER,
        }
    }

    /// Saved path, if the outcome produced one.
    #[must_use]
    pub fn saved_path(&self) -> Option<&str> {
        match self {
            Self::Success { saved_path, .. } | Self::Indeterminate { saved_path, .. } => {
                Some(saved_path)
            }
            Self::RemoteFailure { .. } => None,
        }
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success {
                file_type,
                saved_path,
            } => write!(f, "downloaded {saved_path} {file_type}"),
            Self::RemoteFailure { code, description } => write!(f, "{code}: {description}"),
            Self::Indeterminate { description, .. } => write!(f, "weird format: {description}"),
        }
    }
}

/// Classifies one download attempt from its log text and the tool's exit status.
///
/// The marker search runs backward from the second-to-last line, so the most
/// recent response (after any redirects) wins.
#[must_use]
pub fn classify(log_text: &str, exit_status: i32) -> DownloadOutcome {
    let lines: Vec<&str> = log_text.lines().collect();

    if let Some(marker_index) = find_last_marker(&lines) {
        let status: Vec<&str> = lines[marker_index]
            .split_whitespace()
            .skip(STATUS_TOKEN_INDEX)
            .collect();
        if let Some(code) = status.first() {
            if *code == SUCCESS_STATUS {
                return DownloadOutcome::Success {
                    file_type: last_token(lines.get(marker_index + 1).copied()),
                    saved_path: trim_quotes(&last_token(lines.get(marker_index + 2).copied()))
                        .to_string(),
                };
            }
            return DownloadOutcome::RemoteFailure {
                code: (*code).to_string(),
                description: status.join(" "),
            };
        }
    }

    if exit_status != 0 {
        return DownloadOutcome::RemoteFailure {
            code: OTHER_CODE.to_string(),
            description: failure_tail(&lines),
        };
    }

    let description = tail_line(&lines)
        .map(|line| {
            line.split_whitespace()
                .take(WEIRD_DESCRIPTION_TOKENS)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    let saved_path = description
        .split_whitespace()
        .next_back()
        .map_or(PLACEHOLDER, trim_quotes)
        .to_string();
    DownloadOutcome::Indeterminate {
        description,
        saved_path,
    }
}

fn find_last_marker(lines: &[&str]) -> Option<usize> {
    let searchable = lines.len().checked_sub(1)?;
    (0..searchable)
        .rev()
        .find(|&index| lines[index].contains(RESPONSE_MARKER))
}

/// The last line, or the one before it when the log ends with a blank line.
fn tail_line<'a>(lines: &[&'a str]) -> Option<&'a str> {
    match lines {
        [] => None,
        [.., before, last] if last.trim().is_empty() => Some(*before),
        [.., last] => Some(*last),
    }
}

fn failure_tail(lines: &[&str]) -> String {
    match lines {
        [.., third, second, last] if last.trim().is_empty() && second.contains(GIVING_UP) => {
            third
                .split_whitespace()
                .skip(4)
                .chain(second.split_whitespace())
                .collect::<Vec<_>>()
                .join(" ")
        }
        _ => tail_line(lines)
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default(),
    }
}

fn last_token(line: Option<&str>) -> String {
    line.and_then(|l| l.split_whitespace().next_back())
        .unwrap_or(PLACEHOLDER)
        .to_string()
}

/// Trims the quote characters the tool wraps around paths.
fn trim_quotes(token: &str) -> &str {
    token.trim_matches(|c| matches!(c, '\'' | '"' | '`' | '\u{2018}' | '\u{2019}'))
}
