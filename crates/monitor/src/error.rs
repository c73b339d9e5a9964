//! Typed errors for chain parsing and user lookup.

use thiserror::Error;

/// Why a chain file could not be summarized.
///
/// Never escapes a pass: the summarizer turns it into an "unreadable"
/// report entry using the display text as the reason.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("no data rows")]
    Empty,
}

#[derive(Error, Debug)]
pub enum LookupError {
    /// No directory member carries this display name.
    #[error("no chat user named `{0}`")]
    NotFound(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
