//! Report formatting: turns one user's cycle summary into message text.

use std::path::PathBuf;

use crate::summary::ChainSummary;

#[derive(Debug, Clone, PartialEq)]
pub enum ChainStatus {
    Summary(ChainSummary),
    /// The file could not be parsed; carries a short human-readable reason.
    Unreadable(String),
}

/// One fresh chain file in a user's report.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainEntry {
    pub path: PathBuf,
    pub status: ChainStatus,
}

impl ChainEntry {
    fn line(&self) -> String {
        match &self.status {
            ChainStatus::Summary(summary) => format!(
                "{}: {} samples, acceptance rate {}",
                self.path.display(),
                summary.rows,
                summary.acceptance_rate
            ),
            ChainStatus::Unreadable(reason) => {
                format!("{}: :warning: unreadable ({reason})", self.path.display())
            }
        }
    }
}

/// Render the lines of a user's report, in order.
///
/// No entries gives the single all-clear line; otherwise a header followed
/// by one line per entry in input order.
pub fn format_report(mention: &str, window_hours: f64, entries: &[ChainEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec![format!(
            "{mention} has no MCMC runs going that updated in the last {window_hours} hrs. :tada:"
        )];
    }

    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(format!("{mention} has the following MCMC runs going:"));
    lines.extend(entries.iter().map(ChainEntry::line));
    lines
}

/// Pack report lines into messages of at most `max_chars` characters,
/// joining with newlines.  A line longer than the limit gets a message of
/// its own rather than being cut.
pub fn pack_lines(lines: &[String], max_chars: usize) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in lines {
        let line_len = line.chars().count();
        if current_len > 0 && current_len + 1 + line_len > max_chars {
            messages.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        messages.push(current);
    }
    messages
}
