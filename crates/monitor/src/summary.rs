//! Chain summarizer: sample count and latest acceptance rate.
//!
//! A chain file is a tab-separated table of floats, one row per saved
//! sample.  The second-to-last column holds the acceptance rate the
//! sampler had reached when that row was written.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::ChainError;
use crate::report::ChainStatus;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSummary {
    /// Number of data rows in the whole file.
    pub rows: usize,
    /// Second-to-last field of the final row.
    pub acceptance_rate: f64,
}

/// Summarize the chain file at `path`, never failing.
///
/// Any read or parse problem becomes [`ChainStatus::Unreadable`] so one
/// broken file cannot hold up the rest of a user's report.
pub fn summarize_chain(path: &Path) -> ChainStatus {
    let parsed = File::open(path)
        .map_err(ChainError::from)
        .and_then(|file| parse_chain(BufReader::new(file)));
    match parsed {
        Ok(summary) => ChainStatus::Summary(summary),
        Err(err) => ChainStatus::Unreadable(err.to_string()),
    }
}

/// Parse a whole chain table, one line at a time.
///
/// Only the row count, the column width and the latest acceptance value are
/// kept, so memory use does not grow with the file.  Blank lines and `#`
/// comments are skipped.  Empty fields (a trailing tab) are dropped.  Every
/// row must carry the same number of numeric fields, at least two, so a
/// half-written final row makes the table unreadable.
pub fn parse_chain<R: BufRead>(reader: R) -> Result<ChainSummary, ChainError> {
    let mut rows = 0usize;
    let mut width: Option<usize> = None;
    let mut last_acceptance = None;
    let mut values: Vec<f64> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        values.clear();
        for field in trimmed.split('\t').map(str::trim).filter(|f| !f.is_empty()) {
            let value: f64 = field.parse().map_err(|_| ChainError::Parse {
                line: line_no,
                reason: format!("non-numeric field `{field}`"),
            })?;
            values.push(value);
        }

        if values.len() < 2 {
            return Err(ChainError::Parse {
                line: line_no,
                reason: format!("expected at least 2 columns, found {}", values.len()),
            });
        }
        match width {
            None => width = Some(values.len()),
            Some(expected) if expected != values.len() => {
                return Err(ChainError::Parse {
                    line: line_no,
                    reason: format!("expected {expected} columns, found {}", values.len()),
                });
            }
            Some(_) => {}
        }

        rows += 1;
        last_acceptance = Some(values[values.len() - 2]);
    }

    match last_acceptance {
        Some(acceptance_rate) => Ok(ChainSummary {
            rows,
            acceptance_rate,
        }),
        None => Err(ChainError::Empty),
    }
}
