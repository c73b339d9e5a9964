//! User registry — the static list of people whose runs are watched.
//!
//! One user per line: display-name words followed by the base directory,
//! all separated by whitespace.  The last field is always the directory so
//! names with any number of parts (`Ada King Lovelace /scratch/ada`) work.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntry {
    /// Name as it appears in the chat workspace profile (`real_name`).
    pub display_name: String,
    pub base_dir: PathBuf,
}

/// Read and parse the registry at `path`.  A missing or empty file is an error.
pub fn load_registry(path: impl AsRef<Path>) -> Result<Vec<UserEntry>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read user registry {}", path.display()))?;
    let entries = parse_registry(&raw)
        .with_context(|| format!("malformed user registry {}", path.display()))?;
    if entries.is_empty() {
        bail!("user registry {} lists no users", path.display());
    }
    Ok(entries)
}

pub fn parse_registry(raw: &str) -> Result<Vec<UserEntry>> {
    let mut entries = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some((dir, name_parts)) = fields.split_last() else {
            continue;
        };
        if name_parts.is_empty() {
            bail!(
                "line {}: expected `<name...> <base_dir>`, got `{line}`",
                idx + 1
            );
        }

        entries.push(UserEntry {
            display_name: name_parts.join(" "),
            base_dir: PathBuf::from(dir),
        });
    }
    Ok(entries)
}
