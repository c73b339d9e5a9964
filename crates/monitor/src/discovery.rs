//! Chain file discovery under a user's base directory.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Basenames (lowercase) written by the sampler for the cold chain.
pub const RECOGNIZED_CHAIN_FILES: &[&str] = &["chain_1.txt", "chain_1.0.txt"];

fn is_chain_file_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    RECOGNIZED_CHAIN_FILES.contains(&lowered.as_str())
}

/// Walk `base_dir` recursively and return every recognized chain file,
/// sorted lexicographically by full path.
///
/// A missing or unreadable base directory yields an empty list; entries the
/// walker cannot read are skipped.
pub fn find_chain_files(base_dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(base_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(?err, base = %base_dir.display(), "discovery: skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_str().is_some_and(is_chain_file_name))
        .map(|entry| entry.into_path())
        .collect();

    found.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "0\t1\n").unwrap();
    }

    #[test]
    fn finds_recognized_names_in_nested_dirs_sorted() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(&root.join("run_b/chain_1.txt"));
        touch(&root.join("run_a/deep/nested/chain_1.0.txt"));
        touch(&root.join("run_a/chain_1.txt"));
        touch(&root.join("run_a/chain_2.txt"));
        touch(&root.join("run_c/notes.txt"));

        let found = find_chain_files(root);
        assert_eq!(
            found,
            vec![
                root.join("run_a/chain_1.txt"),
                root.join("run_a/deep/nested/chain_1.0.txt"),
                root.join("run_b/chain_1.txt"),
            ]
        );
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("x/CHAIN_1.TXT"));
        touch(&dir.path().join("y/Chain_1.0.txt"));
        assert_eq!(find_chain_files(dir.path()).len(), 2);
    }

    #[test]
    fn prefix_or_suffix_variants_do_not_match() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("old_chain_1.txt"));
        touch(&dir.path().join("chain_1.txt.bak"));
        touch(&dir.path().join("chain_10.txt"));
        assert!(find_chain_files(dir.path()).is_empty());
    }

    #[test]
    fn directory_named_like_a_chain_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("chain_1.txt")).unwrap();
        assert!(find_chain_files(dir.path()).is_empty());
    }

    #[test]
    fn missing_base_dir_returns_empty() {
        let dir = TempDir::new().unwrap();
        assert!(find_chain_files(&dir.path().join("does-not-exist")).is_empty());
    }

    #[test]
    fn empty_base_dir_returns_empty() {
        let dir = TempDir::new().unwrap();
        assert!(find_chain_files(dir.path()).is_empty());
    }
}
