//! Run loop: single pass for cron-style invocation, or a sleep loop.

use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{info, warn};

use chainwatch_config::UserEntry;

use crate::error::LookupError;
use crate::notify::{Notifier, UserDirectory};
use crate::pass::{Settings, WatchedUser, run_pass};

/// Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One pass, then return; recurrence is the scheduler's job.
    SinglePass,
    /// Pass, sleep `interval`, repeat.  `max_passes` bounds the loop
    /// (`Some(1)` for the one-iteration test flag); `None` runs until the
    /// process is killed.
    Continuous {
        interval: Duration,
        max_passes: Option<usize>,
    },
}

/// Resolve registry entries to mentionable users.
///
/// Names the directory does not know are skipped with a warning; a backend
/// failure aborts.  Resolving nobody at all is an error.
pub fn resolve_users(directory: &dyn UserDirectory, entries: &[UserEntry]) -> Result<Vec<WatchedUser>> {
    let mut users = Vec::with_capacity(entries.len());
    for entry in entries {
        match directory.resolve(&entry.display_name) {
            Ok(id) => users.push(WatchedUser {
                display_name: entry.display_name.clone(),
                mention: format!("<@{id}>"),
                base_dir: entry.base_dir.clone(),
            }),
            Err(LookupError::NotFound(name)) => {
                warn!(user = %name, "registry user has no chat account; skipping");
            }
            Err(err @ LookupError::Backend(_)) => return Err(err.into()),
        }
    }
    if users.is_empty() {
        bail!("none of the {} registry users matched a chat account", entries.len());
    }
    Ok(users)
}

/// Drive passes according to `mode` and return how many ran.
///
/// Users are handled one after another inside each pass.  The sleep is a
/// plain blocking delay between passes, never after the last one.
pub fn run(
    settings: &Settings,
    users: &[WatchedUser],
    mode: RunMode,
    notifier: &dyn Notifier,
) -> Result<usize> {
    match mode {
        RunMode::SinglePass => {
            run_pass(settings, users, notifier)?;
            Ok(1)
        }
        RunMode::Continuous {
            interval,
            max_passes,
        } => {
            let mut passes = 0usize;
            loop {
                run_pass(settings, users, notifier)?;
                passes += 1;
                if max_passes.is_some_and(|max| passes >= max) {
                    info!(passes, "run loop: pass limit reached");
                    return Ok(passes);
                }
                info!(sleep_secs = interval.as_secs(), "run loop: sleeping until next pass");
                thread::sleep(interval);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::TempDir;

    use crate::pass::tests::{RecordingNotifier, settings, user, write_chain};

    struct MapDirectory(HashMap<&'static str, &'static str>);

    impl UserDirectory for MapDirectory {
        fn resolve(&self, display_name: &str) -> Result<String, LookupError> {
            self.0
                .get(display_name)
                .map(|id| id.to_string())
                .ok_or_else(|| LookupError::NotFound(display_name.to_string()))
        }
    }

    struct DownDirectory;

    impl UserDirectory for DownDirectory {
        fn resolve(&self, _display_name: &str) -> Result<String, LookupError> {
            Err(LookupError::Backend(anyhow::anyhow!("invalid_auth")))
        }
    }

    fn entry(name: &str, dir: &str) -> UserEntry {
        UserEntry {
            display_name: name.to_string(),
            base_dir: PathBuf::from(dir),
        }
    }

    #[test]
    fn resolve_builds_mentions_and_skips_unknown_names() {
        let directory = MapDirectory(HashMap::from([("Jane Doe", "U01JANE")]));
        let users = resolve_users(
            &directory,
            &[entry("Ghost User", "/data/ghost"), entry("Jane Doe", "/data/jane")],
        )
        .unwrap();
        assert_eq!(
            users,
            vec![WatchedUser {
                display_name: "Jane Doe".to_string(),
                mention: "<@U01JANE>".to_string(),
                base_dir: PathBuf::from("/data/jane"),
            }]
        );
    }

    #[test]
    fn resolve_fails_when_nobody_matches() {
        let directory = MapDirectory(HashMap::new());
        assert!(resolve_users(&directory, &[entry("Ghost User", "/x")]).is_err());
    }

    #[test]
    fn resolve_propagates_backend_errors() {
        let err = resolve_users(&DownDirectory, &[entry("Jane Doe", "/x")]).unwrap_err();
        assert!(err.to_string().contains("invalid_auth"));
    }

    #[test]
    fn single_pass_runs_exactly_once() {
        let dir = TempDir::new().unwrap();
        write_chain(&dir.path().join("chain_1.txt"), 100, 0.42, Duration::from_secs(600));

        let notifier = RecordingNotifier::default();
        let passes = run(&settings(1.0), &[user(dir.path())], RunMode::SinglePass, &notifier).unwrap();
        assert_eq!(passes, 1);
        assert_eq!(notifier.posts.borrow().len(), 2);
    }

    #[test]
    fn continuous_with_one_pass_limit_matches_single_pass_output() {
        let dir = TempDir::new().unwrap();
        write_chain(&dir.path().join("chain_1.txt"), 100, 0.42, Duration::from_secs(600));
        let users = [user(dir.path())];

        let single = RecordingNotifier::default();
        run(&settings(1.0), &users, RunMode::SinglePass, &single).unwrap();

        let looped = RecordingNotifier::default();
        let passes = run(
            &settings(1.0),
            &users,
            RunMode::Continuous {
                interval: Duration::from_secs(3600),
                max_passes: Some(1),
            },
            &looped,
        )
        .unwrap();

        assert_eq!(passes, 1);
        assert_eq!(*single.posts.borrow(), *looped.posts.borrow());
    }

    #[test]
    fn continuous_repeats_until_limit() {
        let dir = TempDir::new().unwrap();
        let notifier = RecordingNotifier::default();
        let passes = run(
            &settings(1.0),
            &[user(dir.path())],
            RunMode::Continuous {
                interval: Duration::ZERO,
                max_passes: Some(3),
            },
            &notifier,
        )
        .unwrap();
        assert_eq!(passes, 3);
        assert_eq!(notifier.posts.borrow().len(), 3);
    }
}
