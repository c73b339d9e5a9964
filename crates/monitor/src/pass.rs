//! One pass: discovery → freshness → summary → report, for every user.
//!
//! [`plan_pass`] is a pure function of the settings, the filesystem and the
//! supplied clock reading; [`run_pass`] pairs it with delivery.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use chainwatch_config::PostMode;

use crate::discovery::find_chain_files;
use crate::freshness::is_fresh_at;
use crate::notify::Notifier;
use crate::report::{ChainEntry, ChainStatus, format_report, pack_lines};
use crate::summary::summarize_chain;

/// Per-message cap for combined reports.
const COMBINED_CHUNK_CHARS: usize = 3500;

/// Immutable per-process settings shared by every pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub channel: String,
    /// Lookback window in hours, as configured (also shown in messages).
    pub window_hours: f64,
    pub require_nonempty: bool,
    pub post_mode: PostMode,
}

impl Settings {
    pub fn window(&self) -> Duration {
        Duration::try_from_secs_f64(self.window_hours * 3600.0).unwrap_or(Duration::ZERO)
    }
}

/// Convert a user-supplied hour count into a `Duration`, rejecting values
/// that are not finite and strictly positive.
pub fn hours_to_duration(label: &str, hours: f64) -> Result<Duration> {
    if !hours.is_finite() || hours <= 0.0 {
        bail!("{label} must be a positive number of hours, got {hours}");
    }
    Ok(Duration::try_from_secs_f64(hours * 3600.0)?)
}

/// A registry user whose mention id has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedUser {
    pub display_name: String,
    /// Mention token embedded in message text, e.g. `<@U024BE7LH>`.
    pub mention: String,
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub channel: String,
    pub text: String,
}

/// Fresh chain files for `user`, each summarized, in discovery order.
pub fn collect_entries(user: &WatchedUser, settings: &Settings, now: SystemTime) -> Vec<ChainEntry> {
    let window = settings.window();
    find_chain_files(&user.base_dir)
        .into_iter()
        .filter(|path| is_fresh_at(path, window, settings.require_nonempty, now))
        .map(|path| {
            let status = summarize_chain(&path);
            match &status {
                ChainStatus::Summary(summary) => debug!(
                    user = %user.display_name,
                    path = %path.display(),
                    rows = summary.rows,
                    acceptance = summary.acceptance_rate,
                    "pass: summarized chain"
                ),
                ChainStatus::Unreadable(reason) => warn!(
                    user = %user.display_name,
                    path = %path.display(),
                    %reason,
                    "pass: chain file unreadable"
                ),
            }
            ChainEntry { path, status }
        })
        .collect()
}

/// Compute every message one pass would send, in send order.
pub fn plan_pass(settings: &Settings, users: &[WatchedUser], now: SystemTime) -> Vec<Dispatch> {
    let mut dispatches = Vec::new();
    for user in users {
        let entries = collect_entries(user, settings, now);
        let lines = format_report(&user.mention, settings.window_hours, &entries);
        let texts = match settings.post_mode {
            PostMode::PerLine => lines,
            PostMode::Combined => pack_lines(&lines, COMBINED_CHUNK_CHARS),
        };
        dispatches.extend(texts.into_iter().map(|text| Dispatch {
            channel: settings.channel.clone(),
            text,
        }));
    }
    dispatches
}

/// Run one pass against the current clock and post its messages in order.
///
/// A delivery failure is returned immediately; nothing is retried.
pub fn run_pass(settings: &Settings, users: &[WatchedUser], notifier: &dyn Notifier) -> Result<()> {
    info!(users = users.len(), channel = %settings.channel, "pass: starting");
    let dispatches = plan_pass(settings, users, SystemTime::now());
    for dispatch in &dispatches {
        notifier.post(&dispatch.channel, &dispatch.text)?;
    }
    info!(messages = dispatches.len(), "pass: complete");
    Ok(())
}
