use std::env;
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

pub mod registry;

pub use registry::{UserEntry, load_registry, parse_registry};

// ── Post mode ─────────────────────────────────────────────────────────────────

/// How a user's report is delivered to the channel.
///
/// | Mode       | Behaviour                                                   |
/// |------------|-------------------------------------------------------------|
/// | `per_line` | Header and every chain line are posted as separate messages.|
/// | `combined` | All lines are joined and posted in as few messages as fit.  |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostMode {
    #[default]
    PerLine,
    Combined,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Registry of users to watch, one `First Last /base/dir` per line.
    pub users_file: String,
    /// Hours to sleep between passes in continuous mode.
    pub interval_hours: f64,
    /// Lookback window in hours; a chain file modified within it counts as live.
    pub window_hours: f64,
    /// Treat zero-length chain files as not fresh.
    pub require_nonempty: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            users_file: "users.txt".to_string(),
            interval_hours: 1.0,
            window_hours: 1.0,
            require_nonempty: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Base URL for the Slack Web API.  Overridden at runtime by the
    /// `SLACK_API_BASE_URL` environment variable when set.
    pub api_base_url: String,
    pub post_mode: PostMode,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://slack.com/api".to_string(),
            post_mode: PostMode::PerLine,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub slack: SlackConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = match fs::read_to_string(path) {
            Ok(raw) => toml::from_str(&raw)
                .with_context(|| format!("invalid config file {}", path.display()))?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read config file {}", path.display()));
            }
        };

        if let Ok(value) = env::var("SLACK_API_BASE_URL") {
            if !value.is_empty() {
                config.slack.api_base_url = value;
            }
        }

        Ok(config)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
