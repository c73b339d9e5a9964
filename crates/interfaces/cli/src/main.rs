mod dry_run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chainwatch_config::{AppConfig, load_registry};
use chainwatch_monitor::{RunMode, Settings, hours_to_duration, resolve_users, run};
use chainwatch_slack::SlackClient;

use crate::dry_run::{EchoDirectory, StdoutNotifier};

#[derive(Debug, Parser)]
#[command(
    name = "chainwatch",
    version,
    about = "Post the status of recently updated MCMC chains to a Slack channel"
)]
struct Cli {
    /// Channel to post reports to, e.g. `#mcmc_monitor`.
    #[arg(long, short = 'c')]
    channel: String,
    /// User registry file (`First Last /base/dir` per line).
    #[arg(long, short = 'u', value_name = "PATH")]
    users: Option<PathBuf>,
    /// Hours to sleep between passes in continuous mode.
    #[arg(long, value_name = "HOURS")]
    interval: Option<f64>,
    /// Lookback window in hours for counting a chain as live.
    #[arg(long, value_name = "HOURS")]
    window: Option<f64>,
    #[arg(long, value_enum, default_value = "once")]
    mode: CliRunMode,
    /// Stop continuous mode after exactly one pass.
    #[arg(long)]
    test: bool,
    /// Ignore zero-length chain files.
    #[arg(long)]
    require_nonempty: bool,
    #[arg(long, value_name = "PATH", default_value = "config/default.toml")]
    config: PathBuf,
    /// Print messages to stdout instead of posting them.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliRunMode {
    /// One pass per invocation (cron / scheduled job).
    Once,
    /// Pass, sleep `--interval`, repeat.
    Continuous,
}

/// Everything resolved from flags and config before any I/O against users.
#[derive(Debug)]
struct RunPlan {
    settings: Settings,
    mode: RunMode,
    users_file: PathBuf,
}

fn build_run_plan(cli: &Cli, config: &AppConfig) -> Result<RunPlan> {
    let window_hours = cli.window.unwrap_or(config.monitor.window_hours);
    hours_to_duration("--window", window_hours)?;

    let mode = match cli.mode {
        CliRunMode::Once => {
            if cli.test {
                warn!("--test only applies to continuous mode; running a single pass");
            }
            RunMode::SinglePass
        }
        CliRunMode::Continuous => {
            let interval_hours = cli.interval.unwrap_or(config.monitor.interval_hours);
            RunMode::Continuous {
                interval: hours_to_duration("--interval", interval_hours)?,
                max_passes: cli.test.then_some(1),
            }
        }
    };

    Ok(RunPlan {
        settings: Settings {
            channel: cli.channel.clone(),
            window_hours,
            require_nonempty: cli.require_nonempty || config.monitor.require_nonempty,
            post_mode: config.slack.post_mode,
        },
        mode,
        users_file: cli
            .users
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.monitor.users_file)),
    })
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)?;
    init_tracing(&config.telemetry.log_level);

    let plan = build_run_plan(&cli, &config)?;
    let entries = load_registry(&plan.users_file)?;
    info!(
        users = entries.len(),
        registry = %plan.users_file.display(),
        mode = ?plan.mode,
        "chainwatch starting"
    );

    let passes = if cli.dry_run {
        let users = resolve_users(&EchoDirectory, &entries)?;
        run(&plan.settings, &users, plan.mode, &StdoutNotifier)?
    } else {
        let slack = SlackClient::from_env(&config.slack.api_base_url)
            .context("cannot post without a Slack token (use --dry-run to print instead)")?;
        slack.auth_test()?;
        let directory = slack.fetch_directory()?;
        let users = resolve_users(&directory, &entries)?;
        run(&plan.settings, &users, plan.mode, &slack)?
    };

    info!(passes, "chainwatch finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chainwatch_config::PostMode;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("chainwatch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn channel_is_required() {
        assert!(Cli::try_parse_from(["chainwatch"]).is_err());
    }

    #[test]
    fn defaults_to_single_pass_with_config_values() {
        let cli = parse(&["--channel", "#mcmc_monitor"]);
        let plan = build_run_plan(&cli, &AppConfig::default()).unwrap();
        assert_eq!(plan.mode, RunMode::SinglePass);
        assert_eq!(plan.users_file, PathBuf::from("users.txt"));
        assert_eq!(
            plan.settings,
            Settings {
                channel: "#mcmc_monitor".to_string(),
                window_hours: 1.0,
                require_nonempty: false,
                post_mode: PostMode::PerLine,
            }
        );
    }

    #[test]
    fn flags_override_config() {
        let mut config = AppConfig::default();
        config.slack.post_mode = PostMode::Combined;
        let cli = parse(&[
            "-c",
            "#runs",
            "--users",
            "/etc/team.txt",
            "--window",
            "2.5",
            "--require-nonempty",
        ]);
        let plan = build_run_plan(&cli, &config).unwrap();
        assert_eq!(plan.users_file, PathBuf::from("/etc/team.txt"));
        assert_eq!(plan.settings.window_hours, 2.5);
        assert!(plan.settings.require_nonempty);
        assert_eq!(plan.settings.post_mode, PostMode::Combined);
    }

    #[test]
    fn continuous_mode_uses_interval_and_test_flag() {
        let cli = parse(&["-c", "#runs", "--mode", "continuous", "--interval", "0.5", "--test"]);
        let plan = build_run_plan(&cli, &AppConfig::default()).unwrap();
        assert_eq!(
            plan.mode,
            RunMode::Continuous {
                interval: Duration::from_secs(1800),
                max_passes: Some(1),
            }
        );
    }

    #[test]
    fn continuous_mode_without_test_flag_is_unbounded() {
        let cli = parse(&["-c", "#runs", "--mode", "continuous"]);
        let plan = build_run_plan(&cli, &AppConfig::default()).unwrap();
        assert_eq!(
            plan.mode,
            RunMode::Continuous {
                interval: Duration::from_secs(3600),
                max_passes: None,
            }
        );
    }

    #[test]
    fn zero_window_is_rejected() {
        let cli = parse(&["-c", "#runs", "--window", "0"]);
        assert!(build_run_plan(&cli, &AppConfig::default()).is_err());
    }

    #[test]
    fn zero_interval_is_rejected_in_continuous_mode() {
        let cli = parse(&["-c", "#runs", "--mode", "continuous", "--interval", "0"]);
        assert!(build_run_plan(&cli, &AppConfig::default()).is_err());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["chainwatch", "-c", "#runs", "--mode", "forever"]).is_err());
    }
}
