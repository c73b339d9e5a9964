//! Offline collaborators for `--dry-run`: print instead of post.

use std::io::{self, Write};

use anyhow::Result;

use chainwatch_monitor::{LookupError, Notifier, UserDirectory};

/// Writes each message to stdout, prefixed with its channel.
pub(crate) struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn post(&self, channel: &str, text: &str) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "[{channel}] {text}")?;
        Ok(())
    }
}

/// Resolves every name to itself so mentions render as `<@Jane Doe>`.
pub(crate) struct EchoDirectory;

impl UserDirectory for EchoDirectory {
    fn resolve(&self, display_name: &str) -> Result<String, LookupError> {
        Ok(display_name.to_string())
    }
}
