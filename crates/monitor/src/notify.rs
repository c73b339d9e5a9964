//! Collaborator seams: where messages go and how names become chat ids.

use anyhow::Result;

use crate::error::LookupError;

/// Delivers message text to a named channel.
pub trait Notifier {
    fn post(&self, channel: &str, text: &str) -> Result<()>;
}

/// Maps a registry display name to the opaque id used in mention tokens.
pub trait UserDirectory {
    fn resolve(&self, display_name: &str) -> Result<String, LookupError>;
}
