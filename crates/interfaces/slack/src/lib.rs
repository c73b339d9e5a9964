use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use chainwatch_monitor::{LookupError, Notifier, UserDirectory};

const USERS_PAGE_LIMIT: &str = "200";

#[derive(Error, Debug)]
pub enum SlackError {
    #[error("SLACK_TOKEN is not set")]
    MissingToken,
    #[error("slack request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("slack {method} returned an unexpected payload: {source}")]
    Decode {
        method: String,
        source: serde_json::Error,
    },
    /// The API answered `ok: false`.
    #[error("slack {method} failed: {error}")]
    Api { method: String, error: String },
}

/// Bot identity reported by `auth.test`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthIdentity {
    pub user_id: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub team: String,
}

/// Minimal Slack Web API client over blocking HTTP.
#[derive(Debug, Clone)]
pub struct SlackClient {
    client: Client,
    base_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, SlackError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SlackError::MissingToken);
        }
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Build a client from the `SLACK_TOKEN` environment variable.
    pub fn from_env(base_url: impl Into<String>) -> Result<Self, SlackError> {
        let token = std::env::var("SLACK_TOKEN").map_err(|_| SlackError::MissingToken)?;
        Self::new(base_url, token)
    }

    /// Validate the token and report who the bot is.
    pub fn auth_test(&self) -> Result<AuthIdentity, SlackError> {
        let method = "auth.test";
        let response = self
            .client
            .post(self.method_url(method))
            .bearer_auth(&self.token)
            .send()?
            .error_for_status()?;
        let identity: AuthIdentity = decode_response(method, response.json()?)?;
        info!(bot_user = %identity.user_id, team = %identity.team, "slack: authenticated");
        Ok(identity)
    }

    /// Page through `users.list` once and index members by real name.
    pub fn fetch_directory(&self) -> Result<SlackDirectory, SlackError> {
        let method = "users.list";
        let mut members = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("limit", USERS_PAGE_LIMIT)];
            if let Some(cursor) = &cursor {
                query.push(("cursor", cursor.as_str()));
            }
            let response = self
                .client
                .get(self.method_url(method))
                .bearer_auth(&self.token)
                .query(&query)
                .send()?
                .error_for_status()?;
            let page: UsersListPage = decode_response(method, response.json()?)?;
            match absorb_page(&mut members, page) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(members = members.len(), "slack: fetched user directory");
        Ok(SlackDirectory::from_members(members))
    }

    pub fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError> {
        let method = "chat.postMessage";
        let body = PostMessageRequest {
            channel,
            text,
            link_names: true,
        };

        let response = self
            .client
            .post(self.method_url(method))
            .bearer_auth(&self.token)
            .json(&body)
            .send()?
            .error_for_status()?;
        let _: serde_json::Value = decode_response(method, response.json()?)?;
        debug!(channel, len = text.len(), "slack: message posted");
        Ok(())
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }
}

impl Notifier for SlackClient {
    fn post(&self, channel: &str, text: &str) -> anyhow::Result<()> {
        self.post_message(channel, text)?;
        Ok(())
    }
}

/// Snapshot of workspace members keyed by profile real name.
#[derive(Debug, Clone, Default)]
pub struct SlackDirectory {
    by_real_name: HashMap<String, String>,
}

impl SlackDirectory {
    /// Deleted accounts and bots are left out; the first member carrying a
    /// given real name wins.
    pub fn from_members(members: impl IntoIterator<Item = SlackMember>) -> Self {
        let mut by_real_name = HashMap::new();
        for member in members {
            if member.deleted || member.is_bot || member.profile.real_name.is_empty() {
                continue;
            }
            by_real_name
                .entry(member.profile.real_name)
                .or_insert(member.id);
        }
        Self { by_real_name }
    }

    pub fn len(&self) -> usize {
        self.by_real_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_real_name.is_empty()
    }
}

impl UserDirectory for SlackDirectory {
    fn resolve(&self, display_name: &str) -> Result<String, LookupError> {
        self.by_real_name
            .get(display_name)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(display_name.to_string()))
    }
}

/// Append a `users.list` page to `members`, returning the cursor for the
/// next page or `None` when this was the last one.
fn absorb_page(members: &mut Vec<SlackMember>, page: UsersListPage) -> Option<String> {
    members.extend(page.members);
    page.response_metadata
        .map(|meta| meta.next_cursor)
        .filter(|cursor| !cursor.is_empty())
}

/// Check the `ok` flag on a Web API payload, then decode the method's body.
fn decode_response<T: DeserializeOwned>(
    method: &str,
    payload: serde_json::Value,
) -> Result<T, SlackError> {
    let decode_err = |source| SlackError::Decode {
        method: method.to_string(),
        source,
    };
    let envelope: SlackEnvelope = serde_json::from_value(payload.clone()).map_err(decode_err)?;
    if !envelope.ok {
        return Err(SlackError::Api {
            method: method.to_string(),
            error: envelope.error.unwrap_or_else(|| "unknown_error".to_string()),
        });
    }
    serde_json::from_value(payload).map_err(decode_err)
}

#[derive(Debug, Deserialize)]
struct SlackEnvelope {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsersListPage {
    #[serde(default)]
    members: Vec<SlackMember>,
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackMember {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub profile: SlackProfile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackProfile {
    #[serde(default)]
    pub real_name: String,
}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    link_names: bool,
}
