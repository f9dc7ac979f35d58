//! Slack Web API directory client (`users.list`, `team.info`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rosterlink_shared::{Member, Result, RosterLinkError, SlackConfig};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::DirectoryService;

/// User-Agent string for directory requests.
const USER_AGENT: &str = concat!("RosterLink/", env!("CARGO_PKG_VERSION"));

/// Default timeout in seconds for a single Web API call.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error codes Slack uses for a bad or revoked token.
const AUTH_ERRORS: &[&str] = &[
    "invalid_auth",
    "not_authed",
    "account_inactive",
    "token_revoked",
    "token_expired",
    "missing_scope",
];

/// Upper bound on pages fetched from `users.list`, guarding against a
/// cursor that never drains.
const MAX_PAGES: usize = 1000;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Connection settings for [`SlackDirectory`].
#[derive(Debug, Clone)]
pub struct SlackOptions {
    /// Web API base URL (no trailing slash).
    pub api_url: String,
    /// Members per `users.list` page.
    pub page_size: u32,
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl Default for SlackOptions {
    fn default() -> Self {
        Self::from(&SlackConfig::default())
    }
}

impl From<&SlackConfig> for SlackOptions {
    fn from(config: &SlackConfig) -> Self {
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            page_size: config.page_size.max(1),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Status fields shared by every Web API response.
#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsersPage {
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct TeamInfo {
    team: Team,
}

#[derive(Debug, Deserialize)]
struct Team {
    name: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Directory backed by a Slack workspace, authenticated with a bot token.
pub struct SlackDirectory {
    client: Client,
    token: String,
    opts: SlackOptions,
}

impl SlackDirectory {
    /// Build a client for the workspace the token belongs to.
    pub fn new(token: impl Into<String>, opts: SlackOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| {
                RosterLinkError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            token: token.into(),
            opts,
        })
    }

    /// Call a Web API method and unwrap its envelope.
    async fn call<T: DeserializeOwned>(&self, method: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{method}", self.opts.api_url);
        debug!(%url, "calling slack method");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| RosterLinkError::Network(format!("{method}: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("?")
                .to_string();
            return Err(RosterLinkError::Directory(format!(
                "{method}: rate limited (retry after {retry_after}s)"
            )));
        }
        if !status.is_success() {
            return Err(RosterLinkError::Directory(format!("{method}: HTTP {status}")));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RosterLinkError::parse(format!("{method}: {e}")))?;

        let envelope: Envelope = serde_json::from_value(body.clone())
            .map_err(|e| RosterLinkError::parse(format!("{method}: {e}")))?;

        if !envelope.ok {
            let code = envelope.error.unwrap_or_else(|| "unknown_error".into());
            if AUTH_ERRORS.contains(&code.as_str()) {
                return Err(RosterLinkError::auth("slack", code));
            }
            return Err(RosterLinkError::Directory(format!("{method}: {code}")));
        }

        serde_json::from_value(body)
            .map_err(|e| RosterLinkError::parse(format!("{method}: unexpected payload: {e}")))
    }
}

#[async_trait]
impl DirectoryService for SlackDirectory {
    #[instrument(skip_all)]
    async fn list_members(&self) -> Result<Vec<Member>> {
        let mut members = Vec::new();
        let mut cursor = String::new();

        for page in 1..=MAX_PAGES {
            let mut query = vec![("limit", self.opts.page_size.to_string())];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.clone()));
            }

            let batch: UsersPage = self.call("users.list", &query).await?;
            debug!(page, count = batch.members.len(), "received member page");
            members.extend(batch.members);

            cursor = batch
                .response_metadata
                .map(|m| m.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                info!(members = members.len(), pages = page, "member roster collected");
                return Ok(members);
            }
        }

        Err(RosterLinkError::Directory(format!(
            "users.list: cursor did not drain after {MAX_PAGES} pages"
        )))
    }

    #[instrument(skip_all)]
    async fn team_name(&self) -> Result<String> {
        let info: TeamInfo = self.call("team.info", &[]).await?;
        Ok(info.team.name)
    }
}
