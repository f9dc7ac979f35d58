//! Application configuration for RosterLink.
//!
//! User config lives at `~/.rosterlink/rosterlink.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RosterLinkError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "rosterlink.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".rosterlink";

// ---------------------------------------------------------------------------
// Config structs (matching rosterlink.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory service (Slack) settings.
    #[serde(default)]
    pub slack: SlackConfig,

    /// Remote store (Airtable) settings.
    #[serde(default)]
    pub airtable: AirtableConfig,

    /// Search engine settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Local output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[slack]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Name of the env var holding the bot token (never store the token itself).
    #[serde(default = "default_slack_token_env")]
    pub token_env: String,

    /// Web API base URL.
    #[serde(default = "default_slack_api_url")]
    pub api_url: String,

    /// Members requested per `users.list` page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token_env: default_slack_token_env(),
            api_url: default_slack_api_url(),
            page_size: default_page_size(),
        }
    }
}

fn default_slack_token_env() -> String {
    "SLACK_BOT_TOKEN".into()
}
fn default_slack_api_url() -> String {
    "https://slack.com/api".into()
}
fn default_page_size() -> u32 {
    200
}

/// `[airtable]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirtableConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_airtable_key_env")]
    pub api_key_env: String,

    /// REST API base URL.
    #[serde(default = "default_airtable_api_url")]
    pub api_url: String,

    /// Target base identifier (`app...`).
    #[serde(default)]
    pub base_id: String,

    /// Target table name.
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_airtable_key_env(),
            api_url: default_airtable_api_url(),
            base_id: String::new(),
            table_name: default_table_name(),
            timeout_secs: default_request_timeout(),
        }
    }
}

fn default_airtable_key_env() -> String {
    "AIRTABLE_API_KEY".into()
}
fn default_airtable_api_url() -> String {
    "https://api.airtable.com".into()
}
fn default_table_name() -> String {
    "Members".into()
}
fn default_request_timeout() -> u64 {
    30
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search engine origin; queries go to `<base_url>/search?q=...`.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// CSS selector for a single organic result container.
    #[serde(default = "default_result_selector")]
    pub result_selector: String,

    /// Minimum ms to wait before each search request.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    /// Deadline for a fallback query's result page.
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,

    /// Overrides the default User-Agent header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            result_selector: default_result_selector(),
            rate_limit_ms: default_rate_limit(),
            timeout_secs: default_request_timeout(),
            wait_timeout_secs: default_wait_timeout(),
            user_agent: None,
        }
    }
}

fn default_search_base_url() -> String {
    "https://www.google.com".into()
}
fn default_result_selector() -> String {
    ".g".into()
}
fn default_rate_limit() -> u64 {
    1000
}
fn default_wait_timeout() -> u64 {
    30
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// CSV export destination.
    #[serde(default = "default_csv_path")]
    pub csv_path: String,

    /// Optional JSON member snapshot (parsed fields only), written before resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members_snapshot: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            members_snapshot: None,
        }
    }
}

fn default_csv_path() -> String {
    "Output/linkedin_profiles.csv".into()
}

// ---------------------------------------------------------------------------
// Runtime options (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime search configuration.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub base_url: String,
    pub result_selector: String,
    pub rate_limit_ms: u64,
    pub timeout_secs: u64,
    pub wait_timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl From<&AppConfig> for SearchOptions {
    fn from(config: &AppConfig) -> Self {
        let search = &config.search;
        Self {
            base_url: search.base_url.clone(),
            result_selector: search.result_selector.clone(),
            rate_limit_ms: search.rate_limit_ms,
            timeout_secs: search.timeout_secs,
            wait_timeout_secs: search.wait_timeout_secs,
            user_agent: search.user_agent.clone(),
        }
    }
}

/// Secrets read from the environment for a single run.
#[derive(Clone)]
pub struct Credentials {
    pub slack_token: String,
    pub airtable_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("slack_token", &"<redacted>")
            .field("airtable_api_key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.rosterlink/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RosterLinkError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.rosterlink/rosterlink.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RosterLinkError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        RosterLinkError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| RosterLinkError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RosterLinkError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| RosterLinkError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read both secrets from the env vars named in the config.
pub fn resolve_credentials(config: &AppConfig) -> Result<Credentials> {
    Ok(Credentials {
        slack_token: read_secret(&config.slack.token_env, "Slack bot token")?,
        airtable_api_key: read_secret(&config.airtable.api_key_env, "Airtable API key")?,
    })
}

fn read_secret(var_name: &str, what: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(RosterLinkError::config(format!(
            "{what} not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Check that the remote store target is fully specified.
pub fn validate_store_target(config: &AppConfig) -> Result<()> {
    if config.airtable.base_id.trim().is_empty() {
        return Err(RosterLinkError::config(
            "Airtable base id is not set. Pass --base-id or set [airtable].base_id.",
        ));
    }
    if config.airtable.table_name.trim().is_empty() {
        return Err(RosterLinkError::config("Airtable table name is empty"));
    }
    Ok(())
}
