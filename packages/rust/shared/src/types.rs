//! Core domain types for RosterLink runs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Rendered value of a profile URL that could not be located.
pub const NOT_FOUND: &str = "Not found";

/// Rendered value of a profile URL whose lookup failed.
pub const LOOKUP_ERROR: &str = "Error";

// ---------------------------------------------------------------------------
// Member
// ---------------------------------------------------------------------------

/// A workspace member as returned by the directory service (Slack `users.list`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Directory-assigned identifier.
    pub id: String,
    /// Display name; absent for some service accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    /// Set for bot and app users.
    #[serde(rename = "is_bot", default)]
    pub is_automated: bool,
    #[serde(default)]
    pub profile: MemberProfile,
}

/// Profile fields carried through to the enriched record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "image_512", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Member {
    /// The member's display name, or an empty string when absent.
    pub fn name(&self) -> &str {
        self.real_name.as_deref().unwrap_or_default()
    }

    /// The member's email, or an empty string when absent.
    pub fn email(&self) -> &str {
        self.profile.email.as_deref().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// ProfileUrl / ResolutionResult
// ---------------------------------------------------------------------------

/// Outcome of a profile lookup.
///
/// `NotFound` and `Error` are ordinary outcomes and render as the literal
/// strings `"Not found"` and `"Error"` wherever a URL would go.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProfileUrl {
    Found(String),
    NotFound,
    Error,
}

impl ProfileUrl {
    /// Wrap an extracted href. Blank hrefs become `NotFound`.
    pub fn found(href: impl Into<String>) -> Self {
        let href = href.into();
        if href.trim().is_empty() {
            Self::NotFound
        } else {
            Self::Found(href)
        }
    }

    /// The value as written to the store and the export.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Found(url) => url,
            Self::NotFound => NOT_FOUND,
            Self::Error => LOOKUP_ERROR,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl fmt::Display for ProfileUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ProfileUrl {
    fn from(value: &str) -> Self {
        match value {
            NOT_FOUND => Self::NotFound,
            LOOKUP_ERROR => Self::Error,
            other => Self::found(other),
        }
    }
}

impl Serialize for ProfileUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProfileUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// Result of resolving one eligible member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub name: String,
    pub profile_url: ProfileUrl,
}

// ---------------------------------------------------------------------------
// EnrichedRecord
// ---------------------------------------------------------------------------

/// A member's profile fields joined with the resolved profile URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub name: String,
    pub description: String,
    pub contact: String,
    pub picture: String,
    pub profile_url: ProfileUrl,
}

impl EnrichedRecord {
    /// Join a member with its resolution result.
    pub fn from_resolution(member: &Member, result: ResolutionResult) -> Self {
        let profile = &member.profile;
        Self {
            name: result.name,
            description: profile.title.clone().unwrap_or_default(),
            contact: profile.email.clone().unwrap_or_default(),
            picture: profile.image_url.clone().unwrap_or_default(),
            profile_url: result.profile_url,
        }
    }
}

/// Identifier assigned by the remote store to a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RunId / RunSummary
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a completed end-to-end run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub team_name: String,
    /// Members returned by the directory, before filtering.
    pub members_total: usize,
    pub records: Vec<EnrichedRecord>,
    /// Link to the remote store holding the persisted records.
    pub store_link: String,
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub elapsed: std::time::Duration,
}

impl RunSummary {
    pub fn found(&self) -> usize {
        self.records.iter().filter(|r| r.profile_url.is_found()).count()
    }

    pub fn not_found(&self) -> usize {
        self.count(&ProfileUrl::NotFound)
    }

    pub fn errors(&self) -> usize {
        self.count(&ProfileUrl::Error)
    }

    fn count(&self, outcome: &ProfileUrl) -> usize {
        self.records.iter().filter(|r| &r.profile_url == outcome).count()
    }
}

mod duration_millis {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        value: &std::time::Duration,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u128(value.as_millis())
    }
}
