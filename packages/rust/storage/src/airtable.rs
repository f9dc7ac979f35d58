//! Airtable REST client: one record per create call.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use rosterlink_shared::{AirtableConfig, EnrichedRecord, RecordId, Result, RosterLinkError};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

/// User-Agent string for store requests.
const USER_AGENT: &str = concat!("RosterLink/", env!("CARGO_PKG_VERSION"));

/// Public web origin used to build the link handed back to users.
const WEB_ORIGIN: &str = "https://airtable.com";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Column layout shared by the remote table and the CSV export.
#[derive(Debug, Serialize)]
struct RecordFields<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Contact")]
    contact: &'a str,
    #[serde(rename = "Picture")]
    picture: &'a str,
    #[serde(rename = "LinkedIn")]
    linkedin: &'a str,
}

impl<'a> From<&'a EnrichedRecord> for RecordFields<'a> {
    fn from(record: &'a EnrichedRecord) -> Self {
        Self {
            name: &record.name,
            description: &record.description,
            contact: &record.contact,
            picture: &record.picture,
            linkedin: record.profile_url.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    records: [NewRecord<'a>; 1],
}

#[derive(Debug, Serialize)]
struct NewRecord<'a> {
    fields: RecordFields<'a>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    records: Vec<CreatedRecord>,
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    id: String,
}

// ---------------------------------------------------------------------------
// AirtableStore
// ---------------------------------------------------------------------------

/// Writes enriched records into a single Airtable table.
pub struct AirtableStore {
    client: Client,
    api_key: String,
    table_url: Url,
    base_id: String,
}

impl AirtableStore {
    /// Build a store for `<api_url>/v0/<base_id>/<table_name>`.
    pub fn new(api_key: impl Into<String>, config: &AirtableConfig) -> Result<Self> {
        let mut table_url = Url::parse(&config.api_url).map_err(|e| {
            RosterLinkError::config(format!("invalid Airtable api url '{}': {e}", config.api_url))
        })?;
        table_url
            .path_segments_mut()
            .map_err(|_| RosterLinkError::config("Airtable api url cannot be a base"))?
            .pop_if_empty()
            .extend(["v0", config.base_id.as_str(), config.table_name.as_str()]);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                RosterLinkError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            table_url,
            base_id: config.base_id.clone(),
        })
    }

    /// Link to the base in the Airtable web UI.
    pub fn web_link(&self) -> String {
        format!("{WEB_ORIGIN}/{}", self.base_id)
    }

    /// Confirm the key can read the target table.
    #[instrument(skip_all, fields(table = %self.table_url))]
    pub async fn verify(&self) -> Result<()> {
        let response = self
            .client
            .get(self.table_url.as_str())
            .bearer_auth(&self.api_key)
            .query(&[("maxRecords", "1")])
            .send()
            .await
            .map_err(|e| RosterLinkError::Network(format!("airtable: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!("airtable table reachable");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }

    /// Create one record and return its id.
    #[instrument(skip_all, fields(name = %record.name))]
    pub async fn create(&self, record: &EnrichedRecord) -> Result<RecordId> {
        let request = CreateRequest {
            records: [NewRecord {
                fields: RecordFields::from(record),
            }],
        };

        let response = self
            .client
            .post(self.table_url.as_str())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RosterLinkError::Network(format!("airtable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let created: CreateResponse = response
            .json()
            .await
            .map_err(|e| RosterLinkError::parse(format!("airtable create response: {e}")))?;

        let id = created
            .records
            .into_iter()
            .next()
            .map(|r| RecordId(r.id))
            .ok_or_else(|| RosterLinkError::parse("airtable created no records"))?;

        debug!(record_id = %id, "record created");
        Ok(id)
    }
}

/// Map a failed response to an error, treating 401/403 as a credential rejection.
fn status_error(status: StatusCode, body: String) -> RosterLinkError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RosterLinkError::auth("airtable", format!("HTTP {status}"))
        }
        _ if body.is_empty() => RosterLinkError::Storage(format!("airtable: HTTP {status}")),
        _ => RosterLinkError::Storage(format!("airtable: HTTP {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosterlink_shared::ProfileUrl;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> AirtableConfig {
        AirtableConfig {
            api_url: server.uri(),
            base_id: "appTEST".into(),
            table_name: "Team Members".into(),
            timeout_secs: 5,
            ..AirtableConfig::default()
        }
    }

    fn record() -> EnrichedRecord {
        EnrichedRecord {
            name: "Ada Lovelace".into(),
            description: "Analyst".into(),
            contact: "ada@analytical.engines.org".into(),
            picture: "https://avatars.example.com/ada_512.png".into(),
            profile_url: ProfileUrl::NotFound,
        }
    }

    #[test]
    fn test_table_url_encodes_segments() {
        let config = AirtableConfig {
            api_url: "https://api.airtable.com/".into(),
            base_id: "appXYZ".into(),
            table_name: "Team Members".into(),
            ..AirtableConfig::default()
        };
        let store = AirtableStore::new("key", &config).unwrap();
        assert_eq!(
            store.table_url.as_str(),
            "https://api.airtable.com/v0/appXYZ/Team%20Members"
        );
        assert_eq!(store.web_link(), "https://airtable.com/appXYZ");
    }

    #[tokio::test]
    async fn test_create_sends_fields() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v0/appTEST/Team%20Members"))
            .and(header("authorization", "Bearer pat-test"))
            .and(body_json(serde_json::json!({
                "records": [{
                    "fields": {
                        "Name": "Ada Lovelace",
                        "Description": "Analyst",
                        "Contact": "ada@analytical.engines.org",
                        "Picture": "https://avatars.example.com/ada_512.png",
                        "LinkedIn": "Not found"
                    }
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "records": [{"id": "recABC123", "createdTime": "2026-01-01T00:00:00.000Z", "fields": {}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = AirtableStore::new("pat-test", &config_for(&server)).unwrap();
        let id = store.create(&record()).await.unwrap();
        assert_eq!(id, RecordId("recABC123".into()));
    }

    #[tokio::test]
    async fn test_create_unauthorized_is_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"type": "AUTHENTICATION_REQUIRED"}
            })))
            .mount(&server)
            .await;

        let store = AirtableStore::new("bad", &config_for(&server)).unwrap();
        let err = store.create(&record()).await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_create_rejected_is_storage_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("UNKNOWN_FIELD_NAME"))
            .mount(&server)
            .await;

        let store = AirtableStore::new("pat-test", &config_for(&server)).unwrap();
        let err = store.create(&record()).await.unwrap_err();
        assert!(matches!(err, RosterLinkError::Storage(ref m) if m.contains("UNKNOWN_FIELD_NAME")));
    }

    #[tokio::test]
    async fn test_verify() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v0/appTEST/Team%20Members"))
            .and(query_param("maxRecords", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"records": []})))
            .mount(&server)
            .await;

        let store = AirtableStore::new("pat-test", &config_for(&server)).unwrap();
        store.verify().await.unwrap();
    }

    #[tokio::test]
    async fn test_verify_forbidden() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let store = AirtableStore::new("pat-test", &config_for(&server)).unwrap();
        assert!(store.verify().await.unwrap_err().is_auth());
    }
}
