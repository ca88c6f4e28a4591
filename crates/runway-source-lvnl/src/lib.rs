// # LVNL Runway Usage Source
//
// This crate provides the LVNL runway-usage endpoint as a source for the
// runway alert system.
//
// ## Protocol
//
// One HTTP POST per fetch. The body is the requested minute as a JSON array
// of five integers in fixed order:
//
// ```text
// POST <endpoint>
// Content-Type: application/json
//
// [2019,5,1,13,7]
// ```
//
// The response is a single JSON object:
//
// ```json
// {
//   "Id": 123456,
//   "Updated": "2019-05-01T13:05:00",
//   "Start": "2019-05-01T13:00:00",
//   "End": "2019-05-01T13:20:00",
//   "Landing1": "18R", "Landing2": "06", "Landing3": "",
//   "Takeoff1": "24",  "Takeoff2": "",   "Takeoff3": "",
//   "State": "Actual",
//   "isLast": true
// }
// ```
//
// ## Errors
//
// - Transport failure, timeout or non-2xx status: `Error::SourceUnavailable`
// - Body that does not match the shape above: `Error::SourceMalformed`
//
// No retries: the next scheduled tick is the retry.

use runway_core::ComponentRegistry;
use runway_core::config::SourceConfig;
use runway_core::traits::{Snapshot, SnapshotRequest, SourceClient, SourceClientFactory};
use runway_core::{Error, Result};

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::time::Duration;

/// Default HTTP timeout for runway usage requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Timestamp layouts accepted when the value carries no offset
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// Raw response body
#[derive(Debug, Deserialize)]
struct RunwayUsageResponse {
    #[serde(rename = "Id")]
    id: i64,
    #[serde(rename = "Updated")]
    updated: String,
    #[serde(rename = "Start")]
    start: String,
    #[serde(rename = "End")]
    end: String,
    #[serde(rename = "Landing1", default)]
    landing1: Option<String>,
    #[serde(rename = "Landing2", default)]
    landing2: Option<String>,
    #[serde(rename = "Landing3", default)]
    landing3: Option<String>,
    #[serde(rename = "Takeoff1", default)]
    takeoff1: Option<String>,
    #[serde(rename = "Takeoff2", default)]
    takeoff2: Option<String>,
    #[serde(rename = "Takeoff3", default)]
    takeoff3: Option<String>,
    #[serde(rename = "State", default)]
    state: Option<String>,
    #[serde(rename = "isLast", default)]
    is_last: bool,
}

/// LVNL runway usage source
#[derive(Debug, Clone)]
pub struct LvnlSourceClient {
    /// Endpoint the request tuple is POSTed to
    endpoint: String,

    /// HTTP client for requests
    client: reqwest::Client,
}

impl LvnlSourceClient {
    /// Create a new LVNL source client
    ///
    /// # Parameters
    ///
    /// - `endpoint`: URL of the runway usage endpoint
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.is_empty() {
            return Err(Error::config("LVNL endpoint is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl SourceClient for LvnlSourceClient {
    async fn fetch(&self, request: &SnapshotRequest) -> Result<Snapshot> {
        let payload = request.payload();
        tracing::debug!("POST {} {}", self.endpoint, payload);

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::source_unavailable(format!("LVNL request timed out: {}", e))
                } else {
                    Error::source_unavailable(format!("LVNL request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::source_unavailable(format!(
                "LVNL returned HTTP {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::source_unavailable(format!("Failed to read LVNL response: {}", e)))?;

        parse_response(&body)
    }

    fn source_name(&self) -> &'static str {
        "lvnl"
    }
}

/// Parse a runway usage response body into a snapshot
///
/// Runway codes are trimmed; absent or null codes become empty slots.
pub fn parse_response(body: &str) -> Result<Snapshot> {
    let raw: RunwayUsageResponse = serde_json::from_str(body)
        .map_err(|e| Error::source_malformed(format!("Unexpected LVNL response: {}", e)))?;

    Ok(Snapshot {
        id: raw.id,
        updated: parse_timestamp("Updated", &raw.updated)?,
        start: parse_timestamp("Start", &raw.start)?,
        end: parse_timestamp("End", &raw.end)?,
        landing: [
            code(raw.landing1),
            code(raw.landing2),
            code(raw.landing3),
        ],
        takeoff: [
            code(raw.takeoff1),
            code(raw.takeoff2),
            code(raw.takeoff3),
        ],
        state: raw.state.unwrap_or_default(),
        is_last: raw.is_last,
    })
}

fn code(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Parse an RFC 3339 timestamp, or a local one without offset
///
/// Timestamps with an offset keep their own wall-clock time.
fn parse_timestamp(field: &str, value: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| {
            Error::source_malformed(format!("Invalid {} timestamp: {:?}", field, value))
        })
}

/// Factory for creating LVNL source clients
pub struct LvnlFactory;

impl SourceClientFactory for LvnlFactory {
    fn create(&self, config: &SourceConfig) -> Result<Box<dyn SourceClient>> {
        match config {
            SourceConfig::Lvnl { endpoint } => Ok(Box::new(LvnlSourceClient::new(endpoint.clone())?)),
            _ => Err(Error::config("Invalid config for LVNL source")),
        }
    }
}

/// Register the LVNL source with a registry
///
/// # Example
///
/// ```rust
/// use runway_core::ComponentRegistry;
///
/// let registry = ComponentRegistry::new();
/// runway_source_lvnl::register(&registry);
/// assert!(registry.has_source("lvnl"));
/// ```
pub fn register(registry: &ComponentRegistry) {
    registry.register_source("lvnl", Box::new(LvnlFactory));
}
