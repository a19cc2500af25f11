//! REST client for the hosted attendee table
//!
//! Speaks the PostgREST dialect used by the hosted backend:
//! - `GET   {endpoint}?id=eq.{id}&select=*`         → zero or one row
//! - `GET   {endpoint}?mobile=eq.{phone}&select=*`  → zero or more rows
//! - `PATCH {endpoint}?id=eq.{id}` with `Prefer: return=representation`
//!
//! Every request carries the anonymous key both as `apikey` and as a bearer
//! token. Responses are always JSON arrays; non-2xx bodies carry `message`
//! (or `error`) describing the failure.

use super::LookupClient;
use crate::error::LookupError;
use async_trait::async_trait;
use checkin_common::config::BackendConfig;
use checkin_common::{AttendeePatch, AttendeeRecord};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("checkin-scan/", env!("CARGO_PKG_VERSION"));

/// Transport-level ceiling; the coordinator applies its own shorter timeout
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Attendee table client
pub struct RestLookupClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl RestLookupClient {
    /// Create client from backend configuration
    pub fn new(config: &BackendConfig) -> Result<Self, LookupError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = config.api_key.as_deref() {
            let apikey = HeaderValue::from_str(key)
                .map_err(|e| LookupError::InvalidRequest(format!("Invalid API key: {}", e)))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| LookupError::InvalidRequest(format!("Invalid API key: {}", e)))?;
            headers.insert("apikey", apikey);
            headers.insert(AUTHORIZATION, bearer);
        } else {
            warn!("No backend API key configured; requests are sent unauthenticated");
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint(),
        })
    }

    /// Table endpoint this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a request and decode the JSON array body
    async fn send_for_rows(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<AttendeeRecord>, LookupError> {
        let response = request
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(LookupError::Server {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        parse_rows(&body)
    }
}

#[async_trait]
impl LookupClient for RestLookupClient {
    async fn fetch_by_id(&self, id: &str) -> Result<Option<AttendeeRecord>, LookupError> {
        if id.trim().is_empty() {
            return Err(LookupError::InvalidRequest("An id is required".to_string()));
        }

        debug!(id = %id, endpoint = %self.endpoint, "Fetching attendee by id");

        let request = self
            .http_client
            .get(&self.endpoint)
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())]);

        let record = self.send_for_rows(request).await?.into_iter().next();

        info!(id = %id, found = record.is_some(), "Attendee lookup by id complete");
        Ok(record)
    }

    async fn fetch_by_phone(&self, phone: &str) -> Result<Vec<AttendeeRecord>, LookupError> {
        if phone.trim().is_empty() {
            return Err(LookupError::InvalidRequest(
                "A phone number is required".to_string(),
            ));
        }

        debug!(phone = %phone, endpoint = %self.endpoint, "Fetching attendees by phone");

        let request = self.http_client.get(&self.endpoint).query(&[
            ("mobile", format!("eq.{}", phone)),
            ("select", "*".to_string()),
        ]);

        let records = self.send_for_rows(request).await?;

        info!(phone = %phone, matches = records.len(), "Attendee lookup by phone complete");
        Ok(records)
    }

    async fn update(
        &self,
        id: &str,
        patch: &AttendeePatch,
    ) -> Result<Option<AttendeeRecord>, LookupError> {
        if id.trim().is_empty() {
            return Err(LookupError::InvalidRequest("An id is required".to_string()));
        }

        debug!(id = %id, ?patch, "Updating attendee");

        let request = self
            .http_client
            .patch(&self.endpoint)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(patch);

        let record = self.send_for_rows(request).await?.into_iter().next();

        info!(id = %id, echoed = record.is_some(), "Attendee update complete");
        Ok(record)
    }
}

/// Decode a response body into rows
///
/// Empty bodies count as no rows. A single object is accepted as a one-row
/// result for stores that unwrap singular responses.
fn parse_rows(body: &str) -> Result<Vec<AttendeeRecord>, LookupError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| LookupError::Parse(e.to_string()))?;

    match value {
        Value::Array(_) => {
            serde_json::from_value(value).map_err(|e| LookupError::Parse(e.to_string()))
        }
        Value::Object(_) => serde_json::from_value(value)
            .map(|record| vec![record])
            .map_err(|e| LookupError::Parse(e.to_string())),
        Value::Null => Ok(Vec::new()),
        other => Err(LookupError::Parse(format!(
            "Unexpected response body: {}",
            other
        ))),
    }
}

/// Extract the best error message from a failed response
///
/// Order: body `message`, body `error`, raw text body, status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for field in ["message", "error"] {
            if let Some(text) = value.get(field).and_then(Value::as_str) {
                if !text.trim().is_empty() {
                    return text.to_string();
                }
            }
        }
    } else if !body.trim().is_empty() {
        return body.trim().to_string();
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Server returned {}", status.as_u16()))
}
