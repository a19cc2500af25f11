//! REST lookup client contract tests
//!
//! Runs `RestLookupClient` against an in-process axum server that mimics the
//! hosted attendee table and records every request it receives.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use checkin_common::config::BackendConfig;
use checkin_common::AttendeePatch;
use checkin_scan::error::{LookupError, GENERIC_FAILURE_MESSAGE};
use checkin_scan::lookup::{LookupClient, RestLookupClient};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const API_KEY: &str = "anon-test-key";

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: String,
    query: HashMap<String, String>,
    apikey: Option<String>,
    authorization: Option<String>,
    prefer: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct FakeTable {
    rows: Arc<Mutex<Vec<Value>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    /// Canned failure returned for every request when set
    failure: Arc<Mutex<Option<(StatusCode, String)>>>,
}

impl FakeTable {
    fn with_rows(rows: Vec<Value>) -> Self {
        let table = Self::default();
        *table.rows.lock().unwrap() = rows;
        table
    }

    fn fail_with(&self, status: StatusCode, body: &str) {
        *self.failure.lock().unwrap() = Some((status, body.to_string()));
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(
        &self,
        method: &str,
        query: &HashMap<String, String>,
        headers: &HeaderMap,
        body: &str,
    ) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            query: query.clone(),
            apikey: header("apikey"),
            authorization: header("authorization"),
            prefer: header("prefer"),
            body: serde_json::from_str(body).ok(),
        });
    }

    fn canned_failure(&self) -> Option<Response> {
        self.failure
            .lock()
            .unwrap()
            .clone()
            .map(|(status, body)| (status, body).into_response())
    }

    fn matching(&self, query: &HashMap<String, String>) -> Vec<Value> {
        let filter = ["id", "mobile"].into_iter().find_map(|column| {
            query
                .get(column)
                .and_then(|v| v.strip_prefix("eq."))
                .map(|value| (column, value.to_string()))
        });
        let rows = self.rows.lock().unwrap();
        match filter {
            Some((column, value)) => rows
                .iter()
                .filter(|row| row[column].as_str() == Some(value.as_str()))
                .cloned()
                .collect(),
            None => rows.clone(),
        }
    }
}

async fn select_rows(
    State(table): State<FakeTable>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    table.record("GET", &query, &headers, "");
    if let Some(failure) = table.canned_failure() {
        return failure;
    }
    Json(Value::Array(table.matching(&query))).into_response()
}

async fn patch_rows(
    State(table): State<FakeTable>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    table.record("PATCH", &query, &headers, &body);
    if let Some(failure) = table.canned_failure() {
        return failure;
    }

    let patch: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let updated: Vec<Value> = table
        .matching(&query)
        .into_iter()
        .map(|mut row| {
            if let (Some(row), Some(patch)) = (row.as_object_mut(), patch.as_object()) {
                for (key, value) in patch {
                    row.insert(key.clone(), value.clone());
                }
            }
            row
        })
        .collect();
    Json(Value::Array(updated)).into_response()
}

/// Start the fake table on an ephemeral port and return a client for it
async fn start_backend(table: FakeTable) -> RestLookupClient {
    let app = Router::new()
        .route("/rest/v1/attendees", get(select_rows).patch(patch_rows))
        .with_state(table);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = BackendConfig {
        base_url: format!("http://{}", addr),
        table: "attendees".to_string(),
        api_key: Some(API_KEY.to_string()),
    };
    RestLookupClient::new(&config).unwrap()
}

fn asha() -> Value {
    json!({
        "id": "abc123",
        "name": "Asha Rao",
        "mobile": "9876543210",
        "email": "asha@example.com",
        "no_of_reg_adults": 2,
        "no_of_reg_children": 1,
        "no_of_actual_adults": null,
        "no_of_actual_children": null,
        "preparing": false,
        "present": false
    })
}

fn ravi() -> Value {
    json!({
        "id": "def456",
        "name": "Ravi Rao",
        "mobile": "9876543210",
        "no_of_reg_adults": 1
    })
}

#[tokio::test]
async fn test_fetch_by_id_sends_filter_and_credentials() {
    // Given: a table holding abc123
    let table = FakeTable::with_rows(vec![asha(), ravi()]);
    let client = start_backend(table.clone()).await;

    // When: fetching by id
    let record = client.fetch_by_id("abc123").await.unwrap().unwrap();

    // Then: the row comes back and the request used the table's dialect
    assert_eq!(record.id, "abc123");
    assert_eq!(record.actual_adults_or_registered(), 2);

    let requests = table.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.query.get("id").map(String::as_str), Some("eq.abc123"));
    assert_eq!(request.query.get("select").map(String::as_str), Some("*"));
    assert_eq!(request.apikey.as_deref(), Some(API_KEY));
    assert_eq!(
        request.authorization.as_deref(),
        Some(format!("Bearer {}", API_KEY).as_str())
    );
}

#[tokio::test]
async fn test_fetch_by_unknown_id_is_none() {
    let table = FakeTable::with_rows(vec![asha()]);
    let client = start_backend(table).await;

    assert_eq!(client.fetch_by_id("zzz999").await.unwrap(), None);
}

#[tokio::test]
async fn test_fetch_by_phone_returns_every_match() {
    let table = FakeTable::with_rows(vec![asha(), ravi()]);
    let client = start_backend(table.clone()).await;

    let records = client.fetch_by_phone("9876543210").await.unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["abc123", "def456"]);

    let requests = table.requests();
    let request = &requests[0];
    assert_eq!(
        request.query.get("mobile").map(String::as_str),
        Some("eq.9876543210")
    );
}

#[tokio::test]
async fn test_fetch_by_phone_with_no_rows_is_empty() {
    let table = FakeTable::with_rows(vec![asha()]);
    let client = start_backend(table).await;

    assert!(client.fetch_by_phone("1111111111").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_patches_and_returns_representation() {
    // Given: an unchecked attendee
    let table = FakeTable::with_rows(vec![asha()]);
    let client = start_backend(table.clone()).await;

    // When: checking them in with edited counts
    let patch = AttendeePatch::check_in(3, 0, true);
    let updated = client.update("abc123", &patch).await.unwrap().unwrap();

    // Then: the echoed row reflects the patch
    assert!(updated.is_present());
    assert_eq!(updated.no_of_actual_adults, Some(3));
    assert_eq!(updated.no_of_actual_children, Some(0));
    assert!(updated.is_performing());

    let requests = table.requests();
    let request = &requests[0];
    assert_eq!(request.method, "PATCH");
    assert_eq!(request.query.get("id").map(String::as_str), Some("eq.abc123"));
    assert_eq!(request.prefer.as_deref(), Some("return=representation"));
    assert_eq!(
        request.body,
        Some(json!({
            "present": true,
            "no_of_actual_adults": 3,
            "no_of_actual_children": 0,
            "preparing": true
        }))
    );
}

#[tokio::test]
async fn test_server_message_is_surfaced() {
    let table = FakeTable::default();
    table.fail_with(
        StatusCode::BAD_REQUEST,
        r#"{"message":"invalid input syntax for type uuid","code":"22P02"}"#,
    );
    let client = start_backend(table).await;

    let err = client.fetch_by_id("not-a-uuid").await.unwrap_err();
    assert_eq!(
        err,
        LookupError::Server {
            status: 400,
            message: "invalid input syntax for type uuid".to_string()
        }
    );
    assert_eq!(err.user_message(), "invalid input syntax for type uuid");
}

#[tokio::test]
async fn test_error_field_used_when_message_missing() {
    let table = FakeTable::default();
    table.fail_with(StatusCode::UNAUTHORIZED, r#"{"error":"Invalid API key"}"#);
    let client = start_backend(table).await;

    match client.fetch_by_phone("9876543210").await {
        Err(LookupError::Server { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API key");
        }
        other => panic!("expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_update_failure_is_reported() {
    let table = FakeTable::with_rows(vec![asha()]);
    table.fail_with(StatusCode::INTERNAL_SERVER_ERROR, "");
    let client = start_backend(table).await;

    let err = client
        .update("abc123", &AttendeePatch::check_in(2, 1, false))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LookupError::Server {
            status: 500,
            message: "Internal Server Error".to_string()
        }
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Grab a free port, then close it again
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = BackendConfig {
        base_url: format!("http://{}", addr),
        api_key: Some(API_KEY.to_string()),
        ..BackendConfig::default()
    };
    let client = RestLookupClient::new(&config).unwrap();

    let err = client.fetch_by_id("abc123").await.unwrap_err();
    assert!(matches!(err, LookupError::Network(_)), "got {:?}", err);
    assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_blank_arguments_rejected_locally() {
    let table = FakeTable::with_rows(vec![asha()]);
    let client = start_backend(table.clone()).await;

    assert!(matches!(
        client.fetch_by_id("  ").await,
        Err(LookupError::InvalidRequest(_))
    ));
    assert!(matches!(
        client.fetch_by_phone("").await,
        Err(LookupError::InvalidRequest(_))
    ));
    assert!(matches!(
        client.update("", &AttendeePatch::check_in(1, 0, false)).await,
        Err(LookupError::InvalidRequest(_))
    ));
    assert!(table.requests().is_empty());
}
