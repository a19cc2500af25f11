//! Backend lookup client
//!
//! [`LookupClient`] is the boundary to the attendee store. Implementations
//! only perform the request; cancellation and timeouts are applied by the
//! caller through [`run_cancelable`], which drops the in-flight future when
//! its token fires.

pub mod rest;

use crate::error::LookupError;
use async_trait::async_trait;
use checkin_common::{AttendeePatch, AttendeeRecord};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub use rest::RestLookupClient;

/// Attendee store operations
#[async_trait]
pub trait LookupClient: Send + Sync {
    /// Fetch the attendee with this id (zero or one row)
    async fn fetch_by_id(&self, id: &str) -> Result<Option<AttendeeRecord>, LookupError>;

    /// Fetch attendees registered with this phone number (zero or more rows)
    async fn fetch_by_phone(&self, phone: &str) -> Result<Vec<AttendeeRecord>, LookupError>;

    /// Apply a partial update, returning the updated row when the store echoes it
    async fn update(
        &self,
        id: &str,
        patch: &AttendeePatch,
    ) -> Result<Option<AttendeeRecord>, LookupError>;
}

/// A lookup the coordinator can issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupRequest {
    ById(String),
    ByPhone(String),
}

/// Successful lookup result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Result of a by-id lookup
    Single(Option<AttendeeRecord>),
    /// Result of a by-phone lookup
    Many(Vec<AttendeeRecord>),
}

impl LookupRequest {
    /// Issue this request against a client
    pub async fn execute(&self, client: &dyn LookupClient) -> Result<LookupOutcome, LookupError> {
        match self {
            LookupRequest::ById(id) => client.fetch_by_id(id).await.map(LookupOutcome::Single),
            LookupRequest::ByPhone(phone) => {
                client.fetch_by_phone(phone).await.map(LookupOutcome::Many)
            }
        }
    }
}

/// Run a request future until it completes, is cancelled, or times out
///
/// Cancellation wins over completion when both are ready so that a
/// superseded request never reports a result.
pub async fn run_cancelable<T, F>(
    token: &CancellationToken,
    timeout: Duration,
    request: F,
) -> Result<T, LookupError>
where
    F: Future<Output = Result<T, LookupError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(LookupError::Cancelled),
        result = tokio::time::timeout(timeout, request) => match result {
            Ok(inner) => inner,
            Err(_) => Err(LookupError::Timeout(timeout.as_millis() as u64)),
        },
    }
}
