//! Error types for checkin-scan
//!
//! Three layers:
//! - [`LookupError`]: failures talking to the backend
//! - [`DecoderError`]: failures starting the decode source
//! - [`CheckinError`]: the user-facing taxonomy surfaced in the view
//!
//! Cancellation of a superseded request is represented by
//! [`LookupError::Cancelled`] but never reaches the view.

use serde::Serialize;
use thiserror::Error;

/// Generic text when the server gave no usable message
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to fetch details. Please try again.";

/// Error code for a camera that could not be started
pub const CAMERA_UNAVAILABLE_CODE: &str = "CAMERA_UNAVAILABLE";

/// Text shown when no camera can be started
pub const CAMERA_UNAVAILABLE_MESSAGE: &str =
    "Unable to access camera. Please allow camera permission or use a different device.";

/// Backend lookup/update errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Transport failure (DNS, connection refused, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response; `message` is taken from the body when available
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Request exceeded the configured timeout (milliseconds)
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Request was superseded or the session closed
    #[error("Request cancelled")]
    Cancelled,

    /// Request rejected before sending (e.g. empty id)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl LookupError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LookupError::Cancelled)
    }

    /// Message suitable for the user
    ///
    /// Server-provided text when present, otherwise a generic failure string.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::Server { message, .. } if !message.trim().is_empty() => message.clone(),
            LookupError::Timeout(_) => {
                "The server took too long to respond. Please try again.".to_string()
            }
            LookupError::InvalidRequest(reason) => reason.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Decode source start-up errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderError {
    /// No camera/decoder could be started
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),
}

/// User-facing check-in errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckinError {
    /// Malformed input, reported locally without touching the network
    #[error("{0}")]
    Validation(String),

    /// Lookup succeeded but matched nothing
    #[error("{0}")]
    NotFound(String),

    /// Network or server failure
    #[error("{}", .0.user_message())]
    Lookup(LookupError),

    /// Attendee is already marked present; confirm is refused
    #[error("{name} is already checked in")]
    AlreadyCheckedIn { name: String },

    /// Operation needs a working record and none is loaded
    #[error("No attendee is loaded")]
    NoRecord,

    /// Camera could not be started
    #[error("{0}")]
    Camera(String),
}

impl CheckinError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            CheckinError::Validation(_) => "VALIDATION",
            CheckinError::NotFound(_) => "NOT_FOUND",
            CheckinError::Lookup(LookupError::Timeout(_)) => "TIMEOUT",
            CheckinError::Lookup(_) => "NETWORK",
            CheckinError::AlreadyCheckedIn { .. } => "ALREADY_CHECKED_IN",
            CheckinError::NoRecord => "NO_RECORD",
            CheckinError::Camera(_) => CAMERA_UNAVAILABLE_CODE,
        }
    }

    /// Snapshot for the presentation layer
    pub fn to_state(&self) -> ErrorState {
        ErrorState {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

impl From<DecoderError> for CheckinError {
    fn from(error: DecoderError) -> Self {
        match error {
            DecoderError::CameraUnavailable(_) => {
                CheckinError::Camera(CAMERA_UNAVAILABLE_MESSAGE.to_string())
            }
        }
    }
}

/// Error as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorState {
    pub code: String,
    pub message: String,
}

impl ErrorState {
    pub fn is_camera(&self) -> bool {
        self.code == CAMERA_UNAVAILABLE_CODE
    }
}

/// Returned by handle calls once the coordinator task has ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Scan coordinator has shut down")]
pub struct CoordinatorClosed;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_is_preferred() {
        let err = LookupError::Server {
            status: 400,
            message: "invalid input syntax for type uuid".to_string(),
        };
        assert_eq!(err.user_message(), "invalid input syntax for type uuid");
    }

    #[test]
    fn test_blank_server_message_falls_back_to_generic() {
        let err = LookupError::Server {
            status: 502,
            message: "  ".to_string(),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
        assert_eq!(
            LookupError::Network("connection refused".to_string()).user_message(),
            GENERIC_FAILURE_MESSAGE
        );
    }

    #[test]
    fn test_codes_distinguish_taxonomy() {
        assert_eq!(CheckinError::Validation("x".into()).code(), "VALIDATION");
        assert_eq!(CheckinError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(
            CheckinError::Lookup(LookupError::Network("x".into())).code(),
            "NETWORK"
        );
        assert_eq!(CheckinError::Lookup(LookupError::Timeout(10)).code(), "TIMEOUT");
        assert_eq!(
            CheckinError::AlreadyCheckedIn { name: "Asha".into() }.code(),
            "ALREADY_CHECKED_IN"
        );
    }

    #[test]
    fn test_camera_error_uses_fixed_message() {
        let err: CheckinError = DecoderError::CameraUnavailable("no /dev/video0".into()).into();
        let state = err.to_state();
        assert_eq!(state.code, "CAMERA_UNAVAILABLE");
        assert_eq!(state.message, CAMERA_UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn test_already_checked_in_message_names_attendee() {
        let err = CheckinError::AlreadyCheckedIn {
            name: "Asha Rao".into(),
        };
        assert_eq!(err.to_string(), "Asha Rao is already checked in");
    }
}
