//! Snapshot of coordinator state for the presentation layer

use super::record::WorkingRecord;
use crate::error::ErrorState;
use checkin_common::AttendeeRecord;
use serde::Serialize;
use uuid::Uuid;

/// Where the intake flow currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// No modal open and the camera is off (camera error, shutdown)
    #[default]
    Idle,
    /// Camera running, waiting for a code
    Scanning,
    /// Lookup in flight
    Pending,
    /// Record loaded and awaiting confirmation
    Review,
    /// Confirm update in flight
    Confirming,
    /// Check-in recorded; scanning resumes shortly
    Done,
    /// Phone dialog open without a loaded record
    PhoneEntry,
    /// Scan modal showing an error or empty result
    Result,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoordinatorView {
    pub session_id: Uuid,
    pub stage: Stage,
    pub scanner_active: bool,
    pub scanned_id: Option<String>,
    pub scan_modal_open: bool,
    pub phone_modal_open: bool,
    pub loading: bool,
    pub phone_loading: bool,
    /// A decoded code is being processed; new decodes are rejected
    pub processing: bool,
    pub fetch_in_flight: bool,
    pub confirming: bool,
    pub error: Option<ErrorState>,
    pub phone_error: Option<ErrorState>,
    /// Non-blocking notice, e.g. record already checked in
    pub warning: Option<String>,
    pub record: Option<WorkingRecord>,
    pub phone_matches: Vec<AttendeeRecord>,
}

impl CoordinatorView {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            ..Self::default()
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }

    pub fn phone_error_code(&self) -> Option<&str> {
        self.phone_error.as_ref().map(|e| e.code.as_str())
    }

    pub(crate) fn derive_stage(&self, done: bool) -> Stage {
        if done {
            Stage::Done
        } else if self.confirming {
            Stage::Confirming
        } else if self.loading || self.phone_loading {
            Stage::Pending
        } else if self.record.is_some() {
            Stage::Review
        } else if self.phone_modal_open {
            Stage::PhoneEntry
        } else if self.scan_modal_open {
            Stage::Result
        } else if self.scanner_active {
            Stage::Scanning
        } else {
            Stage::Idle
        }
    }
}
