//! Event types for the check-in event system
//!
//! The coordinator emits a [`CheckinEvent`] for every externally visible
//! transition. Presentation layers subscribe through [`EventBus`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Logical request channel for lookups
///
/// At most one request may be in flight per slot; a newer request always
/// supersedes an older one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupSlot {
    /// Lookup by id, driven by a decoded QR code
    Scan,
    /// Lookup by phone number, driven by manual entry
    Phone,
}

impl std::fmt::Display for LookupSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupSlot::Scan => write!(f, "scan"),
            LookupSlot::Phone => write!(f, "phone"),
        }
    }
}

/// Check-in event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CheckinEvent {
    /// Decode source started producing events
    ScannerStarted {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Decode source stopped (modal shown, phone mode, or shutdown)
    ScannerStopped {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A decoded code passed the debounce checks
    CodeAccepted {
        session_id: Uuid,
        code: String,
        timestamp: DateTime<Utc>,
    },

    /// Lookup issued for a slot
    LookupStarted {
        session_id: Uuid,
        slot: LookupSlot,
        generation: u64,
        timestamp: DateTime<Utc>,
    },

    /// Lookup produced a working record
    RecordLoaded {
        session_id: Uuid,
        slot: LookupSlot,
        record_id: String,
        /// Record was already checked in when fetched
        already_present: bool,
        timestamp: DateTime<Utc>,
    },

    /// Lookup completed with no matching record
    NotFound {
        session_id: Uuid,
        slot: LookupSlot,
        timestamp: DateTime<Utc>,
    },

    /// Lookup failed (network, server, timeout)
    LookupFailed {
        session_id: Uuid,
        slot: LookupSlot,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Attendee marked present on the backend
    CheckInConfirmed {
        session_id: Uuid,
        record_id: String,
        actual_adults: u32,
        actual_children: u32,
        timestamp: DateTime<Utc>,
    },

    /// Confirm request failed; working record kept for retry
    ConfirmFailed {
        session_id: Uuid,
        record_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Camera could not be started; decode source left stopped
    CameraUnavailable {
        session_id: Uuid,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl CheckinEvent {
    /// Event type name (matches the serde tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            CheckinEvent::ScannerStarted { .. } => "ScannerStarted",
            CheckinEvent::ScannerStopped { .. } => "ScannerStopped",
            CheckinEvent::CodeAccepted { .. } => "CodeAccepted",
            CheckinEvent::LookupStarted { .. } => "LookupStarted",
            CheckinEvent::RecordLoaded { .. } => "RecordLoaded",
            CheckinEvent::NotFound { .. } => "NotFound",
            CheckinEvent::LookupFailed { .. } => "LookupFailed",
            CheckinEvent::CheckInConfirmed { .. } => "CheckInConfirmed",
            CheckinEvent::ConfirmFailed { .. } => "ConfirmFailed",
            CheckinEvent::CameraUnavailable { .. } => "CameraUnavailable",
        }
    }
}

/// Fan-out of coordinator events to any number of listeners
///
/// Clones share one broadcast channel. A listener that falls more than
/// `capacity` events behind skips the oldest ones.
///
/// ```
/// use checkin_common::events::{CheckinEvent, EventBus};
///
/// let bus = EventBus::new(8);
/// let mut rx = bus.subscribe();
/// bus.emit_lossy(CheckinEvent::ScannerStarted {
///     session_id: uuid::Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// });
/// assert_eq!(rx.try_recv().unwrap().event_type(), "ScannerStarted");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CheckinEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Listen for events sent from now on
    pub fn subscribe(&self) -> broadcast::Receiver<CheckinEvent> {
        self.tx.subscribe()
    }

    /// Send to every listener; fails when nobody is listening
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CheckinEvent,
    ) -> Result<usize, broadcast::error::SendError<CheckinEvent>> {
        self.tx.send(event)
    }

    /// Send, dropping the event when nobody is listening
    pub fn emit_lossy(&self, event: CheckinEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No event listeners");
        }
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
