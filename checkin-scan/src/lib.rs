//! # Check-in Scan Coordinator (checkin-scan)
//!
//! Scan intake for event check-in.
//!
//! **Purpose:** Turn decoded QR text (or a typed phone number) into an
//! attendee lookup, let the operator adjust headcounts, and mark the
//! attendee present, while keeping the camera off whenever a modal is open.
//!
//! **Architecture:** A single coordinator task owns all state; lookups and
//! updates run on spawned tasks and report back by message. The backend is
//! reached through [`lookup::LookupClient`], the camera through
//! [`decode::DecodeSource`].

pub mod console;
pub mod coordinator;
pub mod decode;
pub mod error;
pub mod lookup;

pub use coordinator::{CoordinatorHandle, CoordinatorView, Intent, ScanCoordinator, Stage};
pub use error::{CheckinError, LookupError};
