//! # Check-in Common Library
//!
//! Shared code for the check-in workspace including:
//! - Attendee record and patch models (backend wire shape)
//! - Event types and the broadcast event bus
//! - TOML bootstrap configuration loading
//! - Utility functions

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use models::{AttendeePatch, AttendeeRecord};
