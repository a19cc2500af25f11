//! Attendee models exchanged with the check-in backend
//!
//! The backend table is exposed over a hosted REST API. Rows arrive as JSON
//! objects whose columns may be `null` or missing entirely, so every column
//! other than `id` is decoded leniently and read through accessors that
//! apply the defaults.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Attendee row as returned by the backend
///
/// Column names follow the backend table. `preparing` is the backend's name
/// for the "performing at the event" flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeRecord {
    /// Opaque attendee identifier (the QR payload)
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub mobile: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub email: Option<String>,
    /// Adults on the registration
    #[serde(default)]
    pub no_of_reg_adults: Option<u32>,
    /// Children on the registration
    #[serde(default)]
    pub no_of_reg_children: Option<u32>,
    /// Adults actually attending (set at check-in)
    #[serde(default)]
    pub no_of_actual_adults: Option<u32>,
    /// Children actually attending (set at check-in)
    #[serde(default)]
    pub no_of_actual_children: Option<u32>,
    /// Performing at the event
    #[serde(default)]
    pub preparing: Option<bool>,
    /// Already checked in
    #[serde(default)]
    pub present: Option<bool>,
}

impl AttendeeRecord {
    /// Create a record with only an id set (all other columns absent)
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            mobile: None,
            email: None,
            no_of_reg_adults: None,
            no_of_reg_children: None,
            no_of_actual_adults: None,
            no_of_actual_children: None,
            preparing: None,
            present: None,
        }
    }

    pub fn registered_adults(&self) -> u32 {
        self.no_of_reg_adults.unwrap_or(0)
    }

    pub fn registered_children(&self) -> u32 {
        self.no_of_reg_children.unwrap_or(0)
    }

    /// Actual adults, falling back to the registered count when unset
    pub fn actual_adults_or_registered(&self) -> u32 {
        self.no_of_actual_adults
            .unwrap_or_else(|| self.registered_adults())
    }

    /// Actual children, falling back to the registered count when unset
    pub fn actual_children_or_registered(&self) -> u32 {
        self.no_of_actual_children
            .unwrap_or_else(|| self.registered_children())
    }

    pub fn is_performing(&self) -> bool {
        self.preparing.unwrap_or(false)
    }

    /// True when the attendee has already been checked in
    pub fn is_present(&self) -> bool {
        self.present.unwrap_or(false)
    }

    /// Name for user-facing messages, falling back to the id
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.id,
        }
    }
}

/// Partial update sent when confirming a check-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeePatch {
    pub present: bool,
    pub no_of_actual_adults: u32,
    pub no_of_actual_children: u32,
    pub preparing: bool,
}

impl AttendeePatch {
    /// Patch marking the attendee present with the confirmed headcounts
    pub fn check_in(actual_adults: u32, actual_children: u32, performing: bool) -> Self {
        Self {
            present: true,
            no_of_actual_adults: actual_adults,
            no_of_actual_children: actual_children,
            preparing: performing,
        }
    }
}

/// Ids are opaque: accept JSON strings and numbers alike
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "attendee id must be a string or number, got {}",
            other
        ))),
    }
}

/// Text columns sometimes hold numbers (e.g. `mobile` stored as bigint)
fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected text column, got {}",
            other
        ))),
    }
}
