//! Working copy of a fetched attendee
//!
//! The confirm step edits headcounts and the performing flag locally; the
//! fetched row is never mutated. `actual_*` start from the fetched actual
//! counts, or the registered counts when those are unset.

use crate::error::CheckinError;
use checkin_common::events::LookupSlot;
use checkin_common::{AttendeePatch, AttendeeRecord};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkingRecord {
    pub id: String,
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub registered_adults: u32,
    pub registered_children: u32,
    pub actual_adults: u32,
    pub actual_children: u32,
    pub performing: bool,
    pub present: bool,
    /// Slot the record was loaded through; errors about it land there
    pub source: LookupSlot,
}

impl WorkingRecord {
    pub fn from_fetched(record: &AttendeeRecord, source: LookupSlot) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            mobile: record.mobile.clone(),
            email: record.email.clone(),
            registered_adults: record.registered_adults(),
            registered_children: record.registered_children(),
            actual_adults: record.actual_adults_or_registered(),
            actual_children: record.actual_children_or_registered(),
            performing: record.is_performing(),
            present: record.is_present(),
            source,
        }
    }

    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.id,
        }
    }

    pub fn to_patch(&self) -> AttendeePatch {
        AttendeePatch::check_in(self.actual_adults, self.actual_children, self.performing)
    }

    /// Apply a user edit by field name
    pub fn apply_edit(&mut self, field: &str, value: &str) -> Result<(), CheckinError> {
        let value = value.trim();
        match field.trim().to_ascii_lowercase().as_str() {
            "actual_adults" | "adults" => self.actual_adults = parse_count("adults", value)?,
            "actual_children" | "children" => {
                self.actual_children = parse_count("children", value)?
            }
            "performing" | "preparing" => self.performing = parse_flag(value)?,
            other => {
                return Err(CheckinError::Validation(format!(
                    "Unknown field '{}'. Editable fields: adults, children, performing.",
                    other
                )))
            }
        }
        Ok(())
    }
}

fn parse_count(label: &str, value: &str) -> Result<u32, CheckinError> {
    value.parse::<u32>().map_err(|_| {
        CheckinError::Validation(format!(
            "Number of {} must be a whole number, 0 or more.",
            label
        ))
    })
}

fn parse_flag(value: &str) -> Result<bool, CheckinError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Ok(true),
        "false" | "no" | "n" | "0" | "off" => Ok(false),
        _ => Err(CheckinError::Validation(
            "Performing must be yes or no.".to_string(),
        )),
    }
}
