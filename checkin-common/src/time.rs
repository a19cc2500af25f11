//! Wall-clock stamps for emitted events
//!
//! Debounce and cooldown use `std::time::Instant`; only event payloads carry
//! calendar time.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current UTC time for an event timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Second-precision RFC 3339 form used in console and log output
pub fn format_stamp(stamp: &DateTime<Utc>) -> String {
    stamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
