//! Local-time handling for provider timestamps and event clocks.
//!
//! Evolution delivers UTC timestamps with a `Z` suffix while the CRM
//! side of the pipeline works in the account's local time. Everything
//! here shifts by the configured whole-hour offset.

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};

const EVENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Current local time formatted for tracking-event rows.
pub fn local_event_time(offset_hours: i64) -> String {
    local_now(offset_hours).format(EVENT_TIME_FORMAT).to_string()
}

/// Current local time formatted for the status payload.
pub fn local_status_time(offset_hours: i64) -> String {
    local_now(offset_hours).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Shift a `Z`-suffixed provider timestamp into local time.
///
/// Anything that does not parse as `%Y-%m-%dT%H:%M:%S%.fZ` is stored
/// as received.
pub fn normalize_provider_timestamp(raw: &str, offset_hours: i64) -> String {
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.fZ") {
        Ok(utc) => (utc + Duration::hours(offset_hours))
            .format(EVENT_TIME_FORMAT)
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Day after a `YYYY-MM-DD` date, for exclusive range bounds.
pub fn day_after(date: &str) -> Option<String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.succ_opt())
        .map(|next| next.format("%Y-%m-%d").to_string())
}

fn local_now(offset_hours: i64) -> NaiveDateTime {
    (Utc::now() + Duration::hours(offset_hours)).naive_utc()
}
