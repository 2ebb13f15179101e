// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time-filter parsing for the jobs listing API.
//!
//! Filters accept either epoch seconds or a parseable date string. Strings
//! without timezone information are interpreted in the configured timezone
//! and converted to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

#[derive(Debug, thiserror::Error)]
#[error("invalid time value '{0}'")]
pub struct TimeParseError(String);

/// Parse one time filter value to epoch seconds.
pub fn parse_time_param(value: &str, tz: Tz) -> Result<i64, TimeParseError> {
    let trimmed = value.trim();

    // Numeric epoch seconds (integral or fractional).
    if let Ok(secs) = trimmed.parse::<i64>() {
        return Ok(secs);
    }
    if let Ok(secs) = trimmed.parse::<f64>() {
        return Ok(secs as i64);
    }

    // Timezone-aware date strings convert directly.
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.timestamp());
    }

    // Naive formats are interpreted in the configured zone.
    const NAIVE_FORMATS: [&str; 3] =
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
                return Ok(dt.timestamp());
            }
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
                return Ok(dt.timestamp());
            }
        }
    }

    Err(TimeParseError(value.to_string()))
}

/// Render an epoch-seconds column as an ISO-8601 UTC string for API output.
pub fn to_iso(epoch_secs: i64) -> String {
    DateTime::from_timestamp(epoch_secs, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "timeparse_tests.rs"]
mod tests;
