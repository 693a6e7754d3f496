// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.

use crate::error::AppError;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Storage format for local wall-clock timestamps.
const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_utc_rfc3339(value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Parse(format!("invalid timestamp {value:?}: {e}")))
}

/// Parse Strava's `start_date_local`.
///
/// Strava appends a `Z` even though the value is the athlete's wall clock,
/// so the offset is dropped rather than applied.
pub fn parse_strava_local(value: &str) -> Result<NaiveDateTime, AppError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }
    parse_local(value)
}

pub fn format_local(date: NaiveDateTime) -> String {
    date.format(LOCAL_FORMAT).to_string()
}

pub fn parse_local(value: &str) -> Result<NaiveDateTime, AppError> {
    NaiveDateTime::parse_from_str(value, LOCAL_FORMAT)
        .map_err(|e| AppError::Parse(format!("invalid local timestamp {value:?}: {e}")))
}
