// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQL DDL executed at startup.
//!
//! Timestamps are stored as text: UTC values as RFC3339 with a `Z` suffix,
//! local wall-clock values as `YYYY-MM-DDTHH:MM:SS`.

/// SQLite schema:
/// - `strava_credential`: one row per athlete
/// - `athlete`: profile captured at authorization
/// - `race_activity`: keyed by the Strava activity ID
/// - `sync_watermark`: last synced start date per athlete
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS strava_credential (
    owner_id INTEGER PRIMARY KEY,
    access_token TEXT NOT NULL,
    refresh_token TEXT NOT NULL,
    expires_at INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS athlete (
    strava_id INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    profile TEXT NULL,
    profile_medium TEXT NULL
);

CREATE TABLE IF NOT EXISTS race_activity (
    strava_id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    name_slug TEXT NOT NULL,
    race_year INTEGER NOT NULL,
    start_date TEXT NOT NULL,
    start_date_local TEXT NOT NULL,
    distance REAL NOT NULL,
    moving_time INTEGER NOT NULL,
    elapsed_time INTEGER NOT NULL,
    polyline TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_race_activity_year_slug ON race_activity(race_year, name_slug);

CREATE TABLE IF NOT EXISTS sync_watermark (
    owner_id INTEGER PRIMARY KEY,
    last_synced_at TEXT NULL,
    updated_at TEXT NOT NULL
);
"#;
