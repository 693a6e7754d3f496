// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Race activity model for storage and pages.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored race record. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceActivity {
    /// Strava activity ID (primary key)
    pub remote_id: u64,
    /// Strava athlete ID (owner)
    pub owner_id: u64,
    /// Activity name/title
    pub name: String,
    /// URL slug derived from the name
    pub name_slug: String,
    /// Start time (UTC)
    pub start_date: DateTime<Utc>,
    /// Start time on the athlete's wall clock
    pub start_date_local: NaiveDateTime,
    /// Distance in meters
    pub distance_meters: f64,
    pub moving_time_seconds: u32,
    pub elapsed_time_seconds: u32,
    /// Encoded summary polyline (may be empty)
    pub route_polyline: String,
}

impl RaceActivity {
    /// Year the race was run, in the athlete's local time.
    pub fn race_year(&self) -> i32 {
        self.start_date_local.year()
    }

    /// Site path of the race detail page.
    pub fn page_path(&self) -> String {
        format!("/{}/{}/", self.race_year(), self.name_slug)
    }
}

/// Convert a race name into a URL slug.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single `-`, and trims dashes from both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}
