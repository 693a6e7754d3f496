// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Incremental race sync.
//!
//! Handles the core workflow:
//! 1. Read the athlete's watermark
//! 2. Walk the activity feed from page 1 until an empty page
//! 3. Keep race activities and insert the ones not stored yet
//! 4. Advance the watermark after a complete walk
//!
//! Any error aborts the run. Races inserted before the failure stay; the
//! watermark does not move, so the next run re-reads the same window.

use crate::db::Database;
use crate::error::Result;
use crate::models::{slugify, RaceActivity};
use crate::services::strava::{ActivityPage, StravaActivity, StravaClient};
use crate::time_utils::{format_utc_rfc3339, parse_strava_local, parse_utc_rfc3339};
use chrono::{DateTime, Utc};

/// Result of syncing a single activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Inserted,
    AlreadyStored,
}

/// Summary of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Non-empty pages processed
    pub pages: u32,
    /// Activities seen across all pages
    pub activities: usize,
    /// Activities that passed the race filter
    pub races: usize,
    pub inserted: usize,
    pub already_stored: usize,
    /// Watermark after the run
    pub watermark: Option<DateTime<Utc>>,
}

/// Walks the Strava feed and stores new races.
pub struct RaceSync {
    client: StravaClient,
    db: Database,
    page_size: u32,
}

impl RaceSync {
    pub fn new(client: StravaClient, db: Database, page_size: u32) -> Self {
        Self {
            client,
            db,
            page_size,
        }
    }

    /// Run one incremental sync for the athlete with a valid access token.
    pub async fn run(&self, access_token: &str, owner_id: u64) -> Result<SyncReport> {
        let watermark = self.db.get_watermark(owner_id).await?;
        let after = watermark.map_or(0, |w| w.timestamp());

        tracing::info!(
            athlete_id = owner_id,
            after,
            per_page = self.page_size,
            "Starting race sync"
        );

        let mut report = SyncReport {
            watermark,
            ..SyncReport::default()
        };
        let mut last_start: Option<String> = None;
        let mut page = 1u32;

        loop {
            let activities = self
                .client
                .list_activities(
                    access_token,
                    ActivityPage {
                        page,
                        per_page: self.page_size,
                        after,
                    },
                )
                .await?;

            if activities.is_empty() {
                tracing::debug!(page, "Empty page, no more activities");
                break;
            }

            tracing::debug!(page, count = activities.len(), "Processing page");
            report.pages += 1;
            report.activities += activities.len();

            for activity in &activities {
                if !activity.is_race() {
                    continue;
                }
                report.races += 1;
                match self.sync_activity(activity, owner_id).await? {
                    SyncOutcome::Inserted => report.inserted += 1,
                    SyncOutcome::AlreadyStored => report.already_stored += 1,
                }
            }

            // The last activity of the last non-empty page sets the watermark.
            last_start = activities.last().map(|a| a.start_date.clone());
            page += 1;
        }

        if let Some(start) = last_start {
            let candidate = parse_utc_rfc3339(&start)?;
            if watermark.map_or(true, |current| candidate > current) {
                self.db.set_watermark(owner_id, candidate).await?;
                report.watermark = Some(candidate);
                tracing::info!(
                    athlete_id = owner_id,
                    watermark = %format_utc_rfc3339(candidate),
                    "Watermark advanced"
                );
            }
        }

        tracing::info!(
            athlete_id = owner_id,
            pages = report.pages,
            activities = report.activities,
            races = report.races,
            inserted = report.inserted,
            already_stored = report.already_stored,
            "Race sync completed"
        );
        Ok(report)
    }

    /// Store a race activity unless a record with its ID already exists.
    pub async fn sync_activity(
        &self,
        activity: &StravaActivity,
        owner_id: u64,
    ) -> Result<SyncOutcome> {
        if self.db.find_race(activity.id).await?.is_some() {
            tracing::debug!(activity_id = activity.id, "Race already stored, skipping");
            return Ok(SyncOutcome::AlreadyStored);
        }

        let race = race_record(activity, owner_id)?;
        self.db.insert_race(&race).await?;

        tracing::info!(
            activity_id = race.remote_id,
            name = %race.name,
            year = race.race_year(),
            "Inserted race"
        );
        Ok(SyncOutcome::Inserted)
    }
}

/// Build the stored record from a feed activity.
pub fn race_record(activity: &StravaActivity, owner_id: u64) -> Result<RaceActivity> {
    Ok(RaceActivity {
        remote_id: activity.id,
        owner_id,
        name: activity.name.clone(),
        name_slug: slugify(&activity.name),
        start_date: parse_utc_rfc3339(&activity.start_date)?,
        start_date_local: parse_strava_local(&activity.start_date_local)?,
        distance_meters: activity.distance,
        moving_time_seconds: activity.moving_time,
        elapsed_time_seconds: activity.elapsed_time,
        route_polyline: activity.polyline().unwrap_or_default().to_string(),
    })
}
