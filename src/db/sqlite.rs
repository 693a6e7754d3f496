// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite store with typed operations.
//!
//! Provides high-level operations for:
//! - Credentials (OAuth tokens, one row per athlete)
//! - Athletes (profile captured at authorization)
//! - Race activities (keyed by Strava activity ID)
//! - Sync watermarks

use crate::db::schema::SQLITE_INIT;
use crate::error::{AppError, Result};
use crate::models::{Athlete, RaceActivity, TokenCredential};
use crate::time_utils::{format_local, format_utc_rfc3339, parse_local, parse_utc_rfc3339};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

const RACE_COLUMNS: &str = "strava_id, owner_id, name, name_slug, start_date, start_date_local, \
     distance, moving_time, elapsed_time, polyline";

/// SQLite database handle. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `url` and apply the schema.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // An in-memory database lives only as long as its connection.
        let in_memory = url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 4 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;

        tracing::info!(url, "Connected to SQLite");
        Ok(db)
    }

    /// Fresh in-memory database (tests and dry runs).
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Execute the bundled DDL one statement at a time.
    async fn init_schema(&self) -> Result<()> {
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    // ─── Credential Operations ───────────────────────────────────

    /// Get the stored credential for an athlete.
    pub async fn get_credential(&self, owner_id: u64) -> Result<Option<TokenCredential>> {
        let row = sqlx::query(
            "SELECT owner_id, access_token, refresh_token, expires_at
             FROM strava_credential WHERE owner_id = ?",
        )
        .bind(owner_id as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_credential).transpose()
    }

    /// The credential with the lowest athlete ID, if any is stored.
    pub async fn primary_credential(&self) -> Result<Option<TokenCredential>> {
        let row = sqlx::query(
            "SELECT owner_id, access_token, refresh_token, expires_at
             FROM strava_credential ORDER BY owner_id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_credential).transpose()
    }

    /// Insert or replace the credential for its owner.
    pub async fn upsert_credential(&self, credential: &TokenCredential) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO strava_credential (owner_id, access_token, refresh_token, expires_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(owner_id) DO UPDATE SET
                access_token=excluded.access_token,
                refresh_token=excluded.refresh_token,
                expires_at=excluded.expires_at,
                updated_at=excluded.updated_at
            "#,
        )
        .bind(credential.owner_id as i64)
        .bind(&credential.access_token)
        .bind(&credential.refresh_token)
        .bind(credential.expires_at)
        .bind(format_utc_rfc3339(Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Update the tokens of an existing credential in place.
    pub async fn update_credential(&self, credential: &TokenCredential) -> Result<()> {
        let result = sqlx::query(
            "UPDATE strava_credential
             SET access_token = ?, refresh_token = ?, expires_at = ?, updated_at = ?
             WHERE owner_id = ?",
        )
        .bind(&credential.access_token)
        .bind(&credential.refresh_token)
        .bind(credential.expires_at)
        .bind(format_utc_rfc3339(Utc::now()))
        .bind(credential.owner_id as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Credential for athlete {}",
                credential.owner_id
            )));
        }
        Ok(())
    }

    // ─── Athlete Operations ──────────────────────────────────────

    pub async fn get_athlete(&self, strava_id: u64) -> Result<Option<Athlete>> {
        let row = sqlx::query(
            "SELECT strava_id, first_name, last_name, profile, profile_medium
             FROM athlete WHERE strava_id = ?",
        )
        .bind(strava_id as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<Athlete> {
            Ok(Athlete {
                strava_id: row.try_get::<i64, _>("strava_id")? as u64,
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                profile: row.try_get("profile")?,
                profile_medium: row.try_get("profile_medium")?,
            })
        })
        .transpose()
    }

    pub async fn insert_athlete(&self, athlete: &Athlete) -> Result<()> {
        sqlx::query(
            "INSERT INTO athlete (strava_id, first_name, last_name, profile, profile_medium)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(athlete.strava_id as i64)
        .bind(&athlete.first_name)
        .bind(&athlete.last_name)
        .bind(&athlete.profile)
        .bind(&athlete.profile_medium)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ─── Race Operations ─────────────────────────────────────────

    /// Look up a race by Strava activity ID. `None` means never stored.
    pub async fn find_race(&self, remote_id: u64) -> Result<Option<RaceActivity>> {
        let row = sqlx::query(&format!(
            "SELECT {RACE_COLUMNS} FROM race_activity WHERE strava_id = ?"
        ))
        .bind(remote_id as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_race).transpose()
    }

    /// Insert a new race. Fails on a duplicate Strava activity ID.
    pub async fn insert_race(&self, race: &RaceActivity) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO race_activity ({RACE_COLUMNS}, race_year)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(race.remote_id as i64)
        .bind(race.owner_id as i64)
        .bind(&race.name)
        .bind(&race.name_slug)
        .bind(format_utc_rfc3339(race.start_date))
        .bind(format_local(race.start_date_local))
        .bind(race.distance_meters)
        .bind(i64::from(race.moving_time_seconds))
        .bind(i64::from(race.elapsed_time_seconds))
        .bind(&race.route_polyline)
        .bind(race.race_year())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All races, newest first.
    pub async fn all_races(&self) -> Result<Vec<RaceActivity>> {
        let rows = sqlx::query(&format!(
            "SELECT {RACE_COLUMNS} FROM race_activity ORDER BY start_date_local DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_race).collect()
    }

    /// Find a race page by local year and slug.
    pub async fn race_by_year_and_slug(
        &self,
        year: i32,
        slug: &str,
    ) -> Result<Option<RaceActivity>> {
        let row = sqlx::query(&format!(
            "SELECT {RACE_COLUMNS} FROM race_activity
             WHERE race_year = ? AND name_slug = ?
             ORDER BY start_date_local DESC LIMIT 1"
        ))
        .bind(year)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_race).transpose()
    }

    pub async fn count_races(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM race_activity")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    // ─── Watermark Operations ────────────────────────────────────

    /// Start date of the most recently synced activity, if any sync completed.
    pub async fn get_watermark(&self, owner_id: u64) -> Result<Option<DateTime<Utc>>> {
        let value: Option<Option<String>> =
            sqlx::query_scalar("SELECT last_synced_at FROM sync_watermark WHERE owner_id = ?")
                .bind(owner_id as i64)
                .fetch_optional(&self.pool)
                .await?;

        value
            .flatten()
            .map(|text| parse_utc_rfc3339(&text))
            .transpose()
    }

    pub async fn set_watermark(&self, owner_id: u64, synced_at: DateTime<Utc>) -> Result<()> {
        let now = format_utc_rfc3339(Utc::now());
        sqlx::query(
            r#"
            INSERT INTO sync_watermark (owner_id, last_synced_at, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(owner_id) DO UPDATE SET
                last_synced_at=excluded.last_synced_at,
                updated_at=excluded.updated_at
            "#,
        )
        .bind(owner_id as i64)
        .bind(format_utc_rfc3339(synced_at))
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_credential(row: SqliteRow) -> Result<TokenCredential> {
    Ok(TokenCredential {
        owner_id: row.try_get::<i64, _>("owner_id")? as u64,
        access_token: row.try_get("access_token")?,
        refresh_token: row.try_get("refresh_token")?,
        expires_at: row.try_get("expires_at")?,
    })
}

fn row_to_race(row: SqliteRow) -> Result<RaceActivity> {
    let start_date: String = row.try_get("start_date")?;
    let start_date_local: String = row.try_get("start_date_local")?;

    Ok(RaceActivity {
        remote_id: row.try_get::<i64, _>("strava_id")? as u64,
        owner_id: row.try_get::<i64, _>("owner_id")? as u64,
        name: row.try_get("name")?,
        name_slug: row.try_get("name_slug")?,
        start_date: parse_utc_rfc3339(&start_date)?,
        start_date_local: parse_local(&start_date_local)?,
        distance_meters: row.try_get("distance")?,
        moving_time_seconds: row.try_get::<i64, _>("moving_time")? as u32,
        elapsed_time_seconds: row.try_get::<i64, _>("elapsed_time")? as u32,
        route_polyline: row.try_get("polyline")?,
    })
}
