// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{NaiveDateTime, TimeZone, Utc};
use race_archive::config::Config;
use race_archive::models::{slugify, RaceActivity, TokenCredential};
use race_archive::AppState;
use serde_json::{json, Value};
use std::path::PathBuf;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing both Strava bases at a mock server.
#[allow(dead_code)]
pub fn mock_config(server: &MockServer) -> Config {
    Config {
        strava_api_base: format!("{}/api/v3", server.uri()),
        strava_oauth_base: format!("{}/oauth", server.uri()),
        http_timeout_secs: 2,
        ..Config::default()
    }
}

/// App state with a fresh in-memory database.
#[allow(dead_code)]
pub async fn test_state(config: Config) -> AppState {
    AppState::new(config)
        .await
        .expect("Failed to build test state")
}

/// Activity JSON as returned by the Strava feed.
#[allow(dead_code)]
pub fn activity_json(
    id: u64,
    name: &str,
    sport_type: &str,
    workout_type: Option<u8>,
    start_date: &str,
) -> Value {
    json!({
        "id": id,
        "name": name,
        "distance": 42195.0,
        "moving_time": 14000,
        "elapsed_time": 14100,
        "sport_type": sport_type,
        "workout_type": workout_type,
        "start_date": start_date,
        "start_date_local": start_date,
        "map": { "id": format!("a{}", id), "summary_polyline": "abc~def" }
    })
}

/// Mount one feed page; `expect(1)` so unexpected refetches fail the test.
#[allow(dead_code)]
pub async fn mount_page(server: &MockServer, page: u32, activities: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(activities)))
        .expect(1)
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub async fn store_credential(state: &AppState, owner_id: u64, expires_at: i64) -> TokenCredential {
    let credential = TokenCredential {
        owner_id,
        access_token: "a1".to_string(),
        refresh_token: "r1".to_string(),
        expires_at,
    };
    state
        .db
        .upsert_credential(&credential)
        .await
        .expect("Failed to store credential");
    credential
}

/// Stored race record with a local start of `local` (`%Y-%m-%dT%H:%M:%S`).
#[allow(dead_code)]
pub fn race(id: u64, name: &str, local: &str) -> RaceActivity {
    let start_date_local =
        NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S").expect("bad test date");
    RaceActivity {
        remote_id: id,
        owner_id: 7,
        name: name.to_string(),
        name_slug: slugify(name),
        start_date: Utc.from_utc_datetime(&start_date_local),
        start_date_local,
        distance_meters: 42195.0,
        moving_time_seconds: 14000,
        elapsed_time_seconds: 14100,
        route_polyline: "abc~def".to_string(),
    }
}

/// Unique scratch directory under the system temp dir.
#[allow(dead_code)]
pub fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "race-archive-{}-{}",
        label,
        hex::encode(rand::random::<[u8; 8]>())
    ));
    std::fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}
