// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Served site routes.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Datelike, Utc};
use common::{race, scratch_dir, test_state};
use race_archive::config::Config;
use race_archive::routes::create_router;
use race_archive::AppState;
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

async fn seeded_state(config: Config) -> AppState {
    let state = test_state(config).await;
    for r in [
        race(42, "NYC Marathon", "2023-11-05T09:10:00"),
        race(7, "Spring 10K", "2023-04-02T08:00:00"),
        race(3, "First Half", "2019-03-10T07:30:00"),
    ] {
        state.db.insert_race(&r).await.unwrap();
    }
    state
}

async fn get(state: &AppState, uri: &str) -> (StatusCode, String) {
    let app = create_router(Arc::new(state.clone()));
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_index_lists_races_by_year() {
    let state = seeded_state(Config::default()).await;
    let (status, body) = get(&state, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("href=\"/2023/nyc-marathon/\""));
    assert!(body.contains("href=\"/2019/first-half/\""));
    assert!(body.find("<h2>2023</h2>").unwrap() < body.find("<h2>2019</h2>").unwrap());
    // Newest first within a year
    assert!(body.find("NYC Marathon").unwrap() < body.find("Spring 10K").unwrap());
    assert!(body.contains("/static/styles.css"));
}

#[tokio::test]
async fn test_race_page_with_and_without_trailing_slash() {
    let state = seeded_state(Config::default()).await;

    for uri in ["/2023/nyc-marathon", "/2023/nyc-marathon/"] {
        let (status, body) = get(&state, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(body.contains("<h1>NYC Marathon</h1>"));
        assert!(body.contains("26.22 mi"));
        assert!(body.contains("3:55:00"));
    }
}

#[tokio::test]
async fn test_race_page_shows_map_with_token() {
    let config = Config {
        mapbox_token: Some("pk.test".to_string()),
        ..Config::default()
    };
    let state = seeded_state(config).await;

    let (status, body) = get(&state, "/2023/nyc-marathon/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("path-3+f11-0.6(abc~def)"));
    assert!(body.contains("access_token=pk.test"));
}

#[tokio::test]
async fn test_not_found_rules() {
    let state = seeded_state(Config::default()).await;
    let next_year = Utc::now().year() + 1;

    for uri in [
        "/abcd/nyc-marathon".to_string(),
        "/2013/nyc-marathon".to_string(),
        format!("/{}/nyc-marathon", next_year),
        "/2023/unknown-race".to_string(),
        "/2019/nyc-marathon".to_string(),
        "/2023/nyc-marathon/extra".to_string(),
    ] {
        let (status, body) = get(&state, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, "Not Found", "{uri}");
    }
}

#[tokio::test]
async fn test_storage_error_is_500() {
    let state = seeded_state(Config::default()).await;
    sqlx::query("DROP TABLE race_activity")
        .execute(state.db.pool())
        .await
        .unwrap();

    let (status, body) = get(&state, "/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");
}

#[tokio::test]
async fn test_health() {
    let state = seeded_state(Config::default()).await;
    let (status, body) = get(&state, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["races"], 3);
}

#[tokio::test]
async fn test_static_files_and_security_headers() {
    let static_dir = scratch_dir("static");
    std::fs::write(static_dir.join("styles.css"), "body { margin: 0; }").unwrap();

    let config = Config {
        static_dir: static_dir.clone(),
        ..Config::default()
    };
    let state = test_state(config).await;
    let app = create_router(Arc::new(state));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/static/styles.css")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    assert!(response
        .headers()
        .get("Content-Security-Policy")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("https://api.mapbox.com"));

    std::fs::remove_dir_all(static_dir).ok();
}
