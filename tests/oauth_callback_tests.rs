// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-shot OAuth callback listener and code exchange.

mod common;

use common::{mock_config, test_state};
use race_archive::error::AppError;
use race_archive::services::{AuthorizationState, CallbackListener};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &[u8] = b"test_secret";

/// Bind a listener and wait for one callback in the background.
async fn start_listener(
    timeout: Duration,
) -> (
    String,
    AuthorizationState,
    tokio::task::JoinHandle<Result<String, AppError>>,
) {
    let listener = CallbackListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let state = AuthorizationState::new(SECRET).unwrap();

    let expected = state.clone();
    let handle = tokio::spawn(async move {
        listener
            .wait_for_code(&expected, timeout, std::future::pending())
            .await
    });

    (base, state, handle)
}

#[tokio::test]
async fn test_valid_callback_returns_code() {
    let (base, state, handle) = start_listener(Duration::from_secs(5)).await;

    let response = reqwest::get(format!(
        "{}/callback?code=abc123&state={}&scope=read,activity:read_all",
        base,
        state.as_str()
    ))
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("close this window"));
    assert_eq!(handle.await.unwrap().unwrap(), "abc123");
}

#[tokio::test]
async fn test_listener_stops_after_first_request() {
    let (base, _state, handle) = start_listener(Duration::from_secs(5)).await;

    let response = reqwest::get(format!("{}/callback?code=abc123&state=forged", base))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    drop(response);

    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    // The server is gone once the wait returns.
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    assert!(client
        .get(format!("{}/callback?code=again", base))
        .send()
        .await
        .is_err());
}

#[tokio::test]
async fn test_missing_code_is_rejected() {
    let (base, state, handle) = start_listener(Duration::from_secs(5)).await;

    let response = reqwest::get(format!("{}/callback?state={}", base, state.as_str()))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert!(response.text().await.unwrap().contains("Missing code param"));
    assert!(matches!(
        handle.await.unwrap(),
        Err(AppError::Authorization(_))
    ));
}

#[tokio::test]
async fn test_denied_access_is_rejected() {
    let (base, state, handle) = start_listener(Duration::from_secs(5)).await;

    let response = reqwest::get(format!(
        "{}/callback?error=access_denied&state={}",
        base,
        state.as_str()
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), 400);
    drop(response);

    match handle.await.unwrap() {
        Err(AppError::Authorization(msg)) => assert!(msg.contains("access_denied")),
        other => panic!("expected Authorization error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wait_times_out() {
    let listener = CallbackListener::bind("127.0.0.1:0").await.unwrap();
    let state = AuthorizationState::new(SECRET).unwrap();

    let err = listener
        .wait_for_code(&state, Duration::from_millis(100), std::future::pending())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));
}

#[tokio::test]
async fn test_wait_can_be_cancelled() {
    let listener = CallbackListener::bind("127.0.0.1:0").await.unwrap();
    let state = AuthorizationState::new(SECRET).unwrap();

    let err = listener
        .wait_for_code(&state, Duration::from_secs(60), std::future::ready(()))
        .await
        .unwrap_err();
    match err {
        AppError::Authorization(msg) => assert_eq!(msg, "Cancelled"),
        other => panic!("expected Authorization error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_code_exchange_stores_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_partial_json(json!({
            "grant_type": "authorization_code",
            "code": "abc123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "a1",
            "refresh_token": "r1",
            "expires_at": 1_900_000_000i64,
            "athlete": { "id": 7, "firstname": "Ada", "lastname": "Runner" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = test_state(mock_config(&server)).await;
    let response = state.strava.exchange_code("abc123").await.unwrap();
    let credential = state
        .token_manager()
        .store_authorization(response)
        .await
        .unwrap();

    assert_eq!(credential.owner_id, 7);
    assert_eq!(
        state.db.primary_credential().await.unwrap(),
        Some(credential)
    );
    assert_eq!(
        state.db.get_athlete(7).await.unwrap().unwrap().last_name,
        "Runner"
    );
}
