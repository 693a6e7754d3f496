// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client.
//!
//! Handles:
//! - Authorization URL construction
//! - Code exchange and token refresh (JSON body to `/oauth/token`)
//! - Paginated activity feed
//! - Single activity lookup
//!
//! No call is retried. Network failures map to `Transport`, non-2xx
//! statuses to `Remote` and undecodable bodies to `Parse`.

use crate::config::Config;
use crate::error::AppError;
use reqwest::Url;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    api_base: String,
    oauth_base: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a client from the application config.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            api_base: config.strava_api_base.trim_end_matches('/').to_string(),
            oauth_base: config.strava_oauth_base.trim_end_matches('/').to_string(),
            client_id: config.strava_client_id.clone(),
            client_secret: config.strava_client_secret.clone(),
        })
    }

    /// Secret of the OAuth application (signs the authorization `state`).
    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// URL the athlete opens to grant access.
    pub fn authorize_url(
        &self,
        redirect_uri: &str,
        scope: &str,
        state: &str,
    ) -> Result<String, AppError> {
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.oauth_base),
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("approval_prompt", "auto"),
                ("scope", scope),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Parse(format!("invalid OAuth base URL: {}", e)))?;

        Ok(url.into())
    }

    /// Exchange an authorization code for tokens (includes the athlete).
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        self.post_token(&TokenRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            grant_type: "authorization_code",
            code: Some(code),
            refresh_token: None,
        })
        .await
    }

    /// Trade a refresh token for a new access/refresh pair.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        self.post_token(&TokenRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            grant_type: "refresh_token",
            code: None,
            refresh_token: Some(refresh_token),
        })
        .await
    }

    /// Fetch one page of the athlete's activity feed.
    ///
    /// An empty page means there is nothing more to fetch.
    pub async fn list_activities(
        &self,
        access_token: &str,
        page: ActivityPage,
    ) -> Result<Vec<StravaActivity>, AppError> {
        let url = format!("{}/athlete/activities", self.api_base);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("page", page.page.to_string()),
                ("per_page", page.per_page.to_string()),
                ("after", page.after.to_string()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        check_response_json(response).await
    }

    /// Get a detailed activity by ID.
    pub async fn get_activity(
        &self,
        access_token: &str,
        activity_id: u64,
    ) -> Result<StravaActivity, AppError> {
        let url = format!("{}/activities/{}", self.api_base, activity_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        check_response_json(response).await
    }

    async fn post_token(&self, body: &TokenRequest<'_>) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_base))
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        check_response_json(response).await
    }
}

fn transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Transport(format!("request timed out: {}", err))
    } else {
        AppError::Transport(err.to_string())
    }
}

/// Check response status and decode the JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, body = %body, "Strava request failed");
        return Err(AppError::Remote(status.to_string()));
    }

    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::Parse(format!("Strava response body: {}", e)))
}

/// Paging parameters for the activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityPage {
    /// 1-based page number
    pub page: u32,
    pub per_page: u32,
    /// Only activities starting after this Unix timestamp
    pub after: i64,
}

/// Token endpoint request body.
#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

/// Token response from Strava (code exchange or refresh).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp
    pub expires_at: i64,
    /// Present on code exchange only
    #[serde(default)]
    pub athlete: Option<StravaAthlete>,
}

/// Athlete info from the OAuth token exchange.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StravaAthlete {
    pub id: u64,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    pub profile: Option<String>,
    pub profile_medium: Option<String>,
}

/// Strava's workout type code for a run race.
pub const WORKOUT_TYPE_RACE: u8 = 1;

/// Activity as returned by the feed and by the single-activity endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StravaActivity {
    pub id: u64,
    pub name: String,
    /// Meters
    #[serde(default)]
    pub distance: f64,
    /// Seconds
    #[serde(default)]
    pub moving_time: u32,
    /// Seconds
    #[serde(default)]
    pub elapsed_time: u32,
    pub sport_type: String,
    /// Null for activities without a workout type
    #[serde(default)]
    pub workout_type: Option<u8>,
    /// RFC3339, UTC
    pub start_date: String,
    /// RFC3339 with a `Z` suffix, but on the athlete's wall clock
    pub start_date_local: String,
    #[serde(default)]
    pub map: Option<StravaMap>,
}

impl StravaActivity {
    /// True for running races: sport "Run" with the race workout type.
    pub fn is_race(&self) -> bool {
        self.sport_type == "Run" && self.workout_type == Some(WORKOUT_TYPE_RACE)
    }

    /// Detailed polyline, falling back to the summary polyline.
    pub fn polyline(&self) -> Option<&str> {
        let map = self.map.as_ref()?;
        map.polyline
            .as_deref()
            .or(map.summary_polyline.as_deref())
            .filter(|p| !p.is_empty())
    }
}

/// Activity map data with polylines.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StravaMap {
    pub id: Option<String>,
    pub polyline: Option<String>,
    pub summary_polyline: Option<String>,
}
