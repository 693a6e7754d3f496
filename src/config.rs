// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local use.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default Strava REST API base.
pub const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";
/// Default Strava OAuth base.
pub const STRAVA_OAUTH_BASE: &str = "https://www.strava.com/oauth";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Strava OAuth application ---
    /// Strava OAuth client ID
    pub strava_client_id: String,
    /// Strava OAuth client secret (also signs the OAuth `state`)
    pub strava_client_secret: String,
    /// Redirect URI registered with Strava
    pub redirect_uri: String,
    /// Requested OAuth scope
    pub oauth_scope: String,
    pub strava_api_base: String,
    pub strava_oauth_base: String,
    /// Athlete to operate on when several credentials are stored
    pub athlete_id: Option<u64>,

    // --- Sync ---
    /// Activities requested per feed page
    pub sync_page_size: u32,
    /// Timeout applied to every Strava request
    pub http_timeout_secs: u64,

    // --- Authorization listener ---
    /// Address the one-shot callback listener binds to
    pub callback_addr: String,
    /// How long to wait for the browser to come back
    pub authorize_timeout_secs: u64,

    // --- Storage ---
    pub database_url: String,

    // --- Site ---
    /// Port for `serve`
    pub port: u16,
    /// Earliest year with a race page
    pub first_race_year: i32,
    pub static_dir: PathBuf,
    pub dist_dir: PathBuf,
    /// Mapbox token for static route maps (optional)
    pub mapbox_token: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            redirect_uri: "http://localhost:8080/callback".to_string(),
            oauth_scope: "activity:read_all".to_string(),
            strava_api_base: STRAVA_API_BASE.to_string(),
            strava_oauth_base: STRAVA_OAUTH_BASE.to_string(),
            athlete_id: None,
            sync_page_size: 30,
            http_timeout_secs: 10,
            callback_addr: "127.0.0.1:0".to_string(),
            authorize_timeout_secs: 5,
            database_url: "sqlite::memory:".to_string(),
            port: 8080,
            first_race_year: 2014,
            static_dir: PathBuf::from("static"),
            dist_dir: PathBuf::from("dist"),
            mapbox_token: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            strava_client_id: env::var("STRAVA_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_ID"))?,
            strava_client_secret: env::var("STRAVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_SECRET"))?,
            redirect_uri: env::var("STRAVA_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:8080/callback".to_string()),
            oauth_scope: env::var("STRAVA_SCOPE")
                .unwrap_or_else(|_| "activity:read_all".to_string()),
            strava_api_base: env::var("STRAVA_API_BASE")
                .unwrap_or_else(|_| STRAVA_API_BASE.to_string()),
            strava_oauth_base: env::var("STRAVA_OAUTH_BASE")
                .unwrap_or_else(|_| STRAVA_OAUTH_BASE.to_string()),
            athlete_id: optional_var("STRAVA_ATHLETE_ID")?,

            sync_page_size: parsed_var("SYNC_PAGE_SIZE", 30)?,
            http_timeout_secs: parsed_var("HTTP_TIMEOUT_SECS", 10)?,

            callback_addr: env::var("CALLBACK_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            authorize_timeout_secs: parsed_var("AUTHORIZE_TIMEOUT_SECS", 300)?,

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://races.db".to_string()),

            port: parsed_var("PORT", 8080)?,
            first_race_year: parsed_var("FIRST_RACE_YEAR", 2014)?,
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
            dist_dir: env::var("DIST_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("dist")),
            mapbox_token: mapbox_token_from_env(),
        })
    }
}

/// Pick the Mapbox token for the current `APP_ENV` (PRD or DEV).
fn mapbox_token_from_env() -> Option<String> {
    let (app_env, key) = match env::var("APP_ENV").as_deref() {
        Ok("PRD") => ("PRD", "PRD_MAPBOX_ACCESS_TOKEN"),
        _ => ("DEV", "DEV_MAPBOX_ACCESS_TOKEN"),
    };

    match env::var(key) {
        Ok(token) if !token.trim().is_empty() => Some(token.trim().to_string()),
        _ => {
            tracing::warn!(app_env, "Mapbox access token not found, route maps disabled");
            None
        }
    }
}

fn parsed_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key, raw)),
        Err(_) => Ok(default),
    }
}

fn optional_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(key, raw)),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
