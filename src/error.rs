// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.
//!
//! Every error aborts the command that raised it. The served site maps
//! `NotFound` to 404 and everything else to 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Application error type shared by the CLI commands and the site server.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A credential, athlete or race record is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network-level failure talking to Strava (connect, timeout, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Strava answered with a non-success status. Holds the status line.
    #[error("Strava API error: {0}")]
    Remote(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed timestamp or response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The OAuth authorization flow did not produce a code.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Status line Strava returns when the bearer token is rejected.
    pub const STRAVA_UNAUTHORIZED: &'static str = "401 Unauthorized";

    /// True for errors caused by a rejected access or refresh token.
    pub fn is_strava_token_error(&self) -> bool {
        match self {
            AppError::Remote(msg) => {
                msg == Self::STRAVA_UNAUTHORIZED || msg.contains("invalid_grant")
            }
            _ => false,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(msg) => {
                tracing::debug!(reason = %msg, "Page not found");
                StatusCode::NOT_FOUND
            }
            other => {
                tracing::error!(error = %other, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = status.canonical_reason().unwrap_or("Error").to_string();
        (status, body).into_response()
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
