// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth token lifecycle: store, check, refresh.

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Athlete, TokenCredential};
use crate::services::strava::{StravaClient, TokenResponse};
use chrono::{DateTime, Utc};

/// Keeps the stored Strava credential usable.
///
/// A refresh happens only when the stored access token is strictly past its
/// expiry. Remote failures are returned unchanged and leave the stored
/// credential untouched.
#[derive(Clone)]
pub struct TokenManager {
    client: StravaClient,
    db: Database,
}

impl TokenManager {
    pub fn new(client: StravaClient, db: Database) -> Self {
        Self { client, db }
    }

    /// Pick the athlete to operate on.
    ///
    /// An explicit ID wins; otherwise the single stored credential is used.
    pub async fn resolve_owner(&self, requested: Option<u64>) -> Result<u64> {
        if let Some(owner_id) = requested {
            return Ok(owner_id);
        }

        self.db
            .primary_credential()
            .await?
            .map(|c| c.owner_id)
            .ok_or_else(|| {
                AppError::NotFound("No stored Strava credential, run `authorize` first".to_string())
            })
    }

    /// Get a usable access token for the athlete, refreshing it if expired.
    pub async fn ensure_valid_token(&self, owner_id: u64) -> Result<String> {
        self.ensure_valid_token_at(owner_id, Utc::now()).await
    }

    /// Same as [`ensure_valid_token`](Self::ensure_valid_token) with an explicit clock.
    pub async fn ensure_valid_token_at(&self, owner_id: u64, now: DateTime<Utc>) -> Result<String> {
        let credential = self
            .db
            .get_credential(owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Credential for athlete {}", owner_id)))?;

        if !credential.is_expired_at(now) {
            return Ok(credential.access_token);
        }

        tracing::info!(
            athlete_id = owner_id,
            expires_at = credential.expires_at,
            "Access token expired, refreshing"
        );
        let refreshed = self.refresh(&credential).await?;
        Ok(refreshed.access_token)
    }

    /// Refresh unconditionally and persist the new tokens.
    pub async fn refresh(&self, credential: &TokenCredential) -> Result<TokenCredential> {
        let response = self.client.refresh_token(&credential.refresh_token).await?;

        let updated = TokenCredential {
            owner_id: credential.owner_id,
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: response.expires_at,
        };
        self.db.update_credential(&updated).await?;

        tracing::info!(
            athlete_id = updated.owner_id,
            expires_at = updated.expires_at,
            "Token refreshed and stored"
        );
        Ok(updated)
    }

    /// Persist the result of an authorization code exchange.
    ///
    /// Stores the credential and, when Strava returned an athlete profile that
    /// is not stored yet, the athlete.
    pub async fn store_authorization(&self, response: TokenResponse) -> Result<TokenCredential> {
        let athlete = response.athlete.ok_or_else(|| {
            AppError::Parse("Token exchange response has no athlete".to_string())
        })?;

        let credential = TokenCredential {
            owner_id: athlete.id,
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: response.expires_at,
        };
        self.db.upsert_credential(&credential).await?;

        if self.db.get_athlete(athlete.id).await?.is_none() {
            tracing::info!(athlete_id = athlete.id, "Inserting Strava athlete");
            self.db
                .insert_athlete(&Athlete {
                    strava_id: athlete.id,
                    first_name: athlete.firstname,
                    last_name: athlete.lastname,
                    profile: athlete.profile,
                    profile_medium: athlete.profile_medium,
                })
                .await?;
        }

        tracing::info!(athlete_id = credential.owner_id, "Strava credential stored");
        Ok(credential)
    }
}
