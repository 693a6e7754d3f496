//! OAuth credential and athlete models for storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Strava OAuth tokens for one athlete (one row per owner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCredential {
    /// Strava athlete ID owning the tokens
    pub owner_id: u64,
    /// Bearer token for API calls
    pub access_token: String,
    /// Token used to obtain a new access token
    pub refresh_token: String,
    /// When the access token expires (Unix seconds)
    pub expires_at: i64,
}

impl TokenCredential {
    /// An access token is expired once `now` is strictly past `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.expires_at
    }
}

/// Athlete profile captured from the initial token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Athlete {
    /// Strava athlete ID
    pub strava_id: u64,
    pub first_name: String,
    pub last_name: String,
    /// Profile picture URL
    pub profile: Option<String>,
    /// Medium-size profile picture URL
    pub profile_medium: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn credential(expires_at: i64) -> TokenCredential {
        TokenCredential {
            owner_id: 7,
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_expiry_is_strict() {
        let now = Utc::now();
        assert!(!credential(now.timestamp()).is_expired_at(now));
        assert!(credential(now.timestamp() - 1).is_expired_at(now));
        assert!(!credential((now + Duration::hours(1)).timestamp()).is_expired_at(now));
    }
}
