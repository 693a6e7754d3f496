// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-shot OAuth callback listener.
//!
//! The athlete opens the Strava authorize URL in a browser; Strava redirects
//! back to `/callback?code=...&state=...`. The listener answers exactly one
//! callback and then shuts down. The wait is bounded by a timeout and can be
//! cancelled (Ctrl-C).

use crate::error::{AppError, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Signed OAuth `state` issued for one authorization attempt.
///
/// Encoded as base64url of `nonce_hex|timestamp_hex|signature_hex`.
#[derive(Clone)]
pub struct AuthorizationState {
    nonce: String,
    encoded: String,
    secret: Vec<u8>,
}

impl AuthorizationState {
    /// Issue a fresh state signed with `secret`.
    pub fn new(secret: &[u8]) -> Result<Self> {
        let nonce = hex::encode(rand::random::<[u8; 16]>());
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_millis();

        let payload = format!("{}|{:x}", nonce, timestamp);
        let signature = sign(&payload, secret)?;
        let encoded = URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature).as_bytes());

        Ok(Self {
            nonce,
            encoded,
            secret: secret.to_vec(),
        })
    }

    /// Value for the `state` query parameter.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// True if `received` carries a valid signature over this attempt's nonce.
    pub fn verify(&self, received: &str) -> bool {
        verify_and_decode_state(received, &self.secret).as_deref() == Some(self.nonce.as_str())
    }
}

fn sign(payload: &str, secret: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify the HMAC signature and return the nonce from an OAuth state.
fn verify_and_decode_state(state: &str, secret: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "nonce_hex|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    let payload = format!("{}|{}", parts[0], parts[1]);
    let signature = hex::decode(parts[2]).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch");
        return None;
    }

    Some(parts[0].to_string())
}

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

struct CallbackShared {
    expected: AuthorizationState,
    sender: Mutex<Option<oneshot::Sender<Result<String>>>>,
}

/// Check the callback parameters against the issued state.
fn check_callback(expected: &AuthorizationState, params: CallbackParams) -> Result<String> {
    if let Some(error) = params.error {
        return Err(AppError::Authorization(format!("Strava returned {}", error)));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Authorization("Missing code param".to_string()))?;

    match params.state {
        Some(state) if expected.verify(&state) => Ok(code),
        _ => Err(AppError::Authorization("Invalid state param".to_string())),
    }
}

/// Handle the single Strava redirect.
async fn callback(
    State(shared): State<Arc<CallbackShared>>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, String) {
    let Some(sender) = shared.sender.lock().await.take() else {
        return (
            StatusCode::GONE,
            "Authorization already handled.".to_string(),
        );
    };

    let outcome = check_callback(&shared.expected, params);
    let reply = match &outcome {
        Ok(_) => (
            StatusCode::OK,
            "Strava authorization received. You can close this window.".to_string(),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Rejected OAuth callback");
            (StatusCode::BAD_REQUEST, e.to_string())
        }
    };

    let _ = sender.send(outcome);
    reply
}

/// Bound listener for the OAuth redirect.
pub struct CallbackListener {
    listener: TcpListener,
}

impl CallbackListener {
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            AppError::Authorization(format!("Cannot listen on {}: {}", addr, e))
        })?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Listener address: {}", e)))
    }

    /// Serve `/callback` until the first request, the timeout, or `cancel`.
    ///
    /// Returns the authorization code carried by a valid callback. The server
    /// is shut down before returning in every case.
    pub async fn wait_for_code<F>(
        self,
        expected: &AuthorizationState,
        timeout: Duration,
        cancel: F,
    ) -> Result<String>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        let (code_tx, code_rx) = oneshot::channel();
        let shared = Arc::new(CallbackShared {
            expected: expected.clone(),
            sender: Mutex::new(Some(code_tx)),
        });

        let app = Router::new()
            .route("/callback", get(callback))
            .with_state(shared);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(self.listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!(address = %addr, "Waiting for Strava authorization callback");

        let outcome = tokio::select! {
            received = code_rx => received.unwrap_or_else(|_| {
                Err(AppError::Authorization("Callback listener stopped".to_string()))
            }),
            _ = tokio::time::sleep(timeout) => Err(AppError::Authorization(format!(
                "No callback received within {}s",
                timeout.as_secs()
            ))),
            _ = cancel => Err(AppError::Authorization("Cancelled".to_string())),
        };

        let _ = shutdown_tx.send(());
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Callback server error"),
            Err(e) => tracing::warn!(error = %e, "Callback server task failed"),
        }
        tracing::info!("Callback listener shut down");

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip() {
        let state = AuthorizationState::new(b"secret_key").unwrap();
        assert!(state.verify(state.as_str()));
    }

    #[test]
    fn test_state_is_url_safe() {
        let state = AuthorizationState::new(b"secret_key").unwrap();
        assert!(!state.as_str().contains('+'));
        assert!(!state.as_str().contains('/'));
        assert!(!state.as_str().contains('='));
    }

    #[test]
    fn test_state_from_other_attempt_is_rejected() {
        let first = AuthorizationState::new(b"secret_key").unwrap();
        let second = AuthorizationState::new(b"secret_key").unwrap();
        assert!(!first.verify(second.as_str()));
    }

    #[test]
    fn test_state_wrong_secret() {
        let state = AuthorizationState::new(b"secret_key").unwrap();
        assert_eq!(verify_and_decode_state(state.as_str(), b"wrong_key"), None);
    }

    #[test]
    fn test_state_tampered_signature() {
        let state = AuthorizationState::new(b"secret_key").unwrap();
        let forged = URL_SAFE_NO_PAD.encode(format!("{}|abc|deadbeef", state.nonce));
        assert!(!state.verify(&forged));
        assert!(!state.verify("not-valid-base64!!!"));
        assert!(!state.verify(&URL_SAFE_NO_PAD.encode("invalid|format")));
    }

    #[test]
    fn test_check_callback() {
        let state = AuthorizationState::new(b"secret_key").unwrap();
        let params = |code: Option<&str>, st: Option<&str>, error: Option<&str>| CallbackParams {
            code: code.map(str::to_string),
            state: st.map(str::to_string),
            error: error.map(str::to_string),
        };

        assert_eq!(
            check_callback(&state, params(Some("abc"), Some(state.as_str()), None)).unwrap(),
            "abc"
        );
        assert!(check_callback(&state, params(None, Some(state.as_str()), None)).is_err());
        assert!(check_callback(&state, params(Some("abc"), None, None)).is_err());
        assert!(check_callback(
            &state,
            params(Some("abc"), Some(state.as_str()), Some("access_denied"))
        )
        .is_err());
    }
}
