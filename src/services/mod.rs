// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod authorize;
pub mod site;
pub mod strava;
pub mod sync;
pub mod token;

pub use authorize::{AuthorizationState, CallbackListener};
pub use site::{SiteGenerator, SiteReport};
pub use strava::{StravaActivity, StravaClient, TokenResponse};
pub use sync::{RaceSync, SyncOutcome, SyncReport};
pub use token::TokenManager;
