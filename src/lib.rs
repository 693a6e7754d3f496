// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Race Archive: keep a personal archive of Strava running races
//!
//! This crate syncs race activities from Strava into SQLite, keeps the
//! OAuth credential fresh, and renders the archive as HTML (served or
//! generated as a static site).

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pages;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use error::Result;
use services::{RaceSync, SiteGenerator, StravaClient, TokenManager};

/// Shared application state.
///
/// Built once per process and passed to every command and handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub strava: StravaClient,
}

impl AppState {
    /// Open the database and build the Strava client from `config`.
    pub async fn new(config: Config) -> Result<Self> {
        let db = Database::connect(&config.database_url).await?;
        let strava = StravaClient::from_config(&config)?;
        Ok(Self { config, db, strava })
    }

    pub fn token_manager(&self) -> TokenManager {
        TokenManager::new(self.strava.clone(), self.db.clone())
    }

    pub fn race_sync(&self) -> RaceSync {
        RaceSync::new(
            self.strava.clone(),
            self.db.clone(),
            self.config.sync_page_size,
        )
    }

    /// Site generator writing to `out_dir`.
    pub fn site_generator(&self, out_dir: std::path::PathBuf) -> SiteGenerator {
        SiteGenerator::new(
            self.db.clone(),
            self.config.static_dir.clone(),
            out_dir,
            self.config.mapbox_token.clone(),
        )
    }
}
