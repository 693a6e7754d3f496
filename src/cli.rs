// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Command-line interface.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::TokenCredential;
use crate::pages::{distance_miles, pace, time_formatted};
use crate::services::{AuthorizationState, CallbackListener};
use crate::AppState;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "race-archive")]
#[command(version, about = "Archive Strava running races and publish them as HTML")]
#[command(
    after_help = "Environment:\n  STRAVA_CLIENT_ID       Strava OAuth client ID (required)\n  STRAVA_CLIENT_SECRET   Strava OAuth client secret (required)\n  DATABASE_URL           SQLite database (default sqlite://races.db)\n  LOG_FORMAT             Set to `json` for JSON logs"
)]
pub struct Cli {
    /// Strava athlete ID to operate on (defaults to the stored credential)
    #[arg(long, global = true)]
    pub athlete: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authorize with Strava, or refresh the stored credential
    Authorize {
        /// Run the browser flow even if a credential is stored
        #[arg(long, default_value_t = false)]
        force_new: bool,
    },
    /// Fetch new race activities from Strava
    Sync,
    /// Print one Strava activity
    Show {
        /// Strava activity ID
        id: u64,
    },
    /// Generate the static site
    Genhtml {
        /// Output directory (defaults to DIST_DIR)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Serve the archive over HTTP until Ctrl-C
    Serve {
        /// Listen port (defaults to PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Run one command to completion.
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let state = AppState::new(config).await?;
    let athlete = cli.athlete.or(state.config.athlete_id);

    match cli.command {
        Command::Authorize { force_new } => authorize(&state, athlete, force_new).await,
        Command::Sync => sync(&state, athlete).await,
        Command::Show { id } => show(&state, athlete, id).await,
        Command::Genhtml { out } => {
            let out = out.unwrap_or_else(|| state.config.dist_dir.clone());
            let report = state.site_generator(out.clone()).generate().await?;
            println!(
                "Generated {} pages and copied {} assets into {}",
                report.pages,
                report.assets,
                out.display()
            );
            Ok(())
        }
        Command::Serve { port } => {
            let port = port.unwrap_or(state.config.port);
            serve(state, port).await
        }
    }
}

/// Refresh the stored credential, or run the browser flow when there is
/// none (or `force_new` is set).
async fn authorize(state: &AppState, athlete: Option<u64>, force_new: bool) -> Result<()> {
    if !force_new {
        let existing = match athlete {
            Some(id) => state.db.get_credential(id).await?,
            None => state.db.primary_credential().await?,
        };

        if let Some(credential) = existing {
            let refreshed = state.token_manager().refresh(&credential).await?;
            println!(
                "Refreshed Strava token for athlete {}",
                refreshed.owner_id
            );
            return Ok(());
        }
    }

    let credential = authorize_interactive(state, shutdown_signal()).await?;
    println!("Authorized Strava athlete {}", credential.owner_id);
    Ok(())
}

/// Browser authorization: print the URL, wait for the callback, exchange the
/// code and store the credential.
pub async fn authorize_interactive<F>(state: &AppState, cancel: F) -> Result<TokenCredential>
where
    F: Future<Output = ()>,
{
    let auth_state = AuthorizationState::new(state.strava.client_secret().as_bytes())?;
    let listener = CallbackListener::bind(&state.config.callback_addr).await?;
    let url = state.strava.authorize_url(
        &state.config.redirect_uri,
        &state.config.oauth_scope,
        auth_state.as_str(),
    )?;

    println!("Open this URL in a browser to authorize access to Strava:\n\n  {url}\n");

    let code = listener
        .wait_for_code(
            &auth_state,
            Duration::from_secs(state.config.authorize_timeout_secs),
            cancel,
        )
        .await?;

    let response = state.strava.exchange_code(&code).await?;
    state.token_manager().store_authorization(response).await
}

async fn sync(state: &AppState, athlete: Option<u64>) -> Result<()> {
    let tokens = state.token_manager();
    let owner_id = tokens.resolve_owner(athlete).await?;
    let access_token = tokens.ensure_valid_token(owner_id).await?;

    let report = state.race_sync().run(&access_token, owner_id).await?;
    println!(
        "Synced {} activities ({} races): {} new, {} already stored",
        report.activities, report.races, report.inserted, report.already_stored
    );
    Ok(())
}

async fn show(state: &AppState, athlete: Option<u64>, activity_id: u64) -> Result<()> {
    let tokens = state.token_manager();
    let owner_id = tokens.resolve_owner(athlete).await?;
    let access_token = tokens.ensure_valid_token(owner_id).await?;

    let activity = state.strava.get_activity(&access_token, activity_id).await?;
    println!("{} ({})", activity.name, activity.id);
    println!("  Date:     {}", activity.start_date_local);
    println!("  Sport:    {}", activity.sport_type);
    println!("  Distance: {}", distance_miles(activity.distance));
    println!("  Pace:     {}", pace(activity.distance, activity.elapsed_time));
    println!("  Time:     {}", time_formatted(activity.elapsed_time));
    println!("  Race:     {}", if activity.is_race() { "yes" } else { "no" });
    Ok(())
}

async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = crate::routes::create_router(Arc::new(state));

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
