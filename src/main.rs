// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race Archive command-line entry point.
//!
//! Syncs Strava races into SQLite and renders them as HTML.

use clap::Parser;
use race_archive::{cli::Cli, config::Config};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load .env before reading LOG_FORMAT / RUST_LOG
    dotenvy::dotenv().ok();
    init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    match race_archive::cli::run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_strava_token_error() {
                tracing::error!(
                    error = %e,
                    "Strava rejected the stored token, run `race-archive authorize --force-new`"
                );
            } else {
                tracing::error!(error = %e, "Command failed");
            }
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging: JSON when `LOG_FORMAT=json`, human-readable otherwise.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("race_archive=debug,info"));

    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
