// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race archive pages.

use crate::error::{AppError, Result};
use crate::pages::{render_index, render_race, AssetBase};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Html,
    routing::get,
    Router,
};
use chrono::{Datelike, Utc};
use std::sync::Arc;

/// Site routes (index and race detail pages).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/{year}/{slug}", get(race_page))
        .route("/{year}/{slug}/", get(race_page))
}

/// All stored races, newest first, grouped by year.
async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    let races = state.db.all_races().await?;
    Ok(Html(render_index(&races, AssetBase::Served)))
}

/// Detail page for `/{year}/{slug}`.
async fn race_page(
    State(state): State<Arc<AppState>>,
    Path((year, slug)): Path<(String, String)>,
) -> Result<Html<String>> {
    let year = parse_race_year(&year, state.config.first_race_year, Utc::now().year())?;

    let race = state
        .db
        .race_by_year_and_slug(year, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("race {}/{}", year, slug)))?;

    Ok(Html(render_race(
        &race,
        state.config.mapbox_token.as_deref(),
        AssetBase::Served,
    )))
}

/// Accept only integer years in `[first_year, current_year]`.
pub fn parse_race_year(raw: &str, first_year: i32, current_year: i32) -> Result<i32> {
    let year: i32 = raw
        .parse()
        .map_err(|_| AppError::NotFound(format!("year {:?}", raw)))?;

    if year < first_year || year > current_year {
        return Err(AppError::NotFound(format!("year {} out of range", year)));
    }
    Ok(year)
}
