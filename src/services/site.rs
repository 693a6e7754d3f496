// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Static site generation.
//!
//! Writes `index.html` plus one `{year}/{slug}/index.html` per stored race
//! and copies the static assets to the output root.

use crate::db::Database;
use crate::error::Result;
use crate::pages::{render_index, render_race, AssetBase};
use anyhow::Context;
use std::path::{Path, PathBuf};

/// What a generation run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteReport {
    /// HTML files written, index included
    pub pages: usize,
    /// Static files copied
    pub assets: usize,
}

pub struct SiteGenerator {
    db: Database,
    static_dir: PathBuf,
    out_dir: PathBuf,
    mapbox_token: Option<String>,
}

impl SiteGenerator {
    pub fn new(
        db: Database,
        static_dir: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
        mapbox_token: Option<String>,
    ) -> Self {
        Self {
            db,
            static_dir: static_dir.into(),
            out_dir: out_dir.into(),
            mapbox_token,
        }
    }

    pub async fn generate(&self) -> Result<SiteReport> {
        let races = self.db.all_races().await?;
        let mut report = SiteReport::default();

        tokio::fs::create_dir_all(&self.out_dir)
            .await
            .with_context(|| format!("creating {}", self.out_dir.display()))?;

        for race in &races {
            let dir = self
                .out_dir
                .join(race.race_year().to_string())
                .join(&race.name_slug);
            let html = render_race(race, self.mapbox_token.as_deref(), AssetBase::Generated);
            write_page(&dir, &html).await?;
            report.pages += 1;
        }

        write_page(&self.out_dir, &render_index(&races, AssetBase::Generated)).await?;
        report.pages += 1;

        report.assets = copy_static(&self.static_dir, &self.out_dir).await?;

        tracing::info!(
            out_dir = %self.out_dir.display(),
            pages = report.pages,
            assets = report.assets,
            "Site generated"
        );
        Ok(report)
    }
}

async fn write_page(dir: &Path, html: &str) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;

    let path = dir.join("index.html");
    tokio::fs::write(&path, html)
        .await
        .with_context(|| format!("writing {}", path.display()))?;

    tracing::debug!(path = %path.display(), "Wrote page");
    Ok(())
}

/// Copy the static tree into `out_dir`. Returns the number of files copied.
async fn copy_static(static_dir: &Path, out_dir: &Path) -> Result<usize> {
    if !tokio::fs::try_exists(static_dir).await.unwrap_or(false) {
        tracing::warn!(dir = %static_dir.display(), "Static directory not found, skipping assets");
        return Ok(0);
    }

    let mut copied = 0;
    let mut pending = vec![(static_dir.to_path_buf(), out_dir.to_path_buf())];

    while let Some((src, dst)) = pending.pop() {
        tokio::fs::create_dir_all(&dst)
            .await
            .with_context(|| format!("creating {}", dst.display()))?;

        let mut entries = tokio::fs::read_dir(&src)
            .await
            .with_context(|| format!("reading {}", src.display()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("reading {}", src.display()))?
        {
            let file_type = entry
                .file_type()
                .await
                .with_context(|| format!("inspecting {}", entry.path().display()))?;
            let target = dst.join(entry.file_name());

            if file_type.is_dir() {
                pending.push((entry.path(), target));
            } else {
                tokio::fs::copy(entry.path(), &target)
                    .await
                    .with_context(|| format!("copying {}", entry.path().display()))?;
                copied += 1;
            }
        }
    }

    Ok(copied)
}
