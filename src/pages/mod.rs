// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTML pages for the race archive.
//!
//! Pages are plain strings built with `format!`. Every value interpolated
//! into markup goes through [`escape_html`].

pub mod format;

pub use format::{distance_miles, escape_html, mapbox_url, pace, time_formatted};

use crate::models::RaceActivity;
use std::fmt::Write as _;

const SITE_TITLE: &str = "Race Archive";

/// Where page assets live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetBase {
    /// Pages served by `serve`; assets under `/static/`
    Served,
    /// Pages written by `genhtml`; assets copied to the site root
    Generated,
}

impl AssetBase {
    pub fn stylesheet(self) -> &'static str {
        match self {
            AssetBase::Served => "/static/styles.css",
            AssetBase::Generated => "/styles.css",
        }
    }
}

/// Display values for one race, already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceView {
    pub name: String,
    pub date: String,
    pub distance: String,
    pub pace: String,
    pub time: String,
    pub map_url: String,
}

impl RaceView {
    pub fn from_race(race: &RaceActivity, mapbox_token: Option<&str>) -> Self {
        Self {
            name: race.name.clone(),
            date: race
                .start_date_local
                .format("%a, %d %b %Y %H:%M")
                .to_string(),
            distance: distance_miles(race.distance_meters),
            pace: pace(race.distance_meters, race.elapsed_time_seconds),
            time: time_formatted(race.elapsed_time_seconds),
            map_url: mapbox_url(&race.route_polyline, mapbox_token),
        }
    }
}

fn layout(title: &str, assets: AssetBase, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{title}</title>\n<link rel=\"stylesheet\" href=\"{css}\">\n</head>\n<body>\n\
<header><a href=\"/\">{site}</a></header>\n<main>\n{body}</main>\n</body>\n</html>\n",
        title = escape_html(title),
        css = assets.stylesheet(),
        site = SITE_TITLE,
        body = body,
    )
}

/// Index page: races grouped by year.
///
/// `races` must already be ordered newest first.
pub fn render_index(races: &[RaceActivity], assets: AssetBase) -> String {
    let mut body = String::new();

    if races.is_empty() {
        body.push_str("<p>No races yet.</p>\n");
    }

    let mut current_year = None;
    for race in races {
        let year = race.race_year();
        if current_year != Some(year) {
            if current_year.is_some() {
                body.push_str("</ul>\n</section>\n");
            }
            let _ = write!(body, "<section>\n<h2>{}</h2>\n<ul>\n", year);
            current_year = Some(year);
        }

        let _ = writeln!(
            body,
            "<li><a href=\"{href}\">{name}</a> <span>{date}</span> <span>{distance}</span></li>",
            href = escape_html(&race.page_path()),
            name = escape_html(&race.name),
            date = race.start_date_local.format("%b %-d"),
            distance = distance_miles(race.distance_meters),
        );
    }
    if current_year.is_some() {
        body.push_str("</ul>\n</section>\n");
    }

    layout(SITE_TITLE, assets, &body)
}

/// Detail page for one race.
pub fn render_race(race: &RaceActivity, mapbox_token: Option<&str>, assets: AssetBase) -> String {
    let view = RaceView::from_race(race, mapbox_token);

    let mut body = String::new();
    let _ = writeln!(body, "<h1>{}</h1>", escape_html(&view.name));
    let _ = writeln!(body, "<p class=\"date\">{}</p>", escape_html(&view.date));
    let _ = writeln!(
        body,
        "<dl>\n<dt>Distance</dt><dd>{}</dd>\n<dt>Pace</dt><dd>{}</dd>\n<dt>Time</dt><dd>{}</dd>\n</dl>",
        escape_html(&view.distance),
        escape_html(&view.pace),
        escape_html(&view.time),
    );
    if !view.map_url.is_empty() {
        let _ = writeln!(
            body,
            "<img class=\"map\" src=\"{}\" alt=\"Route map\" width=\"500\" height=\"300\">",
            escape_html(&view.map_url)
        );
    }

    layout(&view.name, assets, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn race(id: u64, name: &str, year: i32, month: u32) -> RaceActivity {
        let local = NaiveDate::from_ymd_opt(year, month, 5)
            .unwrap()
            .and_hms_opt(9, 10, 0)
            .unwrap();
        RaceActivity {
            remote_id: id,
            owner_id: 7,
            name: name.to_string(),
            name_slug: crate::models::slugify(name),
            start_date: Utc.from_utc_datetime(&local),
            start_date_local: local,
            distance_meters: 42195.0,
            moving_time_seconds: 14000,
            elapsed_time_seconds: 14100,
            route_polyline: "abc".to_string(),
        }
    }

    #[test]
    fn test_race_view() {
        let view = RaceView::from_race(&race(42, "NYC Marathon", 2023, 11), None);
        assert_eq!(view.date, "Sun, 05 Nov 2023 09:10");
        assert_eq!(view.distance, "26.22 mi");
        assert_eq!(view.pace, "8:58 /mi");
        assert_eq!(view.time, "3:55:00");
        assert_eq!(view.map_url, "");
    }

    #[test]
    fn test_index_groups_by_year() {
        let races = vec![
            race(3, "Turkey Trot", 2023, 11),
            race(2, "Spring 10K", 2023, 4),
            race(1, "First Half", 2021, 3),
        ];
        let html = render_index(&races, AssetBase::Served);

        assert_eq!(html.matches("<section>").count(), 2);
        let y2023 = html.find("<h2>2023</h2>").unwrap();
        let y2021 = html.find("<h2>2021</h2>").unwrap();
        assert!(y2023 < y2021);
        assert!(html.contains("href=\"/2023/turkey-trot/\""));
        assert!(html.contains("href=\"/2021/first-half/\""));
        assert!(html.contains("/static/styles.css"));
    }

    #[test]
    fn test_index_empty() {
        let html = render_index(&[], AssetBase::Generated);
        assert!(html.contains("No races yet."));
        assert!(!html.contains("<section>"));
        assert!(html.contains("href=\"/styles.css\""));
    }

    #[test]
    fn test_race_page_escapes_name() {
        let html = render_race(
            &race(9, "<script>alert(1)</script> 5K", 2022, 6),
            Some("pk.test"),
            AssetBase::Served,
        );
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("class=\"map\""));
        assert!(html.contains("access_token=pk.test"));
    }

    #[test]
    fn test_race_page_without_map() {
        let html = render_race(&race(9, "Bay 5K", 2022, 6), None, AssetBase::Served);
        assert!(!html.contains("<img"));
        assert!(html.contains("<dt>Pace</dt><dd>8:58 /mi</dd>"));
    }
}
