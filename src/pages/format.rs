//! Display formatting for race pages.

/// Meters to statute miles.
const MILES_PER_METER: f64 = 0.000621371;

const MAPBOX_STATIC_BASE: &str = "https://api.mapbox.com/styles/v1/mapbox/streets-v12/static";

/// Distance in miles with two decimals, e.g. `26.22 mi`.
pub fn distance_miles(meters: f64) -> String {
    format!("{:.2} mi", meters * MILES_PER_METER)
}

/// Pace in minutes per mile, `M:SS /mi`.
///
/// Uses whole elapsed minutes. Returns `--` when the distance is zero.
pub fn pace(meters: f64, elapsed_seconds: u32) -> String {
    let miles = meters * MILES_PER_METER;
    if miles <= 0.0 {
        return "--".to_string();
    }

    let minutes = f64::from(elapsed_seconds / 60);
    let pace = minutes / miles;
    let mut pace_minutes = pace.floor() as u64;
    let mut pace_seconds = ((pace - pace.floor()) * 60.0).round() as u64;
    if pace_seconds == 60 {
        pace_minutes += 1;
        pace_seconds = 0;
    }

    format!("{}:{:02} /mi", pace_minutes, pace_seconds)
}

/// Elapsed time as `H:MM:SS`.
pub fn time_formatted(elapsed_seconds: u32) -> String {
    let hours = elapsed_seconds / 3600;
    let minutes = (elapsed_seconds % 3600) / 60;
    let seconds = elapsed_seconds % 60;
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}

/// Static map image URL for an encoded polyline.
///
/// Empty when there is no token or no polyline; the page then renders
/// without a map.
pub fn mapbox_url(polyline: &str, token: Option<&str>) -> String {
    match token {
        Some(token) if !token.is_empty() && !polyline.is_empty() => format!(
            "{}/path-3+f11-0.6({})/auto/500x300?logo=false&access_token={}",
            MAPBOX_STATIC_BASE,
            urlencoding::encode(polyline),
            urlencoding::encode(token)
        ),
        _ => String::new(),
    }
}

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
