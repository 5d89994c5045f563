use chrono::{DateTime, TimeZone, Utc};

fn fmt_ts(ms: i64) -> String {
    let dt: DateTime<Utc> = Utc
        .timestamp_millis_opt(ms)
        .single()
        .unwrap_or_else(Utc::now);
    dt.format("%Y%m%dT%H%M%S%3fZ").to_string()
}

/// File name of the intermediate image for the slide at `position` (0-based).
/// e.g. "slide_007.png"
pub fn slide_image_name(position: usize) -> String {
    format!("slide_{position:03}.png")
}

/// Folder holding frames accepted before a run failed.
/// e.g. "partial_20261018T093000000Z"
pub fn partial_dir_name(failed_at_ms: i64) -> String {
    format!("partial_{}", fmt_ts(failed_at_ms))
}

pub const MANIFEST_NAME: &str = "manifest.json";
pub const PAGE_SOURCE_NAME: &str = "page_source.html";
pub const ERROR_PAGE_SOURCE_NAME: &str = "error_page_source.html";

/// RFC 3339 timestamp used in the manifest.
pub fn rfc3339(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}
