use std::time::{Duration, SystemTime};

use chrono::{Local, NaiveDateTime};
use unicode_width::UnicodeWidthChar;

/// Format a server timestamp according to the configured date format.
///
/// The server sends local wall-clock times without an offset, so they are
/// compared against the local clock. If `date_format` is `"relative"` (or
/// empty), displays relative times like `"2h"`, `"3d"`, `"1w"`. Otherwise,
/// uses `strftime`-style formatting.
pub(crate) fn format_date(dt: &NaiveDateTime, date_format: &str) -> String {
    if date_format.is_empty() || date_format == "relative" {
        format_relative_time(dt, &Local::now().naive_local())
    } else {
        dt.format(date_format).to_string()
    }
}

/// Format `dt` relative to `now` (e.g., `"2h"`, `"3d"`, `"1w"`).
fn format_relative_time(dt: &NaiveDateTime, now: &NaiveDateTime) -> String {
    let duration = now.signed_duration_since(*dt);

    let minutes = duration.num_minutes();
    if minutes < 1 {
        return "now".to_owned();
    }
    if minutes < 60 {
        return format!("{minutes}m");
    }

    let hours = duration.num_hours();
    if hours < 24 {
        return format!("{hours}h");
    }

    let days = duration.num_days();
    if days < 7 {
        return format!("{days}d");
    }
    if days < 30 {
        return format!("{}w", days / 7);
    }
    if days < 365 {
        return format!("{}mo", days / 30);
    }

    format!("{}y", days / 365)
}

/// `"Updated ~12s ago"` style age of a wall-clock instant.
pub(crate) fn format_age(since: SystemTime) -> String {
    let secs = SystemTime::now()
        .duration_since(since)
        .unwrap_or(Duration::ZERO)
        .as_secs();
    if secs < 60 {
        format!("~{secs}s ago")
    } else if secs < 3600 {
        format!("~{}m ago", secs / 60)
    } else {
        format!("~{}h ago", secs / 3600)
    }
}

/// Cut `text` to at most `width` terminal columns, ending in `…` when cut.
pub(crate) fn truncate_to_width(text: &str, width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= width {
        return text.to_owned();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// First line of `text`, for single-row table cells.
pub(crate) fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .unwrap()
    }

    #[test]
    fn relative_time_buckets() {
        let now = at(12, 0);
        assert_eq!(format_relative_time(&at(12, 0), &now), "now");
        assert_eq!(format_relative_time(&at(11, 45), &now), "15m");
        assert_eq!(format_relative_time(&at(9, 0), &now), "3h");
    }

    #[test]
    fn strftime_format_is_used_verbatim() {
        assert_eq!(format_date(&at(9, 5), "%Y-%m-%d %H:%M"), "2025-03-14 09:05");
    }

    #[test]
    fn truncation_respects_wide_chars() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("Crash on save", 8), "Crash o…");
        // Each CJK char is two columns wide.
        assert_eq!(truncate_to_width("漢字漢字", 5), "漢字…");
    }

    #[test]
    fn first_line_of_multiline_text() {
        assert_eq!(first_line("one\ntwo"), "one");
        assert_eq!(first_line(""), "");
    }
}
