//! Published-date normalization.
//!
//! Feeds carry dates in whatever shape their generator prefers. Everything is
//! converted to UTC and rendered as `YYYY-MM-DD HH:MM:SS`; values without an
//! offset are assumed to already be UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats carrying an explicit offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
];

/// Formats without an offset, read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d %b %Y", "%B %d, %Y"];

/// Normalize a feed date string, returning an empty string when it cannot
/// be parsed.
pub fn normalize(raw: &str) -> String {
    parse(raw).map(format_timestamp).unwrap_or_default()
}

pub fn format_timestamp(datetime: DateTime<Utc>) -> String {
    datetime.format(CANONICAL_FORMAT).to_string()
}

/// Parse a loosely formatted date into UTC.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(date.with_timezone(&Utc));
    }

    // RFC 822 also allows zone names such as "EST", which chrono's RFC 2822
    // parser rejects when paired with a two-digit year.
    if let Some(date) = parse_with_trailing_zone_name(trimmed) {
        return Some(date);
    }

    // W3C-DTF allows a trailing `Z` on any precision, `%z` only reads numbers.
    let zoned = match trimmed.strip_suffix('Z') {
        Some(rest) => format!("{}+00:00", rest),
        None => trimmed.to_string(),
    };
    for format in OFFSET_FORMATS {
        if let Ok(date) = DateTime::parse_from_str(&zoned, format) {
            return Some(date.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

/// Handle `... 12:00:00 UTC` style strings that name the zone instead of
/// giving an offset.
fn parse_with_trailing_zone_name(raw: &str) -> Option<DateTime<Utc>> {
    let (rest, zone) = raw.rsplit_once(' ')?;
    let offset = match zone {
        "UT" | "UTC" | "GMT" | "Z" => "+0000",
        "EST" => "-0500",
        "EDT" => "-0400",
        "CST" => "-0600",
        "CDT" => "-0500",
        "MST" => "-0700",
        "MDT" => "-0600",
        "PST" => "-0800",
        "PDT" => "-0700",
        _ => return None,
    };
    let with_offset = format!("{} {}", rest, offset);

    if let Ok(date) = DateTime::parse_from_rfc2822(&with_offset) {
        return Some(date.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%dT%H:%M:%S %z"]
        .iter()
        .find_map(|format| DateTime::parse_from_str(&with_offset, format).ok())
        .map(|date| date.with_timezone(&Utc))
}
