use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Naive date-time layouts seen in the wild on feeds that omit an offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

/// Parse an RFC-822, ISO-8601, or common loose date string into a UTC
/// timestamp. Naive values are assigned `default_offset`. Returns `None`
/// for empty or unrecognized input; never panics.
pub fn parse_flexible_date(text: &str, default_offset: FixedOffset) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return localize(naive, default_offset);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return localize(date.and_hms_opt(0, 0, 0)?, default_offset);
    }

    None
}

fn localize(naive: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// True iff `timestamp` falls within the last `hours` hours, inclusive at
/// the boundary. A missing timestamp is never within the window.
pub fn is_within_window(timestamp: Option<DateTime<Utc>>, hours: i64) -> bool {
    let Some(ts) = timestamp else {
        return false;
    };
    let cutoff = Utc::now() - Duration::hours(hours);
    ts >= cutoff
}
