//! Forum date normalization
//!
//! Thread logs print last-post dates either relative to the viewer's day
//! ("Yesterday, 03:45 PM", "Today, 10:00 AM") or as a written date
//! ("01-15-2025, 10:30 AM"). This is a best-effort matcher: anything it cannot
//! read resolves to `now` instead of failing the caller.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

/// Datetime layouts tried in order after RFC 3339
const DATETIME_FORMATS: &[&str] = &[
    "%m-%d-%Y, %I:%M %p",
    "%m-%d-%Y %I:%M %p",
    "%m-%d-%Y, %H:%M",
    "%m/%d/%Y, %I:%M %p",
    "%m/%d/%Y %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%B %d, %Y, %I:%M %p",
    "%B %d, %Y %I:%M %p",
    "%b %d, %Y, %I:%M %p",
    "%b %d, %Y %I:%M %p",
];

/// Date-only layouts; these resolve to midnight
const DATE_FORMATS: &[&str] = &[
    "%m-%d-%Y",
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
];

/// Turn a loosely formatted forum date into an absolute timestamp.
///
/// Forum wall-clock times carry no zone, so they are read as UTC.
pub fn normalize(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let cleaned = raw.trim();
    let lower = cleaned.to_lowercase();

    if lower.starts_with("yesterday") {
        return now.checked_sub_days(Days::new(1)).unwrap_or(now);
    }

    if lower.starts_with("today") {
        return now;
    }

    match parse_absolute(cleaned) {
        Some(parsed) => parsed,
        None => {
            debug!("Unreadable forum date {:?}, using now", cleaned);
            now
        }
    }
}

/// Parse a written date without any relative keywords
pub fn parse_absolute(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 18, 20, 0).unwrap()
    }

    #[test]
    fn test_yesterday_is_one_calendar_day_before_today() {
        let now = fixed_now();
        let yesterday = normalize("Yesterday, 03:45 PM", now);
        let today = normalize("Today, 03:45 PM", now);

        assert_eq!(today.date_naive(), now.date_naive());
        assert_eq!(
            yesterday.date_naive(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert_eq!(today.date_naive() - yesterday.date_naive(), chrono::TimeDelta::days(1));
    }

    #[test]
    fn test_relative_keywords_ignore_case_and_padding() {
        let now = fixed_now();
        assert_eq!(normalize("  TODAY, 01:00 AM ", now), now);
        assert_eq!(
            normalize("yesterday", now).date_naive(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
    }

    #[test]
    fn test_forum_date_with_meridiem() {
        let parsed = normalize("01-15-2025, 10:30 PM", fixed_now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 15, 22, 30, 0).unwrap());
    }

    #[test]
    fn test_date_only_resolves_to_midnight() {
        let parsed = normalize("2024-12-24", fixed_now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 12, 24, 0, 0, 0).unwrap());

        let written = normalize("March 3, 2024", fixed_now());
        assert_eq!(written, Utc.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_rfc3339_round_trips() {
        let parsed = normalize("2025-01-15T10:30:00Z", fixed_now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_garbage_falls_back_to_now() {
        let now = fixed_now();
        assert_eq!(normalize("not a date", now), now);
        assert_eq!(normalize("", now), now);
        assert_eq!(normalize("13-45-2025, 99:99 XM", now), now);
    }
}
