//! In-fiction age calculation
//!
//! The forum's story is set a fixed number of years in the past. A character's
//! age is measured against "fictional today": the real date with the year
//! shifted back, month and day unchanged.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Years between the real calendar and the story calendar
pub const FICTIONAL_YEAR_OFFSET: i32 = 130;

const BIRTHDAY_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m-%d-%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

// "March 3rd, 1870" -> "March 3, 1870"
static ORDINAL_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap()
});

/// Parse a birthdate as written on a profile
pub fn parse_birthday(birthday: &str) -> Option<NaiveDate> {
    let cleaned = ORDINAL_SUFFIX.replace_all(birthday.trim(), "$1");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    BIRTHDAY_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&cleaned, format).ok())
}

/// Age on the story calendar, or `None` if the birthday cannot be read
pub fn fictional_age(birthday: &str, today: NaiveDate) -> Option<i32> {
    let born = parse_birthday(birthday)?;

    let fictional_year = today.year() - FICTIONAL_YEAR_OFFSET;
    let mut age = fictional_year - born.year();

    // Birthday not reached yet this fictional year
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }

    Some(age)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_birthday_already_passed() {
        // Fictional today is 1895-08-01, June 15 has passed
        let today = date(2025, 8, 1);
        assert_eq!(fictional_age("2020-06-15", today), Some((2025 - 130) - 2020));
    }

    #[test]
    fn test_birthday_not_yet_reached() {
        // Fictional today is 1895-03-01, June 15 still ahead
        let today = date(2025, 3, 1);
        assert_eq!(fictional_age("2020-06-15", today), Some((2025 - 130) - 2020 - 1));
    }

    #[test]
    fn test_exact_anniversary_has_no_decrement() {
        let today = date(2025, 10, 14);
        assert_eq!(fictional_age("1870-10-14", today), Some(25));
    }

    #[test]
    fn test_same_month_earlier_day_decrements() {
        let today = date(2025, 10, 13);
        assert_eq!(fictional_age("1870-10-14", today), Some(24));
    }

    #[test]
    fn test_written_birthdays() {
        let today = date(2025, 10, 14);
        assert_eq!(fictional_age("March 3rd, 1870", today), Some(25));
        assert_eq!(fictional_age("Dec 25, 1870", today), Some(24));
        assert_eq!(fictional_age("  12/25/1870 ", today), Some(24));
        assert_eq!(fictional_age("3 March 1870", today), Some(25));
    }

    #[test]
    fn test_invalid_birthday_is_none() {
        let today = date(2025, 10, 14);
        assert_eq!(fictional_age("sometime in spring", today), None);
        assert_eq!(fictional_age("", today), None);
        assert_eq!(fictional_age("02-30-1870", today), None);
    }
}
