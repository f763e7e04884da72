//! Profile page stats extraction
//!
//! The profile template exposes a few micro-fields (`.mp-age`, `.mp-blood`,
//! `.mp-ship`) and a free-form bio block where the birthdate is written as
//! `<strong>Birthdate:</strong> March 3, 1870`.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use crate::age;
use crate::models::CharacterStats;

static AGE_FIELD: Lazy<Selector> = Lazy::new(|| Selector::parse(".mp-age").unwrap());
static BLOOD_FIELD: Lazy<Selector> = Lazy::new(|| Selector::parse(".mp-blood").unwrap());
static SHIP_FIELD: Lazy<Selector> = Lazy::new(|| Selector::parse(".mp-ship").unwrap());
static BIO_BLOCK: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".mp-profilecontent .mp-scrollpad").unwrap()
});

static BIRTHDATE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<strong>\s*Birthdate:\s*</strong>\s*([^<]+)").unwrap()
});

// Leading integer, the way a stated age like "85 years" is read
static LEADING_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+").unwrap());

/// Read the profile stats; missing fields fall back to their defaults
pub fn extract_stats(doc: &Html, today: NaiveDate) -> CharacterStats {
    let mut stats = CharacterStats {
        age: field_text(doc, &AGE_FIELD).as_deref().and_then(parse_stated_age),
        blood: field_text(doc, &BLOOD_FIELD).unwrap_or_default(),
        ship: field_text(doc, &SHIP_FIELD).unwrap_or_default(),
        ..Default::default()
    };

    if let Some(birthday) = birthdate(doc) {
        let calculated = age::fictional_age(&birthday, today);
        if calculated.is_none() {
            debug!("Unreadable birthdate {:?}", birthday);
        }
        stats.reconcile(birthday, calculated);
    }

    stats
}

/// Stated age as an integer, ignoring any trailing words
pub fn parse_stated_age(text: &str) -> Option<i32> {
    LEADING_INT
        .find(text.trim())
        .and_then(|m| m.as_str().parse::<i32>().ok())
}

/// Text following the "Birthdate:" label in the bio block
pub fn birthdate(doc: &Html) -> Option<String> {
    let block = doc.select(&BIO_BLOCK).next()?;
    let html = block.inner_html();

    let cap = BIRTHDATE_MARKER.captures(&html)?;
    let value = decode_entities(cap[1].trim());
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn field_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

// inner_html re-escapes text, undo the common entities
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("\u{a0}", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
