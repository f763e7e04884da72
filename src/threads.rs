//! Thread-log table extraction
//!
//! A character's profile carries a `#threadlog` table. Each thread is one
//! `<tr>` with class `active` or `closed`:
//!
//! ```html
//! <tr class="active">
//!   <td><a href="showthread.php?tid=412">A Quiet Evening</a></td>
//!   <td>Ada, Silas</td>
//!   <td>Last post by <a href="member.php?action=profile&uid=7">Silas</a> on Yesterday, 10:00 AM</td>
//! </tr>
//! ```
//!
//! The markup shifts often, so every field has a fallback and a default.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};

use crate::dates;
use crate::models::{Thread, UNKNOWN_POSTER, UNKNOWN_THREAD};

static THREAD_ROWS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("#threadlog tr.active, #threadlog tr.closed").unwrap()
});
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("td:first-child a").unwrap());
static THREAD_VIEW_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[href*="showthread"]"#).unwrap());
static CELLS: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static LAST_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td:last-child").unwrap());
static MEMBER_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[href*="member.php"]"#).unwrap());

static UID_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"uid=(\d+)").unwrap());
static TID_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"tid=(\d+)").unwrap());

// Date clause fallbacks, tried in order
static ON_CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bon\s+(.+?)$").unwrap());
static NUMERIC_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{2}-\d{2}-\d{4}.*)").unwrap());

/// Why a single row was skipped
#[derive(Debug, Error)]
enum RowError {
    #[error("row has no table cells")]
    NoCells,
}

/// Extract every thread row, in document order.
///
/// A row that cannot be interpreted is skipped with a warning; the rest of
/// the table is still returned. Closed threads are kept.
pub fn extract_threads(doc: &Html, character_id: u64, now: DateTime<Utc>) -> Vec<Thread> {
    let mut threads = Vec::new();

    for (index, row) in doc.select(&THREAD_ROWS).enumerate() {
        match parse_row(row, index, character_id, now) {
            Ok(thread) => threads.push(thread),
            Err(e) => warn!("Skipping thread row {}: {}", index, e),
        }
    }

    debug!("Parsed {} threads from thread log", threads.len());
    threads
}

fn parse_row(
    row: ElementRef<'_>,
    index: usize,
    character_id: u64,
    now: DateTime<Utc>,
) -> Result<Thread, RowError> {
    let cells: Vec<ElementRef<'_>> = row.select(&CELLS).collect();
    if cells.is_empty() {
        return Err(RowError::NoCells);
    }

    let is_active = row.value().classes().any(|class| class == "active");

    let title_link = row
        .select(&TITLE_LINK)
        .next()
        .or_else(|| row.select(&THREAD_VIEW_LINK).next());
    let title = title_link
        .map(element_text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| UNKNOWN_THREAD.to_string());
    let url = title_link
        .and_then(|link| link.value().attr("href"))
        .unwrap_or_default()
        .to_string();

    let participants = cells.get(1).map(|cell| element_text(*cell)).unwrap_or_default();

    let last_cell = row.select(&LAST_CELL).next();
    let poster_link = last_cell.and_then(|cell| cell.select(&MEMBER_LINK).next());
    let last_poster = poster_link
        .map(element_text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| UNKNOWN_POSTER.to_string());
    let last_poster_uid = poster_link
        .and_then(|link| link.value().attr("href"))
        .and_then(uid_from_link);

    let cell_text = last_cell.map(collapsed_text).unwrap_or_default();
    let last_post_date = match date_clause(&cell_text) {
        Some(clause) => dates::normalize(clause, now),
        None => now,
    };

    let id = tid_from_url(&url).unwrap_or_else(|| format!("thread-{}", index));

    Ok(Thread {
        id,
        title,
        url,
        participants,
        last_poster,
        last_poster_uid,
        last_post_date,
        is_active,
        needs_reply: needs_reply(last_poster_uid, character_id),
    })
}

/// A thread needs a reply when someone else is known to have posted last
pub fn needs_reply(last_poster_uid: Option<u64>, character_id: u64) -> bool {
    matches!(last_poster_uid, Some(uid) if uid != character_id)
}

/// Numeric `uid` query parameter of a member link
pub fn uid_from_link(href: &str) -> Option<u64> {
    UID_PARAM
        .captures(href)
        .and_then(|cap| cap[1].parse::<u64>().ok())
}

/// Numeric `tid` query parameter of a thread link
pub fn tid_from_url(url: &str) -> Option<String> {
    TID_PARAM.captures(url).map(|cap| cap[1].to_string())
}

/// Date portion of a last-post cell: text after "on", else an `MM-DD-YYYY` run
pub fn date_clause(cell_text: &str) -> Option<&str> {
    ON_CLAUSE
        .captures(cell_text)
        .or_else(|| NUMERIC_DATE.captures(cell_text))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    const CHARACTER_ID: u64 = 42;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 18, 20, 0).unwrap()
    }

    fn threadlog(rows: &str) -> Html {
        Html::parse_document(&format!(
            "<html><body><table id=\"threadlog\">{}</table></body></html>",
            rows
        ))
    }

    #[test]
    fn test_active_and_closed_rows() {
        let doc = threadlog(
            r#"
            <tr class="active">
              <td><a href="showthread.php?tid=412">A Quiet Evening</a></td>
              <td>Ada, Silas</td>
              <td>Last post by <a href="member.php?action=profile&amp;uid=7">Silas</a> on Yesterday, 10:00 AM</td>
            </tr>
            <tr class="closed">
              <td><a href="showthread.php?tid=98">Old Business</a></td>
              <td>Ada</td>
              <td>No replies</td>
            </tr>
            "#,
        );

        let threads = extract_threads(&doc, CHARACTER_ID, fixed_now());
        assert_eq!(threads.len(), 2);

        let first = &threads[0];
        assert_eq!(first.id, "412");
        assert_eq!(first.title, "A Quiet Evening");
        assert_eq!(first.url, "showthread.php?tid=412");
        assert_eq!(first.participants, "Ada, Silas");
        assert_eq!(first.last_poster, "Silas");
        assert_eq!(first.last_poster_uid, Some(7));
        assert!(first.is_active);
        assert!(first.needs_reply);
        assert_eq!(
            first.last_post_date.date_naive(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );

        let second = &threads[1];
        assert_eq!(second.id, "98");
        assert!(!second.is_active);
        assert!(!second.needs_reply);
        assert_eq!(second.last_poster, UNKNOWN_POSTER);
        assert_eq!(second.last_poster_uid, None);
        assert_eq!(second.last_post_date, fixed_now());
    }

    #[test]
    fn test_own_post_does_not_need_reply() {
        let doc = threadlog(
            r#"<tr class="active">
                 <td><a href="showthread.php?tid=5">Mine</a></td>
                 <td>Ada</td>
                 <td><a href="member.php?action=profile&amp;uid=42">Ada</a> on 01-15-2025, 10:30 AM</td>
               </tr>"#,
        );

        let threads = extract_threads(&doc, CHARACTER_ID, fixed_now());
        assert_eq!(threads[0].last_poster_uid, Some(42));
        assert!(!threads[0].needs_reply);
        assert_eq!(
            threads[0].last_post_date,
            Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let doc = threadlog(r#"<tr class="active"><td>nothing linked here</td></tr>"#);

        let threads = extract_threads(&doc, CHARACTER_ID, fixed_now());
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].id, "thread-0");
        assert_eq!(threads[0].title, UNKNOWN_THREAD);
        assert_eq!(threads[0].url, "");
        assert_eq!(threads[0].participants, "");
    }

    #[test]
    fn test_falls_back_to_any_thread_view_link() {
        let doc = threadlog(
            r#"<tr class="active">
                 <td><span>no link</span></td>
                 <td>Ada</td>
                 <td><a href="showthread.php?tid=77&amp;action=lastpost">Jump</a></td>
               </tr>"#,
        );

        let threads = extract_threads(&doc, CHARACTER_ID, fixed_now());
        assert_eq!(threads[0].title, "Jump");
        assert_eq!(threads[0].id, "77");
    }

    #[test]
    fn test_row_without_cells_is_skipped_and_keeps_position() {
        let doc = threadlog(
            r#"<tr class="active"></tr>
               <tr class="closed"><td>Untitled</td><td>Ada</td></tr>"#,
        );

        let threads = extract_threads(&doc, CHARACTER_ID, fixed_now());
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].id, "thread-1");
    }

    #[test]
    fn test_rows_outside_thread_log_are_ignored() {
        let doc = Html::parse_document(
            r#"<table><tr class="active"><td>Elsewhere</td></tr></table>"#,
        );
        assert!(extract_threads(&doc, CHARACTER_ID, fixed_now()).is_empty());
    }

    #[test]
    fn test_needs_reply_rule() {
        assert!(needs_reply(Some(7), 42));
        assert!(!needs_reply(Some(42), 42));
        assert!(!needs_reply(None, 42));
    }

    #[test]
    fn test_uid_and_tid_patterns() {
        assert_eq!(uid_from_link("member.php?action=profile&uid=1234"), Some(1234));
        assert_eq!(uid_from_link("member.php?action=profile"), None);
        assert_eq!(uid_from_link("member.php?uid=99999999999999999999999"), None);
        assert_eq!(tid_from_url("showthread.php?tid=55&pid=9"), Some("55".to_string()));
        assert_eq!(tid_from_url("forumdisplay.php?fid=3"), None);
    }

    #[test]
    fn test_date_clause_fallback_order() {
        assert_eq!(
            date_clause("Last post by Silas on Yesterday, 10:00 AM"),
            Some("Yesterday, 10:00 AM")
        );
        assert_eq!(date_clause("Silas 01-15-2025, 10:30 AM"), Some("01-15-2025, 10:30 AM"));
        assert_eq!(date_clause("No replies"), None);
    }
}
