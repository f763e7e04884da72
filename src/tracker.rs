//! Multi-character tracking and the reply to-do list
//!
//! Each character is extracted independently. `track_all` keeps a bounded
//! number of extractions in flight and returns one report per character in
//! input order, so one unreachable profile never hides the others.

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use std::fmt;
use tracing::{info, warn};

use crate::config::StalenessConfig;
use crate::engine::ExtractionEngine;
use crate::error::FetchError;
use crate::fetch::HtmlFetcher;
use crate::models::{ExtractionResult, Thread};

/// A character the user follows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedCharacter {
    pub id: u64,
    pub name: String,
    pub url: String,
}

#[derive(Debug)]
pub struct CharacterReport {
    pub character: TrackedCharacter,
    pub outcome: Result<ExtractionResult, FetchError>,
}

/// Extract every character with at most `max_concurrent` in flight
pub async fn track_all<F: HtmlFetcher>(
    engine: &ExtractionEngine<F>,
    characters: Vec<TrackedCharacter>,
    max_concurrent: usize,
) -> Vec<CharacterReport> {
    info!("Tracking {} characters", characters.len());

    let reports: Vec<CharacterReport> = stream::iter(characters)
        .map(|character| async move {
            let outcome = engine.extract_url(&character.url).await;
            if let Err(ref e) = outcome {
                warn!("Failed to load character {} ({}): {}", character.id, character.name, e);
            }
            CharacterReport { character, outcome }
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    let failed = reports.iter().filter(|r| r.outcome.is_err()).count();
    info!("Tracking complete: {} loaded, {} failed", reports.len() - failed, failed);

    reports
}

/// Whole days between a post and now, rounded up
pub fn days_since(date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    let millis = (now - date).num_milliseconds().abs();
    (millis + DAY_MS - 1) / DAY_MS
}

/// How urgently a thread wants attention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Closed,
    UpToDate,
    NeedsReply,
    Old,
    VeryOld,
}

impl Urgency {
    /// Closed supersedes everything; age only matters for threads owed a reply
    pub fn classify(thread: &Thread, now: DateTime<Utc>, thresholds: &StalenessConfig) -> Self {
        if !thread.is_active {
            return Urgency::Closed;
        }
        if !thread.needs_reply {
            return Urgency::UpToDate;
        }

        let days = days_since(thread.last_post_date, now);
        if days > thresholds.very_old_after_days {
            Urgency::VeryOld
        } else if days > thresholds.old_after_days {
            Urgency::Old
        } else {
            Urgency::NeedsReply
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Urgency::Closed => "closed",
            Urgency::UpToDate => "up to date",
            Urgency::NeedsReply => "needs reply",
            Urgency::Old => "old",
            Urgency::VeryOld => "very old",
        };
        f.write_str(label)
    }
}

/// A thread owed a reply, tagged with whose it is
#[derive(Debug, Clone)]
pub struct TodoItem<'a> {
    pub character_name: &'a str,
    pub character_id: u64,
    pub thread: &'a Thread,
}

/// Open threads needing a reply across all loaded characters, oldest first
pub fn todo_list(reports: &[CharacterReport]) -> Vec<TodoItem<'_>> {
    let mut items: Vec<TodoItem<'_>> = reports
        .iter()
        .filter_map(|report| {
            report
                .outcome
                .as_ref()
                .ok()
                .map(|result| (&report.character, result))
        })
        .flat_map(|(character, result)| {
            result
                .threads
                .iter()
                .filter(|thread| thread.needs_reply && thread.is_active)
                .map(move |thread| TodoItem {
                    character_name: &character.name,
                    character_id: character.id,
                    thread,
                })
        })
        .collect();

    items.sort_by_key(|item| item.thread.last_post_date);
    items
}

/// Short relative description of a post date
pub fn relative_label(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match days_since(date, now) {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        days if days < 7 => format!("{} days ago", days),
        _ => date.format("%-m/%-d/%Y").to_string(),
    }
}
