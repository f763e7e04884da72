//! Records produced by the extraction engine
//!
//! These are plain owned snapshots. Every extraction call builds them from
//! scratch, so nothing here is ever merged with an earlier result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when a thread row has no usable link text
pub const UNKNOWN_THREAD: &str = "Unknown Thread";

/// Poster name used when the last-post cell has no member link
pub const UNKNOWN_POSTER: &str = "Unknown";

/// Content placeholder when the page has no thread-log region
pub const THREAD_LOG_NOT_FOUND: &str = "Thread log not found";

/// One discussion thread a character appears in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// `tid` from the thread URL, or `thread-<index>` scoped to one call
    pub id: String,
    pub title: String,
    pub url: String,
    pub participants: String,
    pub last_poster: String,
    pub last_poster_uid: Option<u64>,
    pub last_post_date: DateTime<Utc>,
    pub is_active: bool,
    pub needs_reply: bool,
}

/// Biographical snapshot read from a character's profile page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterStats {
    pub age: Option<i32>,
    pub blood: String,
    pub ship: String,
    pub birthday: Option<String>,
    pub calculated_age: Option<i32>,
    pub age_needs_update: bool,
}

impl CharacterStats {
    /// Set the birthday-derived fields and recompute the mismatch flag
    pub fn reconcile(&mut self, birthday: String, calculated_age: Option<i32>) {
        self.birthday = Some(birthday);
        self.calculated_age = calculated_age;
        self.age_needs_update = match (self.age, self.calculated_age) {
            (Some(stated), Some(calculated)) => stated != calculated,
            _ => false,
        };
    }
}

/// Combined output of one extraction call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// Page the content was fetched from, when the engine did the fetching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Outer HTML of the thread-log region
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    pub threads: Vec<Thread>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<CharacterStats>,
}
