//! Extraction engine - profile HTML in, `ExtractionResult` out
//!
//! One call does at most two sequential fetches: the character page itself
//! (only via [`ExtractionEngine::extract_url`]) and the profile page, whose URL
//! is derived from the character id. Parsed documents never outlive the
//! synchronous step that reads them, so the returned futures stay `Send`.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::config::{ForumConfig, UID_PLACEHOLDER};
use crate::error::FetchError;
use crate::fetch::HtmlFetcher;
use crate::models::{CharacterStats, ExtractionResult, Thread, THREAD_LOG_NOT_FOUND};
use crate::profile::extract_stats;
use crate::threads::extract_threads;

static THREAD_LOG: Lazy<Selector> = Lazy::new(|| Selector::parse("#threadlog").unwrap());
static CHARACTER_UID: Lazy<Regex> = Lazy::new(|| Regex::new(r"uid=(\d+)").unwrap());

/// Character id from a profile URL's `uid` parameter, 0 when missing
pub fn character_id_from_url(url: &str) -> u64 {
    CHARACTER_UID
        .captures(url)
        .and_then(|cap| cap[1].parse::<u64>().ok())
        .unwrap_or(0)
}

pub struct ExtractionEngine<F> {
    fetcher: F,
    profile_url_template: String,
}

impl<F: HtmlFetcher> ExtractionEngine<F> {
    pub fn new(fetcher: F, forum: &ForumConfig) -> Self {
        Self {
            fetcher,
            profile_url_template: forum.profile_url_template.clone(),
        }
    }

    /// Profile link for a character. Zero is not a valid id and yields `None`.
    pub fn profile_link(&self, character_id: u64) -> Option<String> {
        if character_id == 0 {
            return None;
        }
        Some(
            self.profile_url_template
                .replace(UID_PLACEHOLDER, &character_id.to_string()),
        )
    }

    /// Fetch a character page and extract it.
    ///
    /// Failing to fetch this page is the only hard error: there is nothing to
    /// parse without it.
    pub async fn extract_url(&self, url: &str) -> Result<ExtractionResult, FetchError> {
        let character_id = character_id_from_url(url);
        info!("Extracting character {} from {}", character_id, url);

        let html = self.fetcher.fetch(url).await?;
        let mut result = self.extract(&html, character_id).await;
        result.url = Some(url.to_string());
        Ok(result)
    }

    pub async fn extract(&self, profile_html: &str, character_id: u64) -> ExtractionResult {
        self.extract_at(profile_html, character_id, Utc::now()).await
    }

    /// Same as [`extract`](Self::extract) with an explicit clock
    pub async fn extract_at(
        &self,
        profile_html: &str,
        character_id: u64,
        now: DateTime<Utc>,
    ) -> ExtractionResult {
        let (content, threads) = read_thread_log(profile_html, character_id, now);

        let profile_url = self.profile_link(character_id);
        let stats = match &profile_url {
            Some(link) => self.fetch_stats(link, now).await,
            None => None,
        };

        ExtractionResult {
            url: None,
            content,
            profile_url,
            threads,
            stats,
        }
    }

    /// Stats from the profile page; fetch failures leave stats absent
    async fn fetch_stats(&self, profile_url: &str, now: DateTime<Utc>) -> Option<CharacterStats> {
        debug!("Fetching profile stats from {}", profile_url);
        match self.fetcher.fetch(profile_url).await {
            Ok(html) => {
                let doc = Html::parse_document(&html);
                let stats = extract_stats(&doc, now.date_naive());
                debug!("Parsed stats: {:?}", stats);
                Some(stats)
            }
            Err(e) => {
                warn!("Failed to fetch profile stats from {}: {}", profile_url, e);
                None
            }
        }
    }
}

/// Thread-log markup and the parsed thread list
fn read_thread_log(profile_html: &str, character_id: u64, now: DateTime<Utc>) -> (String, Vec<Thread>) {
    let doc = Html::parse_document(profile_html);

    let content = match doc.select(&THREAD_LOG).next() {
        Some(log) => log.html(),
        None => {
            warn!("Thread log not found for character {}", character_id);
            THREAD_LOG_NOT_FOUND.to_string()
        }
    };

    // Runs even without a thread log; it simply finds no rows
    let threads = extract_threads(&doc, character_id, now);
    (content, threads)
}
