//! Configuration loading and management

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Placeholder replaced by the character's uid in profile URLs
pub const UID_PLACEHOLDER: &str = "{uid}";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub forum: ForumConfig,
    pub staleness: StalenessConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub rate_limit_per_second: u32,
    /// Characters fetched at the same time by the tracker
    pub max_concurrent: usize,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            rate_limit_per_second: 2,
            max_concurrent: 4,
            user_agent: "CharacterKeeper/0.1 (thread tracker)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForumConfig {
    /// Profile page URL with `{uid}` in place of the character id
    pub profile_url_template: String,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            profile_url_template: "https://charmingrp.com/member.php?action=profile&uid={uid}"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StalenessConfig {
    pub old_after_days: i64,
    pub very_old_after_days: i64,
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self {
            old_after_days: 14,
            very_old_after_days: 30,
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Load from `path` if it exists, otherwise use defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if !config.forum.profile_url_template.contains(UID_PLACEHOLDER) {
            anyhow::bail!("forum.profile_url_template must contain {}", UID_PLACEHOLDER);
        }
        if config.http.rate_limit_per_second == 0 {
            anyhow::bail!("http.rate_limit_per_second must be at least 1");
        }
        Ok(config)
    }
}
