// src/config.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Inclusive range of milliseconds a pacing pause is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn secs(min: u64, max: u64) -> Self {
        Self {
            min_ms: min * 1000,
            max_ms: max * 1000,
        }
    }

    pub const fn zero() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub navigation: DelayRange,
    pub click: DelayRange,
    pub between_pages: DelayRange,
    pub empty_page: DelayRange,
    pub scroll_preload: DelayRange,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            navigation: DelayRange::secs(2, 4),
            click: DelayRange::secs(3, 7),
            between_pages: DelayRange::secs(2, 6),
            empty_page: DelayRange::secs(2, 4),
            scroll_preload: DelayRange::secs(3, 6),
        }
    }
}

impl PacingConfig {
    pub fn disabled() -> Self {
        Self {
            navigation: DelayRange::zero(),
            click: DelayRange::zero(),
            between_pages: DelayRange::zero(),
            empty_page: DelayRange::zero(),
            scroll_preload: DelayRange::zero(),
        }
    }
}

/// Knobs shared by every site crawl in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    pub wait_timeout_secs: u64,
    pub empty_page_limit: u32,
    pub headless: bool,
    pub user_agent: String,
    pub pacing: PacingConfig,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            wait_timeout_secs: 60,
            empty_page_limit: 2,
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pacing: PacingConfig::default(),
        }
    }
}

impl CrawlSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_empty_page_limit(mut self, limit: u32) -> Self {
        self.empty_page_limit = limit.max(1);
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// Reject settings the crawler cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.empty_page_limit < 1 {
            anyhow::bail!("crawl.empty_page_limit must be at least 1");
        }
        if self.wait_timeout_secs < 1 {
            anyhow::bail!("crawl.wait_timeout_secs must be at least 1");
        }
        Ok(())
    }
}
