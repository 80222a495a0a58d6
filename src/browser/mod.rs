// src/browser/mod.rs
//! Browser capability used by the crawler.
//!
//! The crawler only ever talks to [`Browser`]; a run acquires exactly one
//! session through a [`Launcher`] and closes it once at the end. Two
//! backends exist: a headless Chrome session driven over CDP and a plain
//! HTTP fetcher for sites whose listings are rendered server-side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::CrawlSettings;

pub mod chromium;
pub mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use chromium::ChromiumLauncher;
pub use http::HttpLauncher;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    #[error("failed to start browser session: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {secs}s waiting for '{selector}'")]
    Timeout { selector: String, secs: u64 },

    #[error("element '{0}' not found")]
    NotFound(String),

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("{0} is not supported by this browser backend")]
    Unsupported(&'static str),

    #[error("browser driver error: {0}")]
    Driver(String),
}

impl BrowserError {
    pub fn timeout(selector: &str, wait: Duration) -> Self {
        BrowserError::Timeout {
            selector: selector.to_string(),
            secs: wait.as_secs(),
        }
    }

    /// Element missing or never became ready, as opposed to a driver fault
    pub fn is_absent(&self) -> bool {
        matches!(self, BrowserError::Timeout { .. } | BrowserError::NotFound(_))
    }
}

#[async_trait]
pub trait Browser: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Markup of the top-level document as currently rendered
    async fn current_markup(&mut self) -> Result<String, BrowserError>;

    /// Markup of the document inside the iframe matched by `frame_selector`
    async fn frame_markup(
        &mut self,
        frame_selector: &str,
        timeout: Duration,
    ) -> Result<String, BrowserError>;

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    /// Locate the element, scroll it into view and click it
    async fn activate(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    async fn scroll_height(&mut self) -> Result<u64, BrowserError>;

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError>;

    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn close(&mut self) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Browser>, BrowserError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BrowserKind {
    #[default]
    Chromium,
    Http,
}

pub fn launcher_for(kind: BrowserKind, settings: &CrawlSettings) -> Box<dyn Launcher> {
    match kind {
        BrowserKind::Chromium => Box::new(ChromiumLauncher::new(settings)),
        BrowserKind::Http => Box::new(HttpLauncher::new(settings)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_classification() {
        assert!(BrowserError::NotFound("button.next".into()).is_absent());
        assert!(BrowserError::timeout("button.next", Duration::from_secs(60)).is_absent());
        assert!(!BrowserError::Driver("socket closed".into()).is_absent());
        assert!(!BrowserError::Unsupported("clicking").is_absent());
    }

    #[test]
    fn test_browser_kind_from_yaml() {
        let kind: BrowserKind = serde_yaml::from_str("http").unwrap();
        assert_eq!(kind, BrowserKind::Http);
    }
}
