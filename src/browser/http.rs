// src/browser/http.rs
//! Plain HTTP backend for server-rendered listing pages

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

use super::{Browser, BrowserError, Launcher};
use crate::config::CrawlSettings;

pub struct HttpLauncher {
    user_agent: String,
    timeout: Duration,
}

impl HttpLauncher {
    pub fn new(settings: &CrawlSettings) -> Self {
        Self {
            user_agent: settings.user_agent.clone(),
            timeout: settings.wait_timeout(),
        }
    }
}

#[async_trait]
impl Launcher for HttpLauncher {
    async fn launch(&self) -> Result<Box<dyn Browser>, BrowserError> {
        let client = Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout)
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        info!("HTTP session started");
        Ok(Box::new(HttpSession {
            client,
            current: None,
        }))
    }
}

/// Holds the body of the last fetched page; no script execution
pub struct HttpSession {
    client: Client,
    current: Option<String>,
}

impl HttpSession {
    fn body(&self) -> Result<&str, BrowserError> {
        self.current
            .as_deref()
            .ok_or_else(|| BrowserError::Driver("no page loaded".into()))
    }
}

#[async_trait]
impl Browser for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let navigation_error = |reason: String| BrowserError::Navigation {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(navigation_error(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;
        debug!("Fetched {} ({} bytes)", url, body.len());
        self.current = Some(body);
        Ok(())
    }

    async fn current_markup(&mut self) -> Result<String, BrowserError> {
        self.body().map(str::to_string)
    }

    async fn frame_markup(&mut self, _frame_selector: &str, _timeout: Duration) -> Result<String, BrowserError> {
        Err(BrowserError::Unsupported("reading iframes"))
    }

    /// The document never changes after the fetch, so this checks once
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let parsed = Selector::parse(selector)
            .map_err(|e| BrowserError::Driver(format!("invalid selector '{}': {}", selector, e)))?;
        let document = Html::parse_document(self.body()?);
        if document.select(&parsed).next().is_some() {
            Ok(())
        } else {
            Err(BrowserError::timeout(selector, timeout))
        }
    }

    async fn activate(&mut self, _selector: &str, _timeout: Duration) -> Result<(), BrowserError> {
        Err(BrowserError::Unsupported("clicking"))
    }

    async fn scroll_height(&mut self) -> Result<u64, BrowserError> {
        Err(BrowserError::Unsupported("scrolling"))
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        Err(BrowserError::Unsupported("scrolling"))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.current = None;
        Ok(())
    }
}
