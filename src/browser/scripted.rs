// src/browser/scripted.rs
//! In-memory browser serving canned pages, for crawler and orchestrator tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Browser, BrowserError, Launcher};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    Navigate(String),
    Activate(String),
    ScrollToBottom,
    Sleep(Duration),
    Close,
}

pub(crate) type ActionLog = Arc<Mutex<Vec<Action>>>;

#[derive(Default)]
pub(crate) struct ScriptedBrowser {
    pages: HashMap<String, String>,
    click_chains: HashMap<String, Vec<String>>,
    scroll_chains: HashMap<String, (u64, Vec<(u64, String)>)>,
    frames: HashMap<String, String>,
    failing_navigations: HashSet<String>,
    never_ready: HashSet<String>,
    current_url: Option<String>,
    current: Option<String>,
    clicks: usize,
    scrolls: usize,
    log: ActionLog,
}

impl ScriptedBrowser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, url: &str, markup: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), markup.into());
        self
    }

    /// Pages revealed by successive "next" clicks after navigating to `url`
    pub(crate) fn with_click_chain(mut self, url: &str, pages: Vec<String>) -> Self {
        self.click_chains.insert(url.to_string(), pages);
        self
    }

    /// Height before any scroll, then (height, markup) after each scroll
    pub(crate) fn with_scroll_chain(mut self, url: &str, initial_height: u64, frames: Vec<(u64, String)>) -> Self {
        self.scroll_chains.insert(url.to_string(), (initial_height, frames));
        self
    }

    pub(crate) fn with_frame(mut self, selector: &str, markup: impl Into<String>) -> Self {
        self.frames.insert(selector.to_string(), markup.into());
        self
    }

    pub(crate) fn failing_navigation(mut self, url: &str) -> Self {
        self.failing_navigations.insert(url.to_string());
        self
    }

    /// Listing wait times out on this url
    pub(crate) fn never_ready(mut self, url: &str) -> Self {
        self.never_ready.insert(url.to_string());
        self
    }

    pub(crate) fn log(&self) -> ActionLog {
        Arc::clone(&self.log)
    }

    fn record(&self, action: Action) {
        self.log.lock().unwrap().push(action);
    }

    fn current_url(&self) -> Result<&str, BrowserError> {
        self.current_url
            .as_deref()
            .ok_or_else(|| BrowserError::Driver("no page loaded".into()))
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.record(Action::Navigate(url.to_string()));
        if self.failing_navigations.contains(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".into(),
            });
        }
        let markup = self.pages.get(url).cloned().ok_or_else(|| BrowserError::Navigation {
            url: url.to_string(),
            reason: "no scripted page".into(),
        })?;
        self.current_url = Some(url.to_string());
        self.current = Some(markup);
        self.clicks = 0;
        self.scrolls = 0;
        Ok(())
    }

    async fn current_markup(&mut self) -> Result<String, BrowserError> {
        self.current
            .clone()
            .ok_or_else(|| BrowserError::Driver("no page loaded".into()))
    }

    async fn frame_markup(&mut self, frame_selector: &str, timeout: Duration) -> Result<String, BrowserError> {
        self.frames
            .get(frame_selector)
            .cloned()
            .ok_or_else(|| BrowserError::timeout(frame_selector, timeout))
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let url = self.current_url()?;
        if self.never_ready.contains(url) {
            return Err(BrowserError::timeout(selector, timeout));
        }
        Ok(())
    }

    async fn activate(&mut self, selector: &str, _timeout: Duration) -> Result<(), BrowserError> {
        self.record(Action::Activate(selector.to_string()));
        let url = self.current_url()?.to_string();
        let next = self
            .click_chains
            .get(&url)
            .and_then(|chain| chain.get(self.clicks))
            .cloned()
            .ok_or_else(|| BrowserError::NotFound(selector.to_string()))?;
        self.clicks += 1;
        self.current = Some(next);
        Ok(())
    }

    async fn scroll_height(&mut self) -> Result<u64, BrowserError> {
        let url = self.current_url()?;
        let (initial, frames) = self
            .scroll_chains
            .get(url)
            .ok_or(BrowserError::Unsupported("scrolling"))?;
        Ok(match self.scrolls {
            0 => *initial,
            n => frames.get(n - 1).map(|(height, _)| *height).unwrap_or(*initial),
        })
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        self.record(Action::ScrollToBottom);
        let url = self.current_url()?.to_string();
        if let Some((_, frames)) = self.scroll_chains.get(&url) {
            if let Some((_, markup)) = frames.get(self.scrolls) {
                self.current = Some(markup.clone());
                self.scrolls += 1;
            }
        }
        Ok(())
    }

    async fn sleep(&mut self, duration: Duration) {
        self.record(Action::Sleep(duration));
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.record(Action::Close);
        Ok(())
    }
}

/// Hands out one prepared browser, or fails like a missing Chrome binary
pub(crate) struct ScriptedLauncher {
    browser: Mutex<Option<ScriptedBrowser>>,
}

impl ScriptedLauncher {
    pub(crate) fn new(browser: ScriptedBrowser) -> Self {
        Self {
            browser: Mutex::new(Some(browser)),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            browser: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Launcher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn Browser>, BrowserError> {
        match self.browser.lock().unwrap().take() {
            Some(browser) => Ok(Box::new(browser)),
            None => Err(BrowserError::Launch("chrome executable not found".into())),
        }
    }
}

/// Minimal results page: one `li.job` per (title, href, location)
pub(crate) fn listing_page(jobs: &[(&str, &str, Option<&str>)]) -> String {
    let items: String = jobs
        .iter()
        .map(|(title, href, location)| {
            let location = location
                .map(|loc| format!(r#"<span class="loc">{}</span>"#, loc))
                .unwrap_or_default();
            format!(
                r#"<li class="job"><a class="title" href="{}">{}</a>{}</li>"#,
                href, title, location
            )
        })
        .collect();
    format!("<html><body><ul class=\"results\">{}</ul></body></html>", items)
}
