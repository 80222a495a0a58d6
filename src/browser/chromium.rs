// src/browser/chromium.rs
//! Headless Chrome over CDP (chromiumoxide)

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Browser, BrowserError, Launcher};
use crate::config::CrawlSettings;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const HANDLER_SHUTDOWN: Duration = Duration::from_secs(5);

pub struct ChromiumLauncher {
    headless: bool,
    user_agent: String,
    wait_timeout: Duration,
}

impl ChromiumLauncher {
    pub fn new(settings: &CrawlSettings) -> Self {
        Self {
            headless: settings.headless,
            user_agent: settings.user_agent.clone(),
            wait_timeout: settings.wait_timeout(),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", self.user_agent));
        if !self.headless {
            builder = builder.with_head();
        }
        builder.build().map_err(BrowserError::Launch)
    }
}

#[async_trait]
impl Launcher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn Browser>, BrowserError> {
        let config = self.browser_config()?;
        let (mut browser, mut handler) = CdpBrowser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error: {}", e);
                }
            }
        });

        let opened = browser.new_page("about:blank").await;
        let page = match opened {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = shutdown(&mut browser, Some(handler)).await {
                    warn!("Failed to close Chrome after a launch error: {}", close_err);
                }
                return Err(BrowserError::Launch(e.to_string()));
            }
        };

        info!("Chrome session started (headless: {})", self.headless);
        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler: Some(handler),
            navigation_timeout: self.wait_timeout,
        }))
    }
}

pub struct ChromiumSession {
    browser: CdpBrowser,
    page: Page,
    handler: Option<JoinHandle<()>>,
    navigation_timeout: Duration,
}

async fn eval<T: serde::de::DeserializeOwned>(page: &Page, script: String) -> Result<T, BrowserError> {
    page.evaluate(script)
        .await
        .map_err(|e| BrowserError::Script(e.to_string()))?
        .into_value::<T>()
        .map_err(|e| BrowserError::Script(e.to_string()))
}

#[async_trait]
impl Browser for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let navigation_error = |reason: String| BrowserError::Navigation {
            url: url.to_string(),
            reason,
        };

        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(navigation_error(e.to_string())),
            Err(_) => Err(navigation_error(format!(
                "no response after {}s",
                self.navigation_timeout.as_secs()
            ))),
        }
    }

    async fn current_markup(&mut self) -> Result<String, BrowserError> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Driver(e.to_string()))
    }

    async fn frame_markup(
        &mut self,
        frame_selector: &str,
        timeout: Duration,
    ) -> Result<String, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            let markup: String = eval(&self.page, frame_markup_script(frame_selector)).await?;
            if !markup.is_empty() {
                return Ok(markup);
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::timeout(frame_selector, timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::timeout(selector, timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn activate(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.wait_for_selector(selector, timeout).await?;
        let clicked: bool = eval(&self.page, click_script(selector)).await?;
        if clicked {
            Ok(())
        } else {
            Err(BrowserError::NotFound(selector.to_string()))
        }
    }

    async fn scroll_height(&mut self) -> Result<u64, BrowserError> {
        let height: f64 = eval(
            &self.page,
            "document.body ? document.body.scrollHeight : 0".to_string(),
        )
        .await?;
        Ok(height.max(0.0) as u64)
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        let _: bool = eval(
            &self.page,
            "window.scrollTo(0, document.body.scrollHeight); true".to_string(),
        )
        .await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let closed = shutdown(&mut self.browser, self.handler.take()).await;
        info!("Chrome session closed");
        closed
    }
}

/// Close Chrome, reap the process, then stop the CDP handler task
async fn shutdown(browser: &mut CdpBrowser, handler: Option<JoinHandle<()>>) -> Result<(), BrowserError> {
    let closed = browser
        .close()
        .await
        .map(|_| ())
        .map_err(|e| BrowserError::Driver(e.to_string()));
    if let Err(e) = browser.wait().await {
        warn!("Chrome process did not exit cleanly: {}", e);
    }

    if let Some(handler) = handler {
        stop_handler(handler, HANDLER_SHUTDOWN).await;
    }
    closed
}

/// Give the handler `grace` to drain, then abort it. Returns true when it had to be aborted.
async fn stop_handler(mut handler: JoinHandle<()>, grace: Duration) -> bool {
    if tokio::time::timeout(grace, &mut handler).await.is_ok() {
        return false;
    }
    handler.abort();
    debug!("CDP handler aborted after {}ms", grace.as_millis());
    true
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Clicks the first match unless it is disabled; yields whether a click happened
fn click_script(selector: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.querySelector({sel});
    if (!el || el.disabled || el.getAttribute('aria-disabled') === 'true') return false;
    el.scrollIntoView({{block: 'center'}});
    el.click();
    return true;
}})()"#,
        sel = js_string(selector)
    )
}

/// Inner document markup, or an empty string while the frame has not rendered a body
fn frame_markup_script(frame_selector: &str) -> String {
    format!(
        r#"(() => {{
    const frame = document.querySelector({sel});
    const doc = frame && frame.contentDocument;
    if (!doc || !doc.body || doc.body.children.length === 0) return '';
    return doc.documentElement.outerHTML;
}})()"#,
        sel = js_string(frame_selector)
    )
}
