// src/scraping/crawler.rs
//! Site crawl driver.
//!
//! One site is crawled as a small state machine:
//!
//! ```text
//! Idle ──step + listing wait──▶ PageLoaded ──extract──▶ Extracting
//!   ▲                                                       │ dedupe
//!   └──────────── cursor advanced ◀── Advancing ◀───────────┘
//!                                        │
//!                                        ▼
//!                                     Stopped
//! ```
//!
//! Every fault ends in `Stopped` with a [`StopReason`]; nothing escapes to the
//! caller, so one broken site never aborts the run.

use chrono::Utc;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::browser::{Browser, BrowserError};
use crate::config::CrawlSettings;
use crate::scraping::extractor::Extractor;
use crate::scraping::pacing::{Pacer, Pause};
use crate::scraping::pagination::{PageCursor, Step};
use crate::types::job::{JobListing, JobRecord, SeenIdentitySet};
use crate::types::report::{SiteReport, StopReason};
use crate::types::site::SiteConfig;

/// Result of crawling one site: its accepted batch and the grown seen-set
#[derive(Debug)]
pub struct SiteCrawl {
    pub accepted: Vec<JobRecord>,
    pub seen: SeenIdentitySet,
    pub report: SiteReport,
}

enum CrawlState {
    Idle,
    PageLoaded { markup: String },
    Extracting { listings: Vec<JobListing> },
    Advancing { listing_count: usize },
    Stopped(StopReason),
}

pub struct SiteCrawler<'b> {
    browser: &'b mut dyn Browser,
    settings: &'b CrawlSettings,
    pacer: Pacer,
}

impl<'b> SiteCrawler<'b> {
    pub fn new(browser: &'b mut dyn Browser, settings: &'b CrawlSettings) -> Self {
        Self {
            browser,
            settings,
            pacer: Pacer::new(settings.pacing.clone()),
        }
    }

    pub async fn crawl(&mut self, site: &SiteConfig, seen: SeenIdentitySet) -> SiteCrawl {
        let span = info_span!("site", company = %site.company_name);
        self.crawl_inner(site, seen).instrument(span).await
    }

    async fn crawl_inner(&mut self, site: &SiteConfig, mut seen: SeenIdentitySet) -> SiteCrawl {
        info!("Scraping {} ({} pagination)", site.base_url, site.pagination.kind());

        let mut accepted = Vec::new();
        let mut pages_visited = 0u32;
        let mut listings_seen = 0usize;
        let mut empty_streak = 0u32;

        let extractor = match Extractor::new(site) {
            Ok(extractor) => extractor,
            Err(e) => {
                warn!("{}", e);
                return Self::finish(site, accepted, seen, pages_visited, listings_seen, StopReason::Fault(e.to_string()));
            }
        };

        let mut cursor = PageCursor::new(site);
        let mut state = CrawlState::Idle;

        let stop = loop {
            state = match state {
                CrawlState::Idle => self.load_page(site, &cursor).await,

                CrawlState::PageLoaded { markup } => {
                    pages_visited += 1;
                    CrawlState::Extracting {
                        listings: extractor.extract(&markup),
                    }
                }

                CrawlState::Extracting { listings } => {
                    let listing_count = listings.len();
                    listings_seen += listing_count;
                    let before = accepted.len();

                    for listing in listings {
                        if seen.insert(listing.identity()) {
                            accepted.push(listing.into_record(Utc::now()));
                        }
                    }

                    info!(
                        "Iteration {}: {} listings, {} new",
                        cursor.iteration(),
                        listing_count,
                        accepted.len() - before
                    );
                    CrawlState::Advancing { listing_count }
                }

                CrawlState::Advancing { listing_count } => {
                    let pause = if listing_count == 0 {
                        empty_streak += 1;
                        warn!(
                            "No listings matched '{}' (iteration {}, {} in a row)",
                            site.listing_selector,
                            cursor.iteration(),
                            empty_streak
                        );
                        Pause::EmptyPage
                    } else {
                        empty_streak = 0;
                        Pause::BetweenPages
                    };

                    if empty_streak >= self.settings.empty_page_limit {
                        CrawlState::Stopped(StopReason::EmptyPages(empty_streak))
                    } else if !cursor.advance() {
                        CrawlState::Stopped(StopReason::Exhausted)
                    } else {
                        self.pacer.pause(self.browser, pause).await;
                        CrawlState::Idle
                    }
                }

                CrawlState::Stopped(reason) => break reason,
            };
        };

        Self::finish(site, accepted, seen, pages_visited, listings_seen, stop)
    }

    fn finish(
        site: &SiteConfig,
        accepted: Vec<JobRecord>,
        seen: SeenIdentitySet,
        pages_visited: u32,
        listings_seen: usize,
        stop: StopReason,
    ) -> SiteCrawl {
        if stop.is_failure() {
            warn!("Stopped {}: {}", site.company_name, stop);
        } else {
            info!("Finished {}: {}", site.company_name, stop);
        }

        let report = SiteReport {
            company: site.company_name.clone(),
            pages_visited,
            listings_seen,
            accepted: accepted.len(),
            stop,
        };

        SiteCrawl {
            accepted,
            seen,
            report,
        }
    }

    /// Idle → PageLoaded, or Stopped when the step or the listing wait fails
    async fn load_page(&mut self, site: &SiteConfig, cursor: &PageCursor<'_>) -> CrawlState {
        let Some(step) = cursor.step() else {
            return CrawlState::Stopped(StopReason::Exhausted);
        };

        if let Err(stop) = self.perform(step).await {
            return CrawlState::Stopped(stop);
        }

        match self.read_listings(site).await {
            Ok(markup) => CrawlState::PageLoaded { markup },
            Err(e) if e.is_absent() => {
                warn!("{}", e);
                CrawlState::Stopped(StopReason::ListingTimeout(site.base_url.clone()))
            }
            Err(e) => CrawlState::Stopped(StopReason::Fault(e.to_string())),
        }
    }

    async fn perform(&mut self, step: Step) -> Result<(), StopReason> {
        let timeout = self.settings.wait_timeout();

        match step {
            Step::Navigate { url, preload } => {
                debug!("Navigating to {}", url);
                self.browser
                    .navigate(&url)
                    .await
                    .map_err(|e| StopReason::Fault(e.to_string()))?;
                let pause = if preload { Pause::ScrollPreload } else { Pause::Navigation };
                self.pacer.pause(self.browser, pause).await;
            }

            Step::Activate { selector } => {
                debug!("Activating '{}'", selector);
                match self.browser.activate(&selector, timeout).await {
                    Ok(()) => self.pacer.pause(self.browser, Pause::Click).await,
                    Err(e) if e.is_absent() => {
                        info!("Next control unavailable, assuming last page: {}", e);
                        return Err(StopReason::ControlExhausted);
                    }
                    Err(e) => return Err(StopReason::Fault(e.to_string())),
                }
            }

            Step::Scroll { delay } => {
                let fault = |e: BrowserError| StopReason::Fault(e.to_string());
                let before = self.browser.scroll_height().await.map_err(fault)?;
                self.browser.scroll_to_bottom().await.map_err(fault)?;
                self.browser.sleep(delay).await;
                let after = self.browser.scroll_height().await.map_err(fault)?;
                if after <= before {
                    info!("Scrolling loaded no new content (height {})", after);
                    return Err(StopReason::ScrollExhausted);
                }
                debug!("Page height grew {} -> {}", before, after);
            }
        }

        Ok(())
    }

    async fn read_listings(&mut self, site: &SiteConfig) -> Result<String, BrowserError> {
        let timeout = self.settings.wait_timeout();
        match &site.frame_selector {
            Some(frame) => self.browser.frame_markup(frame, timeout).await,
            None => {
                self.browser
                    .wait_for_selector(&site.listing_selector, timeout)
                    .await?;
                self.browser.current_markup().await
            }
        }
    }
}

/// Crawl one site with the given session, returning the updated seen-set
pub async fn crawl_site(
    browser: &mut dyn Browser,
    site: &SiteConfig,
    settings: &CrawlSettings,
    seen: SeenIdentitySet,
) -> SiteCrawl {
    SiteCrawler::new(browser, settings).crawl(site, seen).await
}
