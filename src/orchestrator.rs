// src/orchestrator.rs
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::browser::{BrowserError, Launcher};
use crate::config::CrawlSettings;
use crate::scraping::crawl_site;
use crate::types::job::SeenIdentitySet;
use crate::types::report::RunReport;
use crate::types::site::SiteConfig;

/// Crawls every configured site, in order, through one browser session
pub struct Orchestrator<'a> {
    sites: &'a [SiteConfig],
    settings: &'a CrawlSettings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(sites: &'a [SiteConfig], settings: &'a CrawlSettings) -> Self {
        Self { sites, settings }
    }

    /// Fails only when the session cannot be acquired; site faults end up in the report
    pub async fn run(
        &self,
        launcher: &dyn Launcher,
        seen: SeenIdentitySet,
    ) -> Result<RunReport, BrowserError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let mut browser = launcher.launch().await.map_err(|e| {
            error!("Cannot start browser session: {}", e);
            e
        })?;
        info!("Run {} started with {} sites", run_id, self.sites.len());

        let mut seen = seen;
        let mut new_records = Vec::new();
        let mut sites = Vec::with_capacity(self.sites.len());

        for site in self.sites {
            let crawl = crawl_site(browser.as_mut(), site, self.settings, seen).await;
            seen = crawl.seen;
            new_records.extend(crawl.accepted);
            sites.push(crawl.report);
        }

        if let Err(e) = browser.close().await {
            warn!("Browser session did not close cleanly: {}", e);
        }

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            sites,
            new_records,
            seen,
        };

        info!(
            "Run {} finished: {} new records, {} sites skipped",
            run_id,
            report.new_records.len(),
            report.failed_sites().count()
        );

        Ok(report)
    }
}
