// src/pipeline.rs
//! One harvest run: load history, crawl, merge, persist

use anyhow::{Context, Result};
use tracing::{error, info};
use uuid::Uuid;

use crate::browser::{BrowserError, Launcher};
use crate::config::CrawlSettings;
use crate::history::{merge, HistoryStore};
use crate::orchestrator::Orchestrator;
use crate::types::job::JobRecord;
use crate::types::report::SiteReport;
use crate::types::site::SiteConfig;

#[derive(Debug, Clone, Copy, Default)]
pub struct HarvestOptions {
    /// Crawl and merge but leave the store untouched
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct HarvestSummary {
    pub run_id: Option<Uuid>,
    pub prior_count: usize,
    pub new_records: Vec<JobRecord>,
    pub final_count: usize,
    pub persisted: bool,
    pub session_error: Option<BrowserError>,
    pub sites: Vec<SiteReport>,
}

impl HarvestSummary {
    pub fn new_count(&self) -> usize {
        self.new_records.len()
    }

    pub fn failed_sites(&self) -> impl Iterator<Item = &SiteReport> {
        self.sites.iter().filter(|site| site.stop.is_failure())
    }
}

pub async fn harvest(
    store: &dyn HistoryStore,
    launcher: &dyn Launcher,
    sites: &[SiteConfig],
    settings: &CrawlSettings,
    options: HarvestOptions,
) -> Result<HarvestSummary> {
    let prior = store
        .load()
        .await
        .with_context(|| format!("Failed to load {}", store.describe()))?;
    let prior_count = prior.len();
    info!("History holds {} records", prior_count);

    let seen = prior.identities();

    let (run_id, new_records, sites, session_error) =
        match Orchestrator::new(sites, settings).run(launcher, seen).await {
            Ok(report) => (Some(report.run_id), report.new_records, report.sites, None),
            Err(e) => {
                error!("No sites were crawled: {}", e);
                (None, Vec::new(), Vec::new(), Some(e))
            }
        };

    let merged = merge(prior, &new_records);
    let final_count = merged.len();

    let persisted = if options.dry_run {
        info!("Dry run: {} new records not persisted", new_records.len());
        false
    } else {
        store
            .persist(&merged)
            .await
            .with_context(|| format!("Failed to persist {}", store.describe()))?;
        true
    };

    info!(
        "Harvest complete: {} prior, {} new, {} total",
        prior_count,
        new_records.len(),
        final_count
    );

    Ok(HarvestSummary {
        run_id,
        prior_count,
        new_records,
        final_count,
        persisted,
        session_error,
        sites,
    })
}
