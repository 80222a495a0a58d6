// src/harvest_cli.rs
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::browser::{launcher_for, BrowserKind};
use crate::core::ConfigManager;
use crate::environment::DEFAULT_CONFIG_FILE;
use crate::history::open_store;
use crate::pipeline::{harvest, HarvestOptions, HarvestSummary};

#[derive(Parser)]
#[command(name = "job-harvester")]
#[command(about = "Collect job offers from configured career sites into one history")]
pub struct HarvestCli {
    #[command(subcommand)]
    pub command: HarvestCommand,

    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum HarvestCommand {
    /// Crawl every configured site and append new offers to the history
    Run {
        /// Only crawl these companies (repeatable)
        #[arg(long = "site")]
        sites: Vec<String>,
        /// Override the configured browser backend
        #[arg(long, value_enum)]
        browser: Option<BrowserKind>,
        /// Print new offers instead of persisting them
        #[arg(long)]
        dry_run: bool,
    },
    /// List configured sites
    Sites,
    /// Show what the history currently holds
    History,
}

pub async fn handle_command(cli: HarvestCli) -> Result<()> {
    let config = ConfigManager::load(&cli.config)?;

    match cli.command {
        HarvestCommand::Run {
            sites,
            browser,
            dry_run,
        } => {
            config.ensure_directories().await?;
            let selected = config.select_sites(&sites)?;
            let kind = browser.unwrap_or(config.environment.browser);
            let settings = &config.environment.crawl;

            let store = open_store(&config.environment.store).await?;
            let launcher = launcher_for(kind, settings);
            info!(
                "Harvesting {} sites with {:?} into {}",
                selected.len(),
                kind,
                store.describe()
            );

            let summary = harvest(
                store.as_ref(),
                launcher.as_ref(),
                &selected,
                settings,
                HarvestOptions { dry_run },
            )
            .await?;

            print_summary(&summary, dry_run);

            if let Some(e) = summary.session_error {
                anyhow::bail!("Browser session could not be started: {}", e);
            }
        }

        HarvestCommand::Sites => {
            println!("{:<4} {:<28} {:<8} {}", "#", "Company", "Paging", "Base URL");
            println!("{}", "-".repeat(90));
            for (index, site) in config.sites.iter().enumerate() {
                println!(
                    "{:<4} {:<28} {:<8} {}",
                    index + 1,
                    site.company_name,
                    site.pagination.kind(),
                    site.base_url
                );
            }
        }

        HarvestCommand::History => {
            let store = open_store(&config.environment.store).await?;
            let history = store.load().await?;

            println!("{}: {} records", store.describe(), history.len());
            if !history.extra_columns.is_empty() {
                println!("Extra columns: {}", history.extra_columns.join(", "));
            }
            for (company, count) in history.company_counts() {
                println!("  {:<28} {}", company, count);
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &HarvestSummary, dry_run: bool) {
    for site in &summary.sites {
        let marker = if site.stop.is_failure() { "✗" } else { "✓" };
        println!(
            "{} {:<28} pages: {:<3} listings: {:<4} new: {:<4} {}",
            marker, site.company, site.pages_visited, site.listings_seen, site.accepted, site.stop
        );
    }

    if dry_run {
        for record in &summary.new_records {
            println!(
                "  + {} | {} | {} | {}",
                record.company(),
                record.title(),
                record.location(),
                record.application_link()
            );
        }
    }

    let failed = summary.failed_sites().count();
    if failed > 0 {
        warn!("{} sites were skipped", failed);
    }

    println!(
        "Prior: {}  New: {}  Total: {}{}",
        summary.prior_count,
        summary.new_count(),
        summary.final_count,
        if summary.persisted { "" } else { " (not saved)" }
    );
}
