// src/lib.rs
//! Job offer harvester.
//!
//! Walks a configured list of career sites through one browser session,
//! extracts listings, drops anything already recorded, and appends the rest
//! to a persistent "Job Offers" history.

pub mod browser;
pub mod config;
pub mod core;
pub mod environment;
pub mod harvest_cli;
pub mod history;
pub mod identity;
pub mod orchestrator;
pub mod pipeline;
pub mod scraping;
pub mod types;

pub use browser::{launcher_for, Browser, BrowserError, BrowserKind, Launcher};
pub use config::CrawlSettings;
pub use history::{merge, History, HistoryStore};
pub use identity::JobIdentity;
pub use orchestrator::Orchestrator;
pub use pipeline::{harvest, HarvestOptions, HarvestSummary};
pub use types::{JobRecord, SeenIdentitySet, SiteConfig};
