// src/types/report.rs
//! Outcome types reported by the crawler and the orchestrator

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::types::job::{JobRecord, SeenIdentitySet};

/// Why a site's crawl ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum StopReason {
    /// Pagination ran through its configured range
    Exhausted,
    /// The "next" control could not be found or activated
    ControlExhausted,
    /// A scroll produced no new page height
    ScrollExhausted,
    /// Consecutive iterations without listing elements
    EmptyPages(u32),
    /// The listing container never appeared
    ListingTimeout(String),
    /// Navigation, interaction or extraction fault
    Fault(String),
}

impl StopReason {
    /// Site was abandoned rather than finished
    pub fn is_failure(&self) -> bool {
        matches!(self, StopReason::ListingTimeout(_) | StopReason::Fault(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "pagination exhausted"),
            StopReason::ControlExhausted => write!(f, "no further 'next' control"),
            StopReason::ScrollExhausted => write!(f, "scrolling loaded no new content"),
            StopReason::EmptyPages(count) => write!(f, "{} consecutive empty pages", count),
            StopReason::ListingTimeout(url) => write!(f, "listings did not appear on {}", url),
            StopReason::Fault(message) => write!(f, "site skipped: {}", message),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteReport {
    pub company: String,
    pub pages_visited: u32,
    pub listings_seen: usize,
    pub accepted: usize,
    pub stop: StopReason,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sites: Vec<SiteReport>,
    pub new_records: Vec<JobRecord>,
    pub seen: SeenIdentitySet,
}

impl RunReport {
    pub fn failed_sites(&self) -> impl Iterator<Item = &SiteReport> {
        self.sites.iter().filter(|site| site.stop.is_failure())
    }
}
