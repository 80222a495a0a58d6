// src/types/job.rs
//! Job records and the run-wide set of known identities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::identity::JobIdentity;

pub const TITLE_NOT_FOUND: &str = "Title Not Found";
pub const LINK_NOT_FOUND: &str = "Link Not Found";
pub const LOCATION_NOT_FOUND: &str = "Location Not Found";

/// Timestamp layout used when a record is written to the history
pub const DISCOVERED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ===== Candidate produced by the extractor =====

/// One listing element as read from a results page, before deduplication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobListing {
    pub company: String,
    pub title: String,
    pub link: String,
    pub location: String,
}

impl JobListing {
    pub fn identity(&self) -> JobIdentity {
        JobIdentity::new(&self.company, &self.title, &self.link)
    }

    pub fn into_record(self, discovered_at: DateTime<Utc>) -> JobRecord {
        JobRecord {
            company: self.company,
            title: self.title,
            application_link: self.link,
            location: self.location,
            discovered_at,
        }
    }
}

// ===== Accepted record =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    company: String,
    title: String,
    application_link: String,
    location: String,
    discovered_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(
        company: impl Into<String>,
        title: impl Into<String>,
        application_link: impl Into<String>,
        location: impl Into<String>,
        discovered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            company: company.into(),
            title: title.into(),
            application_link: application_link.into(),
            location: location.into(),
            discovered_at,
        }
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn application_link(&self) -> &str {
        &self.application_link
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }

    pub fn discovered_at_display(&self) -> String {
        self.discovered_at.format(DISCOVERED_AT_FORMAT).to_string()
    }

    /// Always derived from the fields, so it cannot drift from the record
    pub fn identity(&self) -> JobIdentity {
        JobIdentity::new(&self.company, &self.title, &self.application_link)
    }
}

// ===== Seen identities =====

/// Every identity known to exist: history plus what this run accepted so far.
/// Insert-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenIdentitySet {
    inner: HashSet<JobIdentity>,
}

impl SeenIdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the identity was not known before
    pub fn insert(&mut self, identity: JobIdentity) -> bool {
        self.inner.insert(identity)
    }

    pub fn contains(&self, identity: &JobIdentity) -> bool {
        self.inner.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobIdentity> {
        self.inner.iter()
    }
}

impl Extend<JobIdentity> for SeenIdentitySet {
    fn extend<T: IntoIterator<Item = JobIdentity>>(&mut self, iter: T) {
        self.inner.extend(iter);
    }
}

impl FromIterator<JobIdentity> for SeenIdentitySet {
    fn from_iter<T: IntoIterator<Item = JobIdentity>>(iter: T) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
