// src/history/mod.rs
//! Persisted "Job Offers" collection.
//!
//! The history is the only state that outlives a run. It is loaded once,
//! seeds the run's [`SeenIdentitySet`], and is written back as the strict
//! union of prior rows and the run's new records. Prior rows are never
//! rewritten: their order, values and any extra columns a user added by
//! hand survive every merge/persist cycle.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use crate::identity::JobIdentity;
use crate::types::job::{JobRecord, SeenIdentitySet};

pub mod csv_store;
pub mod sqlite_store;

pub use csv_store::CsvHistoryStore;
pub use sqlite_store::SqliteHistoryStore;

pub const COLLECTION_NAME: &str = "Job Offers";

/// One persisted row; `discovered_at` is kept verbatim as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub company: String,
    pub title: String,
    pub application_link: String,
    pub location: String,
    pub discovered_at: String,
    pub identity: JobIdentity,
    pub extra: BTreeMap<String, String>,
}

impl HistoryRow {
    /// Row read from storage; a missing identity is derived from the fields
    pub fn from_stored(
        company: String,
        title: String,
        application_link: String,
        location: String,
        discovered_at: String,
        stored_identity: Option<&str>,
    ) -> Self {
        let identity = stored_identity
            .and_then(JobIdentity::from_stored)
            .unwrap_or_else(|| JobIdentity::new(&company, &title, &application_link));

        Self {
            company,
            title,
            application_link,
            location,
            discovered_at,
            identity,
            extra: BTreeMap::new(),
        }
    }

    /// Identity recomputed from the current field values
    pub fn derived_identity(&self) -> JobIdentity {
        JobIdentity::new(&self.company, &self.title, &self.application_link)
    }
}

impl From<&JobRecord> for HistoryRow {
    fn from(record: &JobRecord) -> Self {
        Self {
            company: record.company().to_string(),
            title: record.title().to_string(),
            application_link: record.application_link().to_string(),
            location: record.location().to_string(),
            discovered_at: record.discovered_at_display(),
            identity: record.identity(),
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    /// Columns beyond the core fields, in the order they were first seen
    pub extra_columns: Vec<String>,
    pub rows: Vec<HistoryRow>,
}

impl History {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stored and recomputed identities of every row
    pub fn identities(&self) -> SeenIdentitySet {
        self.rows
            .iter()
            .flat_map(|row| [row.identity.clone(), row.derived_identity()])
            .collect()
    }

    /// Record counts per company, in first-seen order
    pub fn company_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for row in &self.rows {
            match counts.iter_mut().find(|(company, _)| *company == row.company) {
                Some((_, count)) => *count += 1,
                None => counts.push((row.company.clone(), 1)),
            }
        }
        counts
    }
}

/// Union of `prior` and `new`: prior rows untouched, unseen new records appended
/// in order. A record already in `prior`, or earlier in `new`, is dropped.
pub fn merge(prior: History, new: &[JobRecord]) -> History {
    let known = prior.identities();
    let mut added: HashSet<_> = HashSet::new();
    let mut merged = prior;

    for record in new {
        let identity = record.identity();
        if known.contains(&identity) || !added.insert(identity) {
            continue;
        }
        merged.rows.push(HistoryRow::from(record));
    }

    merged
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    fn describe(&self) -> String;

    async fn load(&self) -> Result<History>;

    /// Replace the stored collection with `history` as a whole
    async fn persist(&self, history: &History) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    Csv,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    pub path: PathBuf,
}

pub async fn open_store(config: &StoreConfig) -> Result<Box<dyn HistoryStore>> {
    Ok(match config.kind {
        StoreKind::Csv => Box::new(CsvHistoryStore::new(config.path.clone())),
        StoreKind::Sqlite => Box::new(SqliteHistoryStore::open(&config.path).await?),
    })
}
