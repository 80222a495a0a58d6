// src/history/sqlite_store.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{History, HistoryRow, HistoryStore, COLLECTION_NAME};
use crate::core::database::{JobOfferRepository, JobOfferRow};
use crate::core::Database;

pub struct SqliteHistoryStore {
    path: PathBuf,
    db: Database,
}

impl SqliteHistoryStore {
    pub async fn open(path: &Path) -> Result<Self> {
        let db = Database::new(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            db,
        })
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    fn describe(&self) -> String {
        format!("{} (sqlite: {})", COLLECTION_NAME, self.path.display())
    }

    async fn load(&self) -> Result<History> {
        let repo = JobOfferRepository::new(self.db.pool());
        let extra_columns = repo.extra_columns().await?;

        let mut rows = Vec::new();
        for stored in repo.list_all().await? {
            let extra: BTreeMap<String, String> = serde_json::from_str(&stored.extra)
                .with_context(|| format!("Invalid extra columns on row {}", stored.position))?;
            let mut row = HistoryRow::from_stored(
                stored.company,
                stored.title,
                stored.application_link,
                stored.location,
                stored.discovered_at,
                Some(stored.job_id.as_str()),
            );
            row.extra = extra;
            rows.push(row);
        }

        info!("Loaded {} records from {}", rows.len(), self.path.display());
        Ok(History { extra_columns, rows })
    }

    async fn persist(&self, history: &History) -> Result<()> {
        let rows = history
            .rows
            .iter()
            .enumerate()
            .map(|(position, row)| -> Result<JobOfferRow> {
                Ok(JobOfferRow {
                    position: position as i64,
                    job_id: row.identity.as_str().to_string(),
                    company: row.company.clone(),
                    title: row.title.clone(),
                    application_link: row.application_link.clone(),
                    location: row.location.clone(),
                    discovered_at: row.discovered_at.clone(),
                    extra: serde_json::to_string(&row.extra)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        JobOfferRepository::new(self.db.pool())
            .replace_all(&history.extra_columns, &rows)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::merge;
    use crate::types::job::JobRecord;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(title: &str) -> JobRecord {
        JobRecord::new(
            "Acme",
            title,
            format!("https://acme.test/{}", title),
            "Remote",
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_fresh_database_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = SqliteHistoryStore::open(&dir.path().join("history.db")).await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_replaces_and_keeps_order() {
        let dir = TempDir::new().unwrap();
        let store = SqliteHistoryStore::open(&dir.path().join("history.db")).await.unwrap();

        let mut first = merge(History::default(), &[record("b"), record("a")]);
        first.extra_columns.push("Status".into());
        first.rows[0].extra.insert("Status".into(), "Applied".into());
        store.persist(&first).await.unwrap();

        let second = merge(store.load().await.unwrap(), &[record("a"), record("c")]);
        store.persist(&second).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, second);
        let titles: Vec<&str> = loaded.rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a", "c"]);
        assert_eq!(loaded.extra_columns, vec!["Status"]);
        assert_eq!(loaded.rows[0].extra.get("Status").map(String::as_str), Some("Applied"));
    }
}
