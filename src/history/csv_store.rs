// src/history/csv_store.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{History, HistoryRow, HistoryStore, COLLECTION_NAME};
use crate::core::FsOps;

pub const COMPANY: &str = "Company";
pub const TITLE: &str = "Title";
pub const APPLICATION_LINK: &str = "Application Link";
pub const LOCATION: &str = "Location";
pub const DISCOVERED_AT: &str = "Discovered At";
pub const JOB_ID: &str = "job_id";

const CANONICAL_HEADERS: [&str; 6] = [COMPANY, TITLE, APPLICATION_LINK, LOCATION, DISCOVERED_AT, JOB_ID];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Company,
    Title,
    ApplicationLink,
    Location,
    DiscoveredAt,
    JobId,
    Extra,
}

impl Column {
    /// Canonical names plus the headers written by older spreadsheets
    fn from_header(header: &str) -> Self {
        match header.trim() {
            COMPANY | "Empresa" => Column::Company,
            TITLE | "Puesto" => Column::Title,
            APPLICATION_LINK | "Link de Aplicación" => Column::ApplicationLink,
            LOCATION | "Ubicacion" | "Ubicación" => Column::Location,
            DISCOVERED_AT | "Fecha de Registro" => Column::DiscoveredAt,
            JOB_ID => Column::JobId,
            _ => Column::Extra,
        }
    }
}

pub struct CsvHistoryStore {
    path: PathBuf,
}

impl CsvHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for CsvHistoryStore {
    fn describe(&self) -> String {
        format!("{} (csv: {})", COLLECTION_NAME, self.path.display())
    }

    async fn load(&self) -> Result<History> {
        if !self.path.exists() {
            info!("No history at {}, starting empty", self.path.display());
            return Ok(History::default());
        }

        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read history: {}", self.path.display()))?;

        match parse_history(&bytes) {
            Ok(history) => {
                info!("Loaded {} records from {}", history.len(), self.path.display());
                Ok(history)
            }
            Err(e) => {
                let backup = FsOps::backup_file(&self.path).await?;
                warn!(
                    "History at {} is unreadable ({:#}); saved a copy to {} and starting empty",
                    self.path.display(),
                    e,
                    backup.display()
                );
                Ok(History::default())
            }
        }
    }

    async fn persist(&self, history: &History) -> Result<()> {
        let bytes = render_history(history)?;
        FsOps::write_file_atomic(&self.path, &bytes).await?;
        info!("Persisted {} records to {}", history.len(), self.path.display());
        Ok(())
    }
}

fn parse_history(bytes: &[u8]) -> Result<History> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(History::default());
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .context("Invalid header row")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    // A core column is read from its first header only; repeats and duplicate
    // extra headers are kept as extra columns under unique names.
    let mut columns: Vec<Column> = Vec::with_capacity(headers.len());
    let mut extra_columns: Vec<String> = Vec::new();
    for header in &headers {
        let mut column = Column::from_header(header);
        if column != Column::Extra && columns.contains(&column) {
            column = Column::Extra;
        }
        if column == Column::Extra {
            extra_columns.push(unique_column_name(header, &extra_columns));
        }
        columns.push(column);
    }

    for required in [Column::Company, Column::ApplicationLink] {
        if !columns.contains(&required) {
            anyhow::bail!("Missing {:?} column in header {:?}", required, headers);
        }
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Invalid record {}", index + 1))?;
        let field = |wanted: Column| {
            columns
                .iter()
                .position(|c| *c == wanted)
                .and_then(|i| record.get(i))
                .unwrap_or("")
                .to_string()
        };

        let job_id = field(Column::JobId);
        let mut row = HistoryRow::from_stored(
            field(Column::Company),
            field(Column::Title),
            field(Column::ApplicationLink),
            field(Column::Location),
            field(Column::DiscoveredAt),
            Some(job_id.as_str()),
        );

        let extra_positions = columns
            .iter()
            .enumerate()
            .filter(|(_, column)| **column == Column::Extra)
            .map(|(i, _)| i);
        for (name, i) in extra_columns.iter().zip(extra_positions) {
            row.extra
                .insert(name.clone(), record.get(i).unwrap_or("").to_string());
        }
        rows.push(row);
    }

    Ok(History { extra_columns, rows })
}

fn unique_column_name(header: &str, taken: &[String]) -> String {
    if !taken.iter().any(|name| name == header) {
        return header.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{} ({})", header, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn render_history(history: &History) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let header = CANONICAL_HEADERS
        .iter()
        .copied()
        .chain(history.extra_columns.iter().map(String::as_str));
    writer.write_record(header)?;

    for row in &history.rows {
        let mut fields = vec![
            row.company.as_str(),
            row.title.as_str(),
            row.application_link.as_str(),
            row.location.as_str(),
            row.discovered_at.as_str(),
            row.identity.as_str(),
        ];
        fields.extend(
            history
                .extra_columns
                .iter()
                .map(|name| row.extra.get(name).map(String::as_str).unwrap_or("")),
        );
        writer.write_record(&fields)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::merge;
    use crate::types::job::JobRecord;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(title: &str, link: &str) -> JobRecord {
        JobRecord::new(
            "Acme",
            title,
            link,
            "Remote",
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_history() {
        let dir = TempDir::new().unwrap();
        let store = CsvHistoryStore::new(dir.path().join("Job Offers.csv"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_then_load() {
        let dir = TempDir::new().unwrap();
        let store = CsvHistoryStore::new(dir.path().join("out").join("Job Offers.csv"));

        let history = merge(
            History::default(),
            &[record("A, Senior", "https://acme.test/a"), record("B", "https://acme.test/b")],
        );
        store.persist(&history).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, history);
        assert_eq!(loaded.rows[0].title, "A, Senior");
    }

    #[tokio::test]
    async fn test_extra_columns_survive_merge_and_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Job Offers.csv");
        tokio::fs::write(
            &path,
            "Company,Title,Application Link,Location,Discovered At,job_id,Status,Notes\n\
             Acme,A,https://acme.test/a,Remote,2024-01-01 08:00:00,Acme::A::https://acme.test/a,Applied,call back\n",
        )
        .await
        .unwrap();
        let store = CsvHistoryStore::new(&path);

        let prior = store.load().await.unwrap();
        assert_eq!(prior.extra_columns, vec!["Status", "Notes"]);

        let merged = merge(prior.clone(), &[record("B", "https://acme.test/b")]);
        store.persist(&merged).await.unwrap();

        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.rows[0], prior.rows[0]);
        assert_eq!(reloaded.rows[0].extra.get("Notes").map(String::as_str), Some("call back"));
        assert_eq!(reloaded.rows[1].extra.get("Status").map(String::as_str), Some(""));
    }

    #[tokio::test]
    async fn test_legacy_headers_and_missing_job_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Job Offers.csv");
        tokio::fs::write(
            &path,
            "Empresa,Puesto,Link de Aplicación,Ubicacion,Fecha de Registro\n\
             Acme,A,https://acme.test/a,Lima,2024-01-01 08:00:00\n",
        )
        .await
        .unwrap();

        let history = CsvHistoryStore::new(&path).load().await.unwrap();

        assert_eq!(history.len(), 1);
        assert!(history.extra_columns.is_empty());
        assert_eq!(history.rows[0].location, "Lima");
        assert_eq!(history.rows[0].identity, record("A", "https://acme.test/a").identity());
        assert!(history.identities().contains(&record("A", "https://acme.test/a").identity()));
    }

    #[tokio::test]
    async fn test_repeated_core_header_is_kept_as_extra() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Job Offers.csv");
        tokio::fs::write(
            &path,
            "Empresa,Puesto,Link de Aplicación,Ubicacion,Fecha de Registro,Location\n\
             Acme,A,https://acme.test/a,Lima,2024-01-01 08:00:00,Remote-AR\n",
        )
        .await
        .unwrap();
        let store = CsvHistoryStore::new(&path);

        let history = store.load().await.unwrap();
        assert_eq!(history.rows[0].location, "Lima");
        assert_eq!(history.extra_columns, vec!["Location"]);
        assert_eq!(history.rows[0].extra.get("Location").map(String::as_str), Some("Remote-AR"));

        store.persist(&history).await.unwrap();
        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded, history);
    }

    #[tokio::test]
    async fn test_duplicate_extra_headers_keep_every_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Job Offers.csv");
        tokio::fs::write(
            &path,
            "Company,Title,Application Link,Notes,Notes\n\
             Acme,A,https://acme.test/a,first,second\n",
        )
        .await
        .unwrap();
        let store = CsvHistoryStore::new(&path);

        let history = store.load().await.unwrap();
        assert_eq!(history.extra_columns, vec!["Notes", "Notes (2)"]);
        assert_eq!(history.rows[0].extra.get("Notes").map(String::as_str), Some("first"));
        assert_eq!(history.rows[0].extra.get("Notes (2)").map(String::as_str), Some("second"));

        store.persist(&history).await.unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.contains("first"));
        assert!(written.contains("second"));
        assert_eq!(store.load().await.unwrap(), history);
    }

    #[tokio::test]
    async fn test_short_rows_are_padded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Job Offers.csv");
        tokio::fs::write(
            &path,
            "Company,Title,Application Link,Location,Discovered At,job_id\nAcme,A,https://acme.test/a\n",
        )
        .await
        .unwrap();

        let history = CsvHistoryStore::new(&path).load().await.unwrap();
        assert_eq!(history.rows[0].location, "");
        assert_eq!(history.rows[0].identity.as_str(), "Acme::A::https://acme.test/a");
    }

    #[tokio::test]
    async fn test_unparseable_history_is_backed_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Job Offers.csv");
        tokio::fs::write(&path, b"\xff\xfe garbage\nnot,a,history\n").await.unwrap();

        let history = CsvHistoryStore::new(&path).load().await.unwrap();
        assert!(history.is_empty());

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert!(names.iter().any(|n| n.starts_with("Job Offers.backup.")));
        assert!(path.exists());
    }
}
