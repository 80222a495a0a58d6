// src/core/database.rs
//! SQLite connection and the "Job Offers" tables

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

use crate::core::FsOps;

// ===== Core Database Connection Management =====

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect, creating the file and schema when missing
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            FsOps::ensure_dir_exists(parent).await?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        info!("Database connection established: {}", database_path.display());

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_offers (
                position INTEGER PRIMARY KEY,
                job_id TEXT NOT NULL,
                company TEXT NOT NULL,
                title TEXT NOT NULL,
                application_link TEXT NOT NULL,
                location TEXT NOT NULL,
                discovered_at TEXT NOT NULL,
                extra TEXT NOT NULL DEFAULT '{}'
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_job_offers_job_id ON job_offers(job_id);")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS extra_columns (
                position INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }
}

// ===== Job Offer Models =====

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobOfferRow {
    pub position: i64,
    pub job_id: String,
    pub company: String,
    pub title: String,
    pub application_link: String,
    pub location: String,
    pub discovered_at: String,
    pub extra: String,
}

// ===== Job Offer Repository =====

pub struct JobOfferRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> JobOfferRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<JobOfferRow>> {
        let rows = sqlx::query_as::<_, JobOfferRow>(
            r#"
            SELECT position, job_id, company, title, application_link, location, discovered_at, extra
            FROM job_offers
            ORDER BY position ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn extra_columns(&self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM extra_columns ORDER BY position ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(names)
    }

    /// Swap the whole collection in one transaction
    pub async fn replace_all(&self, extra_columns: &[String], rows: &[JobOfferRow]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM job_offers").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM extra_columns").execute(&mut *tx).await?;

        for (position, name) in extra_columns.iter().enumerate() {
            sqlx::query("INSERT INTO extra_columns (position, name) VALUES (?, ?)")
                .bind(position as i64)
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO job_offers
                    (position, job_id, company, title, application_link, location, discovered_at, extra)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(row.position)
            .bind(&row.job_id)
            .bind(&row.company)
            .bind(&row.title)
            .bind(&row.application_link)
            .bind(&row.location)
            .bind(&row.discovered_at)
            .bind(&row.extra)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Replaced job_offers with {} rows", rows.len());
        Ok(())
    }
}
