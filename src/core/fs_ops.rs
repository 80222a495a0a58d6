// src/core/fs_ops.rs
//! File system helpers shared by the history store and config loading

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

pub struct FsOps;

impl FsOps {
    pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            info!("Created directory: {}", path.display());
        }
        Ok(())
    }

    /// Write through a sibling temp file and rename, so readers never see a partial file
    pub async fn write_file_atomic(path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            Self::ensure_dir_exists(parent).await?;
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

        fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("Failed to write file: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).await.with_context(|| {
            format!("Failed to move {} into place", tmp_path.display())
        })?;

        info!("Written file: {}", path.display());
        Ok(())
    }

    pub async fn copy_file(src: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            Self::ensure_dir_exists(parent).await?;
        }

        fs::copy(src, dest)
            .await
            .with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))?;

        info!("Copied {} to {}", src.display(), dest.display());
        Ok(())
    }

    /// Relative paths are taken from `base`
    pub fn normalize_path(base: &Path, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            base.join(relative)
        }
    }

    pub fn get_extension(path: &Path) -> Option<String> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    /// Copy to `{stem}.backup.{timestamp}.{ext}` next to the original
    pub async fn backup_file(path: &Path) -> Result<PathBuf> {
        if !path.exists() {
            anyhow::bail!("File to backup does not exist: {}", path.display());
        }

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let backup_name = match Self::get_extension(path) {
            Some(ext) => format!("{}.backup.{}.{}", stem, stamp, ext),
            None => format!("{}.backup.{}", stem, stamp),
        };

        let backup_path = path.with_file_name(backup_name);
        Self::copy_file(path, &backup_path).await?;
        Ok(backup_path)
    }
}
