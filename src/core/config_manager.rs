// src/core/config_manager.rs
//! Loads the environment profile and the site catalog, and rejects bad sites up front

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::core::FsOps;
use crate::environment::EnvironmentConfig;
use crate::scraping::Extractor;
use crate::types::site::{PaginationConfig, SiteConfig, OFFSET_PLACEHOLDER, PAGE_NUM_PLACEHOLDER};

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: EnvironmentConfig,
    pub sites: Vec<SiteConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteCatalog {
    pub sites: Vec<SiteConfig>,
}

impl ConfigManager {
    pub fn load(config_path: &Path) -> Result<Self> {
        let environment = EnvironmentConfig::load(config_path)?;
        let sites = Self::load_sites(&environment.sites_path)?;

        Ok(Self { environment, sites })
    }

    /// Read a `.yaml`/`.yml` or `.toml` catalog and validate every site in it
    pub fn load_sites(path: &Path) -> Result<Vec<SiteConfig>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read site catalog: {}", path.display()))?;

        let catalog: SiteCatalog = match FsOps::get_extension(path).as_deref() {
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
            other => anyhow::bail!(
                "Unsupported site catalog format {:?}: {}",
                other.unwrap_or(""),
                path.display()
            ),
        };

        for site in &catalog.sites {
            Self::validate_site(site)?;
        }

        info!("Loaded {} sites from {}", catalog.sites.len(), path.display());
        Ok(catalog.sites)
    }

    pub fn validate_site(site: &SiteConfig) -> Result<()> {
        let company = &site.company_name;
        if company.trim().is_empty() {
            anyhow::bail!("Site {} has no company_name", site.base_url);
        }
        url::Url::parse(&site.base_url)
            .with_context(|| format!("{}: invalid base_url '{}'", company, site.base_url))?;
        if let Some(link_base) = &site.link_base {
            url::Url::parse(link_base)
                .with_context(|| format!("{}: invalid link_base '{}'", company, link_base))?;
        }

        Extractor::new(site)?;
        if let Some(frame_selector) = &site.frame_selector {
            scraper::Selector::parse(frame_selector).map_err(|e| {
                anyhow::anyhow!("{}: invalid frame_selector '{}': {:?}", company, frame_selector, e)
            })?;
        }

        match &site.pagination {
            PaginationConfig::UrlPattern {
                url_pattern,
                start_page,
                max_pages,
                offset_step,
            } => {
                let has_page = url_pattern.contains(PAGE_NUM_PLACEHOLDER);
                let has_offset = url_pattern.contains(OFFSET_PLACEHOLDER);
                if !has_page && !has_offset {
                    anyhow::bail!(
                        "{}: url_pattern needs {} or {}",
                        company,
                        PAGE_NUM_PLACEHOLDER,
                        OFFSET_PLACEHOLDER
                    );
                }
                if has_offset && offset_step.is_none() {
                    anyhow::bail!("{}: {} requires offset_step", company, OFFSET_PLACEHOLDER);
                }
                if *max_pages < 1 || start_page > max_pages {
                    anyhow::bail!(
                        "{}: page range {}..={} is empty",
                        company,
                        start_page,
                        max_pages
                    );
                }
            }
            PaginationConfig::ClickNext {
                next_page_selector,
                max_pages,
            } => {
                scraper::Selector::parse(next_page_selector).map_err(|e| {
                    anyhow::anyhow!(
                        "{}: invalid next_page_selector '{}': {:?}",
                        company,
                        next_page_selector,
                        e
                    )
                })?;
                if *max_pages < 1 {
                    anyhow::bail!("{}: max_pages must be at least 1", company);
                }
            }
            PaginationConfig::Scroll {
                max_scrolls,
                scroll_delay_secs,
            } => {
                if *max_scrolls < 1 {
                    anyhow::bail!("{}: max_scrolls must be at least 1", company);
                }
                if !scroll_delay_secs.is_finite() || *scroll_delay_secs < 0.0 {
                    anyhow::bail!("{}: scroll_delay_secs must be a non-negative number", company);
                }
            }
            PaginationConfig::None => {}
        }

        Ok(())
    }

    /// Catalog entries whose company matches one of `names` (case-insensitive); all when empty
    pub fn select_sites(&self, names: &[String]) -> Result<Vec<SiteConfig>> {
        if names.is_empty() {
            return Ok(self.sites.clone());
        }

        for name in names {
            if !self
                .sites
                .iter()
                .any(|site| site.company_name.eq_ignore_ascii_case(name))
            {
                anyhow::bail!("No configured site for company '{}'", name);
            }
        }

        Ok(self
            .sites
            .iter()
            .filter(|site| names.iter().any(|n| site.company_name.eq_ignore_ascii_case(n)))
            .cloned()
            .collect())
    }

    pub async fn ensure_directories(&self) -> Result<()> {
        if let Some(parent) = self.environment.store.path.parent() {
            FsOps::ensure_dir_exists(parent).await?;
        }
        if let Some(parent) = self.environment.log_file.as_deref().and_then(Path::parent) {
            FsOps::ensure_dir_exists(parent).await?;
        }
        Ok(())
    }
}
