// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::browser::BrowserKind;
use crate::config::CrawlSettings;
use crate::core::FsOps;
use crate::history::{StoreConfig, StoreKind};

pub const DEFAULT_CONFIG_FILE: &str = "harvester.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default = "default_sites_path")]
    pub sites_path: PathBuf,
    #[serde(default = "default_store")]
    pub store: StoreConfig,
    #[serde(default)]
    pub browser: BrowserKind,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub crawl: CrawlSettings,
}

fn default_sites_path() -> PathBuf {
    PathBuf::from("config/sites.yaml")
}

fn default_store() -> StoreConfig {
    StoreConfig {
        kind: StoreKind::Csv,
        path: PathBuf::from("out/Job Offers.csv"),
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            sites_path: default_sites_path(),
            store: default_store(),
            browser: BrowserKind::default(),
            log_file: None,
            crawl: CrawlSettings::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

impl EnvironmentConfig {
    /// Load the profile for the current environment from `config_path`
    pub fn load(config_path: &Path) -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        if !config_path.exists() {
            anyhow::bail!(
                "{} not found. The harvester cannot run without configuration.",
                config_path.display()
            );
        }

        let config_content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let env_config = Self::from_yaml(&config_content, &environment)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let base_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(env_config.resolved(&base_dir))
    }

    pub fn get_environment() -> String {
        std::env::var("HARVESTER_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn from_yaml(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(content)?;

        let profile = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };
        profile
            .crawl
            .validate()
            .with_context(|| format!("Invalid {} profile", environment))?;
        Ok(profile)
    }

    /// Make every configured path absolute against `base_dir`
    fn resolved(self, base_dir: &Path) -> Self {
        let resolve = |path: &Path| FsOps::normalize_path(base_dir, path);

        Self {
            sites_path: resolve(&self.sites_path),
            store: StoreConfig {
                kind: self.store.kind,
                path: resolve(&self.store.path),
            },
            log_file: self.log_file.as_deref().map(resolve),
            ..self
        }
    }
}
