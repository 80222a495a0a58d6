// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use job_harvester::environment::EnvironmentConfig;
use job_harvester::harvest_cli::{handle_command, HarvestCli};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log file named by the active profile, if the config can be read at all
fn configured_log_file(config_path: &Path) -> Option<PathBuf> {
    EnvironmentConfig::load(config_path).ok()?.log_file
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = HarvestCli::parse();

    let log_file = match configured_log_file(&cli.config) {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true) // Clear file on startup
                .open(&path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            Some(file)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(log_file.map(|file| {
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(false)
        }))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    handle_command(cli).await
}
