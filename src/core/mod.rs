// src/core/mod.rs
//! Shared services: configuration loading, file system helpers and SQLite access

pub mod config_manager;
pub mod database;
pub mod fs_ops;

pub use config_manager::ConfigManager;
pub use database::Database;
pub use fs_ops::FsOps;
