//! RESTCache - An in-memory key/value cache served over HTTP
//!
//! Provides per-key expiry, batch commands with per-item errors, and
//! periodic on-disk backups with retention.

pub mod api;
pub mod backup;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod tasks;

pub use api::{create_router, AppState};
pub use backup::BackupManager;
pub use cache::CacheStore;
pub use config::Config;
pub use gateway::CommandGateway;
pub use tasks::{spawn_backup_task, spawn_expiry_task};
