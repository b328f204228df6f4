//! Backup Module
//!
//! Snapshots the cache's value map to flat files, enforces a retention
//! count, and restores snapshots by file name.

mod manager;
mod record;

use std::path::PathBuf;
use std::time::Duration;

pub use manager::BackupManager;
pub use record::BackupRecord;

/// Suffix identifying backup files in the backup directory.
pub const BACKUP_FILE_EXTENSION: &str = ".rc.bak";

/// Backup settings.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Run `perform_backup` every `interval`
    pub automatic: bool,
    /// Interval between automatic backups
    pub interval: Duration,
    /// Number of backup files to keep
    pub count: usize,
    /// Directory holding the backup files
    pub directory: PathBuf,
    /// Restore the newest backup before serving traffic
    pub load_on_startup: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            automatic: true,
            interval: Duration::from_secs(60),
            count: 5,
            directory: PathBuf::from("./out"),
            load_on_startup: true,
        }
    }
}
