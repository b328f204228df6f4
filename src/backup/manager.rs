//! Backup Manager
//!
//! Reads and writes the cache's full content to the backup directory. The
//! manager never owns the store; it reaches it through the shared handle.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::backup::{BackupConfig, BackupRecord, BACKUP_FILE_EXTENSION};
use crate::cache::{CacheValue, SharedCache};
use crate::error::{CacheError, Result};

// == Backup Manager ==
pub struct BackupManager {
    config: BackupConfig,
    cache: SharedCache,
    /// Serialises backup, cleanup and restore operations
    in_flight: Mutex<()>,
}

impl BackupManager {
    pub fn new(config: BackupConfig, cache: SharedCache) -> Self {
        debug!(?config, "Constructing BackupManager");
        Self {
            config,
            cache,
            in_flight: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    // == Initialize ==
    /// Creates the backup directory and, when configured, restores the
    /// newest backup.
    ///
    /// Returns the name of the restored backup, if any.
    pub async fn initialize(&self) -> Result<Option<String>> {
        let directory = &self.config.directory;
        fs::create_dir_all(directory).await.map_err(|e| {
            CacheError::io(
                format!("Unable to create backup directory {}", directory.display()),
                e,
            )
        })?;

        if !self.config.load_on_startup {
            return Ok(None);
        }
        self.restore_newest().await
    }

    // == Perform Backup ==
    /// Writes the live content map to a new backup file, then removes
    /// backups beyond the retention count.
    ///
    /// Cleanup runs even when the write fails. Returns the new file name.
    pub async fn perform_backup(&self) -> Result<String> {
        let _guard = self.in_flight.lock().await;
        debug!("Performing cache backup...");

        let written = match self.serialize_cache().await {
            Ok(contents) => self.write_new_backup(&contents).await,
            Err(e) => Err(e),
        };

        self.finish_backup(written).await
    }

    /// Logs the write outcome and applies retention, whatever the outcome.
    async fn finish_backup(&self, written: Result<String>) -> Result<String> {
        match &written {
            Ok(name) => debug!(backup = %name, "New backup created"),
            Err(e) => error!(error = %e, "An error occurred during cache backup"),
        }

        if let Err(e) = self.remove_excess().await {
            warn!(error = %e, "Backup cleanup failed");
        }

        written
    }

    async fn serialize_cache(&self) -> Result<Vec<u8>> {
        let cache = self.cache.read().await;
        serde_json::to_vec(&cache.snapshot())
            .map_err(|e| CacheError::parse("Unable to serialize cache", e))
    }

    async fn write_new_backup(&self, contents: &[u8]) -> Result<String> {
        let stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S%.6f").to_string();
        let mut attempt = 0u32;

        loop {
            let name = if attempt == 0 {
                format!("{}{}", stamp, BACKUP_FILE_EXTENSION)
            } else {
                // Zero-padded so name order follows creation order.
                format!("{}_{:03}{}", stamp, attempt, BACKUP_FILE_EXTENSION)
            };
            let path = self.config.directory.join(&name);

            let opened = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            let mut file = match opened {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    attempt += 1;
                    continue;
                }
                Err(e) => {
                    return Err(CacheError::io(format!("Unable to write backup {}", name), e))
                }
            };

            let write = async {
                file.write_all(contents).await?;
                file.flush().await
            };
            write
                .await
                .map_err(|e| CacheError::io(format!("Unable to write backup {}", name), e))?;

            return Ok(name);
        }
    }

    // == Clean Excess Backups ==
    /// Deletes the oldest backups beyond the retention count.
    ///
    /// Returns the backups that remain.
    pub async fn clean_excess_backups(&self) -> Result<Vec<BackupRecord>> {
        let _guard = self.in_flight.lock().await;
        self.remove_excess().await
    }

    async fn remove_excess(&self) -> Result<Vec<BackupRecord>> {
        let mut backups = self.get_backups().await?;
        let excess = backups.len().saturating_sub(self.config.count);
        debug!(
            existing = backups.len(),
            removing = excess,
            "Cleaning excess backups"
        );

        if excess == 0 {
            return Ok(backups);
        }

        for backup in backups.drain(self.config.count..) {
            let path = self.config.directory.join(&backup.file_name);
            match fs::remove_file(&path).await {
                Ok(()) => info!(backup = %backup.file_name, "Removed backup"),
                Err(e) => warn!(backup = %backup.file_name, error = %e, "Unable to remove backup"),
            }
        }

        Ok(backups)
    }

    // == Get Backups ==
    /// Lists the backup files, newest first.
    pub async fn get_backups(&self) -> Result<Vec<BackupRecord>> {
        let directory = &self.config.directory;
        let list_error = |e| {
            CacheError::io(
                format!("Unable to list backups in {}", directory.display()),
                e,
            )
        };

        let mut entries = fs::read_dir(directory).await.map_err(list_error)?;
        let mut backups = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_backup_name(&name) {
                continue;
            }

            // A file removed between listing and stat is simply skipped.
            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    debug!(backup = %name, error = %e, "Skipping unreadable backup entry");
                    continue;
                }
            };
            let modified = metadata.modified().map_err(list_error)?;

            backups.push(BackupRecord::new(name, DateTime::<Utc>::from(modified)));
        }

        backups.sort();
        Ok(backups)
    }

    // == Load Backup ==
    /// Reads and parses one backup. The live store is not touched.
    pub async fn load_backup(&self, name: &str) -> Result<HashMap<String, CacheValue>> {
        debug!(backup = %name, "Loading backup");
        let path = self.backup_path(name)?;

        let loaded = match fs::read_to_string(&path).await {
            Ok(data) => serde_json::from_str(&data)
                .map_err(|e| CacheError::parse(format!("Unable to parse backup {}", name), e)),
            Err(e) => Err(CacheError::io(format!("Unable to load backup {}", name), e)),
        };

        if let Err(e) = &loaded {
            error!(backup = %name, error = %e, "Unable to load backup");
        }
        loaded
    }

    // == Restore Backup ==
    /// Replaces the live value map with the named backup's contents.
    ///
    /// Restored keys carry no expiry. On failure the store is unchanged.
    /// Returns the number of restored keys.
    pub async fn restore_backup(&self, name: &str) -> Result<usize> {
        let _guard = self.in_flight.lock().await;
        info!(backup = %name, "Cache being restored from backup");

        let contents = self.load_backup(name).await?;
        let restored = contents.len();
        self.cache.write().await.replace_contents(contents);

        info!(backup = %name, keys = restored, "Cache restored from backup");
        Ok(restored)
    }

    /// Restores the newest backup, if one exists.
    pub async fn restore_newest(&self) -> Result<Option<String>> {
        let Some(newest) = self.get_backups().await?.into_iter().next() else {
            info!("No backup to restore");
            return Ok(None);
        };

        self.restore_backup(&newest.file_name).await?;
        Ok(Some(newest.file_name))
    }

    /// Resolves a backup name to a path inside the backup directory.
    fn backup_path(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        let plain_file_name = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();

        if !plain_file_name {
            return Err(CacheError::Validation(format!(
                "Invalid backup name [{}]",
                name
            )));
        }
        Ok(self.config.directory.join(name))
    }
}

fn is_backup_name(name: &str) -> bool {
    name.len() > BACKUP_FILE_EXTENSION.len() && name.ends_with(BACKUP_FILE_EXTENSION)
}
