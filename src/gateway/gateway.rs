//! Command Gateway
//!
//! Checks whether a command is enabled, fans batch commands out into one
//! store call per input item, and wraps every outcome in a [`BatchResult`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use crate::backup::BackupManager;
use crate::cache::{CacheStore, SharedCache};
use crate::error::{CacheError, Result};
use crate::gateway::{BatchResult, Command, CommandToggles};
use crate::models::{KeyPairs, StatsReport};

pub struct CommandGateway {
    cache: SharedCache,
    backups: Arc<BackupManager>,
    toggles: CommandToggles,
    started_at: Instant,
}

impl CommandGateway {
    pub fn new(cache: SharedCache, backups: Arc<BackupManager>, toggles: CommandToggles) -> Self {
        Self {
            cache,
            backups,
            toggles,
            started_at: Instant::now(),
        }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn backups(&self) -> &Arc<BackupManager> {
        &self.backups
    }

    pub fn toggles(&self) -> &CommandToggles {
        &self.toggles
    }

    // == Execute ==
    /// Runs `command` over the ordered `items`.
    ///
    /// A disabled command fails as a whole before touching the store. Batch
    /// commands run once per item under a single write lock; a failing item
    /// is reported with its input index and never affects its siblings.
    pub async fn execute(&self, command: Command, items: &KeyPairs) -> BatchResult {
        if let Err(error) = self.toggles.check(command) {
            warn!(%command, "Rejected disabled command");
            return BatchResult::failed(&error);
        }

        if command.is_batch() {
            return self.execute_batch(command, items).await;
        }

        match command {
            Command::Ping => BatchResult::single(Ok(Value::from(self.cache.read().await.ping()))),
            Command::Keys => {
                let keys = self.cache.write().await.keys();
                BatchResult::from_list(keys.into_iter().map(Value::from))
            }
            Command::Random => match self.cache.write().await.random() {
                Some(key) => BatchResult::single(Ok(Value::from(key))),
                None => BatchResult::new(),
            },
            Command::Stats => BatchResult::single(self.stats().await.and_then(|report| {
                serde_json::to_value(report)
                    .map_err(|e| CacheError::parse("Unable to serialize stats", e))
            })),
            Command::Backup => {
                BatchResult::single(self.backups.perform_backup().await.map(Value::from))
            }
            Command::Restore => BatchResult::single(self.restore(items).await),
            Command::Dump => BatchResult::single(self.dump(items).await),
            Command::Flush => {
                self.cache.write().await.flush();
                BatchResult::single(Ok(Value::Bool(true)))
            }
            batch => BatchResult::failed(&CacheError::Internal(format!(
                "{} was not dispatched as a batch",
                batch
            ))),
        }
    }

    async fn execute_batch(&self, command: Command, items: &KeyPairs) -> BatchResult {
        let mut cache = self.cache.write().await;
        let mut result = BatchResult::new();

        for (index, (key, value)) in items.iter().enumerate() {
            let outcome = apply_item(&mut cache, command, key, value);
            if let Err(error) = &outcome {
                debug!(%command, index, key, error = %error, "Batch item failed");
            }
            result.record(index, outcome);
        }

        result
    }

    // == Stats ==
    /// Collects the STATS report, including the current backup records.
    pub async fn stats(&self) -> Result<StatsReport> {
        // A missing backup directory should not hide the cache statistics.
        let backups = self.backups.get_backups().await.unwrap_or_else(|error| {
            warn!(error = %error, "Unable to list backups for STATS");
            Vec::new()
        });

        let cache = self.cache.read().await;
        Ok(StatsReport::new(&cache, self.started_at.elapsed(), backups))
    }

    async fn restore(&self, items: &KeyPairs) -> Result<Value> {
        if items.len() != 1 {
            return Err(CacheError::Validation(format!(
                "RESTORE takes exactly 1 key, got {}.",
                items.len()
            )));
        }

        let name = items.keys().next().unwrap_or_default();
        self.backups.restore_backup(name).await?;
        Ok(Value::Bool(true))
    }

    async fn dump(&self, items: &KeyPairs) -> Result<Value> {
        let contents = match items.len() {
            0 => self.cache.read().await.snapshot(),
            1 => {
                let name = items.keys().next().unwrap_or_default();
                self.backups.load_backup(name).await?
            }
            n => {
                return Err(CacheError::Validation(format!(
                    "Invalid number of keys for DUMP [{}]. DUMP requires 0 or 1 key.",
                    n
                )))
            }
        };

        let ordered: BTreeMap<_, _> = contents.into_iter().collect();
        serde_json::to_value(ordered).map_err(|e| CacheError::parse("Unable to serialize dump", e))
    }
}

/// Runs one batch item against the store.
fn apply_item(
    cache: &mut CacheStore,
    command: Command,
    key: &str,
    value: Option<&str>,
) -> Result<Value> {
    match command {
        Command::Set => {
            let value = value.ok_or_else(|| {
                CacheError::Validation(format!("Missing value for SET of key [{}]", key))
            })?;
            cache.set(key, value);
            Ok(Value::Bool(true))
        }
        Command::Get => Ok(cache.get(key).map_or(Value::Null, |value| value.to_json())),
        Command::Del => {
            cache.del(key);
            Ok(Value::Bool(true))
        }
        Command::Incr => cache.incr(key, value).map(Value::from),
        Command::Decr => cache.decr(key, value).map(Value::from),
        Command::Expire => cache.expire(key, value.unwrap_or_default()).map(Value::Bool),
        Command::Unexpire => {
            cache.unexpire(key);
            Ok(Value::Bool(true))
        }
        other => Err(CacheError::Internal(format!(
            "{} is not a batch command",
            other
        ))),
    }
}
