//! Periodic Backup Task

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::backup::BackupManager;

/// Spawns a background task that performs a backup every `interval`.
///
/// A failed backup is logged and the next run is still scheduled.
pub fn spawn_backup_task(manager: Arc<BackupManager>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(?interval, "Starting automatic backup task");

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if let Err(e) = manager.perform_backup().await {
                warn!(error = %e, "Automatic backup failed");
            }
        }
    })
}
