//! Expiry Sweep Task
//!
//! Every mutating cache operation fires due expiries first, so this task only
//! bounds how long an expired key can linger while the cache sits idle.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that fires due expiries every `interval`.
///
/// The returned handle is aborted during graceful shutdown.
pub fn spawn_expiry_task(cache: SharedCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(?interval, "Starting expiry sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let fired = cache.write().await.fire_due();

            if fired > 0 {
                debug!(fired, "Expiry sweep removed keys");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{shared, CacheStore};

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_expired_keys() {
        let cache = shared(CacheStore::new(None));
        {
            let mut guard = cache.write().await;
            guard.set("expire_soon", "value");
            guard.expire_in("expire_soon", Duration::from_millis(100));
        }

        let handle = spawn_expiry_task(cache.clone(), Duration::from_millis(250));

        tokio::time::sleep(Duration::from_millis(300)).await;

        {
            let guard = cache.read().await;
            assert_eq!(guard.len(), 0, "Expired key should have been swept");
            assert_eq!(guard.pending_expiries(), 0);
            assert_eq!(guard.stats().expirations, 1);
        }

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_preserves_live_keys() {
        let cache = shared(CacheStore::new(None));
        {
            let mut guard = cache.write().await;
            guard.set("long_lived", "value");
            guard.set("no_expiry", "value");
            guard.expire_in("long_lived", Duration::from_secs(3600));
        }

        let handle = spawn_expiry_task(cache.clone(), Duration::from_millis(250));

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(cache.read().await.len(), 2);

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let cache = shared(CacheStore::new(None));

        let handle = spawn_expiry_task(cache, Duration::from_secs(1));
        handle.abort();

        let result = handle.await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
