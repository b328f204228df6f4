//! Response DTOs for the cache server API
//!
//! Defines the STATS report. Every other command answers with the
//! [`BatchResult`](crate::gateway::BatchResult) envelope directly.

use std::time::Duration;

use serde::Serialize;

use crate::backup::BackupRecord;
use crate::cache::{CacheStats, CacheStore};

/// Response body for the STATS command
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub cache: CacheSection,
    pub memory: MemorySection,
    pub system: SystemSection,
    pub versions: VersionSection,
    pub misc: MiscSection,
    pub backups: Vec<BackupRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSection {
    pub key_count: usize,
    pub pending_expiries: usize,
    #[serde(flatten)]
    pub counters: CacheStats,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySection {
    /// Bytes held by keys and values, excluding map overhead
    pub approximate_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemSection {
    pub pid: u32,
    pub platform: &'static str,
    pub architecture: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionSection {
    pub restcache: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiscSection {
    pub up_time: String,
}

impl StatsReport {
    /// Builds a report from the store's current state.
    pub fn new(cache: &CacheStore, uptime: Duration, backups: Vec<BackupRecord>) -> Self {
        let counters = cache.stats();
        Self {
            cache: CacheSection {
                key_count: cache.key_count(),
                pending_expiries: cache.pending_expiries(),
                hit_rate: counters.hit_rate(),
                counters,
            },
            memory: MemorySection {
                approximate_bytes: cache.approximate_bytes(),
            },
            system: SystemSection {
                pid: std::process::id(),
                platform: std::env::consts::OS,
                architecture: std::env::consts::ARCH,
            },
            versions: VersionSection {
                restcache: env!("CARGO_PKG_VERSION"),
            },
            misc: MiscSection {
                up_time: format!("{}s", uptime.as_secs_f64()),
            },
            backups,
        }
    }
}
