//! Backup Record Module

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Backup Record ==
/// A backup file in the backup directory.
///
/// Records order newest first by modification time; the file name breaks
/// ties so the order is total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    /// File name within the backup directory
    pub file_name: String,
    /// Last modification time of the file
    pub last_modified_time: DateTime<Utc>,
}

impl BackupRecord {
    pub fn new(file_name: impl Into<String>, last_modified_time: DateTime<Utc>) -> Self {
        Self {
            file_name: file_name.into(),
            last_modified_time,
        }
    }
}

impl Ord for BackupRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .last_modified_time
            .cmp(&self.last_modified_time)
            .then_with(|| other.file_name.cmp(&self.file_name))
    }
}

impl PartialOrd for BackupRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
