//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: fires due key expiries between requests
//! - Backup: writes a backup and applies retention at a fixed interval

mod backup;
mod expiry;

pub use backup::spawn_backup_task;
pub use expiry::spawn_expiry_task;
