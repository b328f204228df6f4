//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::backup::BackupConfig;
use crate::gateway::{Command, CommandToggles};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Default expiry in milliseconds applied by SET; 0 disables it
    pub default_expiry_ms: u64,
    /// Expiry sweep interval in milliseconds
    pub expiry_sweep_interval_ms: u64,
    pub backup_automatic: bool,
    pub backup_interval_ms: u64,
    /// Number of backups kept on disk
    pub backup_count: usize,
    pub backup_directory: PathBuf,
    pub backup_load_on_startup: bool,
    pub api_backup_enabled: bool,
    pub api_restore_enabled: bool,
    /// Further commands disabled on top of BACKUP/RESTORE
    pub disabled_commands: Vec<Command>,
    pub extensions_enabled: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 7654)
    /// - `DEFAULT_EXPIRY_MS` - Default expiry for SET, 0 for none (default: 0)
    /// - `EXPIRY_SWEEP_INTERVAL_MS` - Expiry sweep frequency (default: 250)
    /// - `BACKUP_AUTOMATIC` - Periodic backups (default: true)
    /// - `BACKUP_INTERVAL_MS` - Periodic backup interval (default: 60000)
    /// - `BACKUP_COUNT` - Backups kept on disk (default: 5)
    /// - `BACKUP_DIRECTORY` - Backup directory (default: ./out)
    /// - `BACKUP_LOAD_ON_STARTUP` - Restore newest backup at startup (default: true)
    /// - `API_BACKUP_ENABLED` - Enable the BACKUP command (default: false)
    /// - `API_RESTORE_ENABLED` - Enable the RESTORE command (default: false)
    /// - `DISABLED_COMMANDS` - Comma-separated command names (default: empty)
    /// - `EXTENSIONS_ENABLED` - Serve extension routes (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_parse("SERVER_PORT").unwrap_or(defaults.server_port),
            default_expiry_ms: env_parse("DEFAULT_EXPIRY_MS")
                .unwrap_or(defaults.default_expiry_ms),
            expiry_sweep_interval_ms: env_parse("EXPIRY_SWEEP_INTERVAL_MS")
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.expiry_sweep_interval_ms),
            backup_automatic: env_bool("BACKUP_AUTOMATIC").unwrap_or(defaults.backup_automatic),
            backup_interval_ms: env_parse("BACKUP_INTERVAL_MS")
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.backup_interval_ms),
            backup_count: env_parse("BACKUP_COUNT").unwrap_or(defaults.backup_count),
            backup_directory: env::var("BACKUP_DIRECTORY")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.backup_directory),
            backup_load_on_startup: env_bool("BACKUP_LOAD_ON_STARTUP")
                .unwrap_or(defaults.backup_load_on_startup),
            api_backup_enabled: env_bool("API_BACKUP_ENABLED")
                .unwrap_or(defaults.api_backup_enabled),
            api_restore_enabled: env_bool("API_RESTORE_ENABLED")
                .unwrap_or(defaults.api_restore_enabled),
            disabled_commands: env::var("DISABLED_COMMANDS")
                .map(|list| parse_command_list(&list))
                .unwrap_or_default(),
            extensions_enabled: env_bool("EXTENSIONS_ENABLED")
                .unwrap_or(defaults.extensions_enabled),
        }
    }

    /// Default expiry applied by SET, if enabled.
    pub fn default_expiry(&self) -> Option<Duration> {
        (self.default_expiry_ms > 0).then(|| Duration::from_millis(self.default_expiry_ms))
    }

    pub fn expiry_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.expiry_sweep_interval_ms)
    }

    pub fn backup_config(&self) -> BackupConfig {
        BackupConfig {
            automatic: self.backup_automatic,
            interval: Duration::from_millis(self.backup_interval_ms),
            count: self.backup_count,
            directory: self.backup_directory.clone(),
            load_on_startup: self.backup_load_on_startup,
        }
    }

    pub fn command_toggles(&self) -> CommandToggles {
        let mut toggles = CommandToggles::all_enabled();
        toggles
            .set_enabled(Command::Backup, self.api_backup_enabled)
            .set_enabled(Command::Restore, self.api_restore_enabled);
        for command in &self.disabled_commands {
            toggles.disable(*command);
        }
        toggles
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 7654,
            default_expiry_ms: 0,
            expiry_sweep_interval_ms: 250,
            backup_automatic: true,
            backup_interval_ms: 60_000,
            backup_count: 5,
            backup_directory: PathBuf::from("./out"),
            backup_load_on_startup: true,
            api_backup_enabled: false,
            api_restore_enabled: false,
            disabled_commands: Vec::new(),
            extensions_enabled: true,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|v| parse_bool(&v))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parses a comma-separated list of command names, skipping unknown ones.
fn parse_command_list(list: &str) -> Vec<Command> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter_map(|name| match name.parse() {
            Ok(command) => Some(command),
            Err(e) => {
                warn!(error = %e, "Ignoring entry in DISABLED_COMMANDS");
                None
            }
        })
        .collect()
}
