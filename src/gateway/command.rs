//! Command names and the per-command enable switches.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Command ==
/// A logical operation exposed to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Ping,
    Set,
    Get,
    Del,
    Keys,
    Incr,
    Decr,
    Expire,
    Unexpire,
    Random,
    Stats,
    Backup,
    Restore,
    Dump,
    Flush,
}

impl Command {
    pub const ALL: [Command; 15] = [
        Command::Ping,
        Command::Set,
        Command::Get,
        Command::Del,
        Command::Keys,
        Command::Incr,
        Command::Decr,
        Command::Expire,
        Command::Unexpire,
        Command::Random,
        Command::Stats,
        Command::Backup,
        Command::Restore,
        Command::Dump,
        Command::Flush,
    ];

    /// Lowercase name, as used in request paths.
    pub fn name(self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::Set => "set",
            Command::Get => "get",
            Command::Del => "del",
            Command::Keys => "keys",
            Command::Incr => "incr",
            Command::Decr => "decr",
            Command::Expire => "expire",
            Command::Unexpire => "unexpire",
            Command::Random => "random",
            Command::Stats => "stats",
            Command::Backup => "backup",
            Command::Restore => "restore",
            Command::Dump => "dump",
            Command::Flush => "flush",
        }
    }

    /// Returns true if the command runs once per input item.
    pub fn is_batch(self) -> bool {
        matches!(
            self,
            Command::Set
                | Command::Get
                | Command::Del
                | Command::Incr
                | Command::Decr
                | Command::Expire
                | Command::Unexpire
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().to_ascii_uppercase())
    }
}

impl FromStr for Command {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().trim_start_matches('/');
        Command::ALL
            .into_iter()
            .find(|command| command.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CacheError::UnknownCommand(s.to_string()))
    }
}

// == Command Toggles ==
/// Administrative enable/disable switch per command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandToggles {
    disabled: HashSet<Command>,
}

impl CommandToggles {
    /// Every command enabled.
    pub fn all_enabled() -> Self {
        Self {
            disabled: HashSet::new(),
        }
    }

    pub fn enable(&mut self, command: Command) -> &mut Self {
        self.disabled.remove(&command);
        self
    }

    pub fn disable(&mut self, command: Command) -> &mut Self {
        self.disabled.insert(command);
        self
    }

    pub fn set_enabled(&mut self, command: Command, enabled: bool) -> &mut Self {
        if enabled {
            self.enable(command)
        } else {
            self.disable(command)
        }
    }

    pub fn is_enabled(&self, command: Command) -> bool {
        !self.disabled.contains(&command)
    }

    /// Fails with `DisabledCommand` if `command` is disabled.
    pub fn check(&self, command: Command) -> Result<()> {
        if self.is_enabled(command) {
            Ok(())
        } else {
            Err(CacheError::DisabledCommand(command.to_string()))
        }
    }
}

/// BACKUP and RESTORE are opt-in; everything else is enabled.
impl Default for CommandToggles {
    fn default() -> Self {
        let mut toggles = Self::all_enabled();
        toggles.disable(Command::Backup).disable(Command::Restore);
        toggles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_names() {
        assert_eq!("get".parse::<Command>().unwrap(), Command::Get);
        assert_eq!("UNEXPIRE".parse::<Command>().unwrap(), Command::Unexpire);
        assert_eq!("/flush".parse::<Command>().unwrap(), Command::Flush);
        assert!(matches!(
            "frobnicate".parse::<Command>(),
            Err(CacheError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_names_round_trip() {
        for command in Command::ALL {
            assert_eq!(command.name().parse::<Command>().unwrap(), command);
        }
    }

    #[test]
    fn test_display_is_uppercase() {
        assert_eq!(Command::Incr.to_string(), "INCR");
    }

    #[test]
    fn test_default_toggles() {
        let toggles = CommandToggles::default();
        assert!(!toggles.is_enabled(Command::Backup));
        assert!(!toggles.is_enabled(Command::Restore));
        assert!(toggles.is_enabled(Command::Get));
        assert!(toggles.check(Command::Set).is_ok());

        let err = toggles.check(Command::Backup).unwrap_err();
        assert_eq!(err.to_string(), "Command BACKUP is not enabled.");
    }

    #[test]
    fn test_set_enabled() {
        let mut toggles = CommandToggles::default();
        toggles
            .set_enabled(Command::Backup, true)
            .set_enabled(Command::Flush, false);

        assert!(toggles.is_enabled(Command::Backup));
        assert!(!toggles.is_enabled(Command::Flush));
    }
}
