//! Gateway Module
//!
//! Turns a command name plus an ordered list of key/value pairs into calls
//! against the cache store or the backup manager.

mod batch;
mod command;
#[allow(clippy::module_inception)]
mod gateway;

pub use batch::{BatchResult, ItemError};
pub use command::{Command, CommandToggles};
pub use gateway::CommandGateway;
