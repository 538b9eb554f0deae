pub mod dispatcher;
pub mod handler;
pub mod registry;

use crate::providers::Usage;
use std::path::PathBuf;

pub use dispatcher::create_command_registry;

/// Session state that slash commands may read or change.
///
/// The conversation itself is handed to commands read-only.
pub struct ChatState {
    pub model: String,
    pub usage: Usage,
    pub history_dir: PathBuf,
    pub should_continue: bool,
}

impl ChatState {
    pub fn new(model: &str, history_dir: PathBuf) -> Self {
        Self {
            model: model.to_string(),
            usage: Usage::default(),
            history_dir,
            should_continue: true,
        }
    }
}

/// Splits `/name arg1 arg2` into the command name and its arguments.
pub fn parse_command(line: &str) -> Option<(&str, Vec<&str>)> {
    let rest = line.trim().strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?;
    Some((name, parts.collect()))
}
