//! Command dispatch and handlers.

pub mod config;
pub mod defaults;
pub mod keys;

use crate::cli::Command;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Defaults => defaults::run(),
        Command::Config { file } => config::run(file.as_deref()),
        Command::Keys { count, reloads } => keys::run(*count, *reloads),
    }
}
