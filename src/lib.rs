//! Runtime state and object identity for a page-navigation framework.
//!
//! Framework code may be loaded many times in one process. Anything that
//! must outlive a single load lives behind the [`ports::Anchor`]:
//! the [`state::StateStore`] values and the identity-key bookkeeping in
//! [`identity`]. A [`context::Runtime`] is one load.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod execute;
pub mod identity;
pub mod ports;
pub mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use context::Runtime;
pub use error::{CallError, ConfigError};
pub use execute::{execute, execute_fallible, execute_optional};

/// Whether this is a debug build. Gates extra diagnostics.
pub const DEBUG: bool = cfg!(debug_assertions);

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "SPF_LOG";

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        // --help and --version land here too; they are not failures.
        Err(err) if !err.use_stderr() => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    init_logging(cli.verbose);
    commands::dispatch(&cli.command)
}

/// Installs a stderr `tracing` subscriber. Later calls are no-ops.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_executes_defaults() {
        let result = run(["spf", "defaults"]);
        assert!(result.is_ok());
    }

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["spf", "unknown"]);
        assert!(result.is_err());
    }
}
