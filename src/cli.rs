//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `spf`.
#[derive(Debug, Parser)]
#[command(name = "spf", version, about = "Inspect framework options and identity keys")]
pub struct Cli {
    /// Log at debug level (overridden by `SPF_LOG`).
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the defaults table as YAML.
    Defaults,
    /// Print the effective options after applying an overlay file.
    Config {
        /// Overlay file; falls back to `SPF_CONFIG`.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Mint identity keys across simulated framework reloads.
    Keys {
        /// Keys minted per load.
        #[arg(short, long, default_value_t = 3)]
        count: u32,
        /// Number of framework loads.
        #[arg(short, long, default_value_t = 1)]
        reloads: u32,
    },
}
