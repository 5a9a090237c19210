//! Error types for the runtime core.

use std::path::PathBuf;

use thiserror::Error;

/// A failure raised by a caller-supplied callback and caught at the
/// protected-call boundary.
///
/// Panics and `Err` returns are folded into this one shape; callers branch
/// on `Ok`/`Err`, never on the kind of failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("callback failed: {message}")]
pub struct CallError {
    /// Human-readable description taken from the panic payload or error.
    pub message: String,
}

impl CallError {
    /// Creates an error carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Errors from reading configuration overlays.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration document is not valid YAML for the options table.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}
