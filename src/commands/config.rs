//! `spf config` command.

use std::path::Path;

use crate::config::{ConfigOverlay, CurrentConfig};

/// Execute the `config` command.
///
/// Loads the overlay from `file`, or from `SPF_CONFIG` when no file is
/// given, and prints the effective options.
///
/// # Errors
///
/// Returns an error string if the overlay cannot be loaded.
pub fn run(file: Option<&Path>) -> Result<(), String> {
    let current = load(file)?;
    let yaml = serde_yaml::to_string(&current.effective())
        .map_err(|e| format!("Failed to render config: {e}"))?;
    print!("{yaml}");
    Ok(())
}

fn load(file: Option<&Path>) -> Result<CurrentConfig, String> {
    let loaded = match file {
        Some(path) => ConfigOverlay::from_path(path).map(CurrentConfig::with_overlay),
        None => CurrentConfig::from_env(),
    };
    loaded.map_err(|e| e.to_string())
}
