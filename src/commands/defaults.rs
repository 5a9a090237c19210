//! `spf defaults` command.

use crate::config::Config;

/// Execute the `defaults` command.
///
/// # Errors
///
/// Returns an error string if the table cannot be rendered.
pub fn run() -> Result<(), String> {
    print!("{}", render()?);
    Ok(())
}

fn render() -> Result<String, String> {
    serde_yaml::to_string(&Config::default())
        .map_err(|e| format!("Failed to render defaults: {e}"))
}
