// Tab host platform paths
// Resolves per-user config and data directories for Windows, macOS and Linux
// through the `dirs` crate, with a local fallback when no home is known.

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "fennec-tabs";

/// Overrides the data directory, mainly for embedding hosts and tests.
pub const DATA_DIR_ENV: &str = "FENNEC_TABS_DATA_DIR";

/// Returns the configuration directory.
///
/// - **Linux**: `$XDG_CONFIG_HOME/fennec-tabs` or `~/.config/fennec-tabs`
/// - **macOS**: `~/Library/Application Support/fennec-tabs`
/// - **Windows**: `%APPDATA%\fennec-tabs`
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Returns the data directory, honouring [`DATA_DIR_ENV`] first.
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
