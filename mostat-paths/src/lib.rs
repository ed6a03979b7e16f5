//! XDG Base Directory paths for mostat.
//!
//! The CLI and the plugin registry both resolve their files relative to the
//! XDG config directory so that a thermostat node and a workstation behave
//! the same way.

use std::path::PathBuf;

/// Get the mostat config directory.
///
/// Returns `$XDG_CONFIG_HOME/mostat` if set, otherwise `~/.config/mostat`.
///
/// # Examples
///
/// ```
/// use mostat_paths::config_dir;
///
/// let config = config_dir();
/// let registry = config.join("plugins").join("registry.toml");
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("mostat")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/mostat")
    } else {
        PathBuf::from(".config/mostat")
    }
}

/// Default location of the plugin entry-point registry.
pub fn plugin_registry_path() -> PathBuf {
    config_dir().join("plugins").join("registry.toml")
}
