use mostat_common::{Strategy, SystemIdConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawMostatConfig {
    #[serde(default)]
    pub system_id: RawSystemIdConfig,

    #[serde(default)]
    pub plugins: RawPluginsConfig,
}

/// System ID settings as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSystemIdConfig {
    /// Strategies to try, in order
    pub strategies: Option<Vec<Strategy>>,

    /// cpuinfo-format file to read
    pub cpuinfo_path: Option<PathBuf>,

    /// sysfs network class directory to read
    pub net_class_dir: Option<PathBuf>,
}

/// Plugin settings as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPluginsConfig {
    /// Entry-point registry file
    pub registry: Option<PathBuf>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Default)]
pub struct MostatConfig {
    pub system_id: SystemIdConfig,
    pub plugins: PluginsConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginsConfig {
    /// Entry-point registry file
    pub registry: PathBuf,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            registry: mostat_paths::plugin_registry_path(),
        }
    }
}
