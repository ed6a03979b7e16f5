use super::types::{
    MostatConfig, PluginsConfig, RawMostatConfig, RawPluginsConfig, RawSystemIdConfig,
};
use anyhow::{Context, Result};
use mostat_common::SystemIdConfig;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<MostatConfig> {
        let mut raw = RawMostatConfig::default();

        // Later layers override earlier ones
        for (_, path) in Self::layers() {
            if let Some(layer) = Self::read_raw(&path)? {
                raw = Self::merge_raw(raw, layer);
            }
        }

        // Convert to final config with defaults applied
        Ok(Self::finalize(raw))
    }

    /// Config files in merge order: user, then project
    pub fn layers() -> [(&'static str, PathBuf); 2] {
        [
            ("user", Self::user_config_path()),
            ("project", Self::project_config_path()),
        ]
    }

    /// Get user config path (`$XDG_CONFIG_HOME/mostat/config.toml`)
    pub fn user_config_path() -> PathBuf {
        mostat_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with MOSTAT_PROJECT_CONFIG_DIR env var (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("MOSTAT_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".mostat/config.toml")
        }
    }

    /// Parse a config file; a missing file is not an error
    fn read_raw(path: &Path) -> Result<Option<RawMostatConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        tracing::debug!(path = %path.display(), "Reading config file");
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: RawMostatConfig = toml::from_str(&contents)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(Some(config))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawMostatConfig, overlay: RawMostatConfig) -> RawMostatConfig {
        RawMostatConfig {
            system_id: RawSystemIdConfig {
                strategies: overlay.system_id.strategies.or(base.system_id.strategies),
                cpuinfo_path: overlay.system_id.cpuinfo_path.or(base.system_id.cpuinfo_path),
                net_class_dir: overlay
                    .system_id
                    .net_class_dir
                    .or(base.system_id.net_class_dir),
            },
            plugins: RawPluginsConfig {
                registry: overlay.plugins.registry.or(base.plugins.registry),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawMostatConfig) -> MostatConfig {
        let defaults = SystemIdConfig::default();
        MostatConfig {
            system_id: SystemIdConfig {
                strategies: raw.system_id.strategies.unwrap_or(defaults.strategies),
                cpuinfo_path: raw.system_id.cpuinfo_path.unwrap_or(defaults.cpuinfo_path),
                net_class_dir: raw.system_id.net_class_dir.unwrap_or(defaults.net_class_dir),
            },
            plugins: match raw.plugins.registry {
                Some(registry) => PluginsConfig { registry },
                None => PluginsConfig::default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mostat_common::Strategy;
    use tempfile::TempDir;

    fn parse(toml_str: &str) -> RawMostatConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_read_raw_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        assert!(ConfigLoader::read_raw(&path).unwrap().is_none());
    }

    #[test]
    fn test_read_raw_parses_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[plugins]\nregistry = \"/etc/mostat/registry.toml\"\n").unwrap();

        let raw = ConfigLoader::read_raw(&path).unwrap().unwrap();
        assert_eq!(
            raw.plugins.registry,
            Some(PathBuf::from("/etc/mostat/registry.toml"))
        );
    }

    #[test]
    fn test_read_raw_invalid_file_names_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[system_id\n").unwrap();

        let err = ConfigLoader::read_raw(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_merge_overlay_wins_when_set() {
        let base = parse(
            r#"
[system_id]
strategies = ["raspberrypi_cpu"]
cpuinfo_path = "/base/cpuinfo"

[plugins]
registry = "/base/registry.toml"
"#,
        );
        let overlay = parse(
            r#"
[system_id]
strategies = ["uuid_getnode", "random_fallback"]
"#,
        );

        let merged = ConfigLoader::merge_raw(base, overlay);
        assert_eq!(
            merged.system_id.strategies,
            Some(vec![Strategy::UuidGetnode, Strategy::RandomFallback])
        );
        assert_eq!(
            merged.system_id.cpuinfo_path,
            Some(PathBuf::from("/base/cpuinfo"))
        );
        assert_eq!(
            merged.plugins.registry,
            Some(PathBuf::from("/base/registry.toml"))
        );
    }

    #[test]
    fn test_merge_empty_overlay_keeps_base() {
        let base = parse("[system_id]\nnet_class_dir = \"/tmp/net\"\n");
        let merged = ConfigLoader::merge_raw(base, RawMostatConfig::default());
        assert_eq!(
            merged.system_id.net_class_dir,
            Some(PathBuf::from("/tmp/net"))
        );
    }

    #[test]
    fn test_finalize_applies_defaults() {
        let config = ConfigLoader::finalize(RawMostatConfig::default());
        assert_eq!(config.system_id, SystemIdConfig::default());
        assert!(config.plugins.registry.ends_with("plugins/registry.toml"));
    }

    #[test]
    fn test_finalize_keeps_explicit_values() {
        let raw = parse(
            r#"
[system_id]
strategies = []
cpuinfo_path = "/tmp/cpuinfo"

[plugins]
registry = "/tmp/registry.toml"
"#,
        );

        let config = ConfigLoader::finalize(raw);
        assert!(config.system_id.strategies.is_empty());
        assert_eq!(config.system_id.cpuinfo_path, PathBuf::from("/tmp/cpuinfo"));
        assert_eq!(
            config.system_id.net_class_dir,
            PathBuf::from("/sys/class/net")
        );
        assert_eq!(config.plugins.registry, PathBuf::from("/tmp/registry.toml"));
    }

    #[test]
    fn test_layers_are_user_then_project() {
        let [(first, user), (second, project)] = ConfigLoader::layers();
        assert_eq!(first, "user");
        assert_eq!(second, "project");
        assert_eq!(user, ConfigLoader::user_config_path());
        assert_eq!(project, ConfigLoader::project_config_path());
    }

    #[test]
    fn test_user_config_path_is_in_config_dir() {
        assert!(ConfigLoader::user_config_path().ends_with("mostat/config.toml"));
    }
}
