//! Print the system ID of this host

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use mostat_common::{ManifestRegistry, ResolvedId, Strategy, SystemId, SystemIdConfig, load_classes};
use mostat_plugin_api::Capability;

use crate::config::ConfigLoader;

#[derive(Args)]
pub struct IdArgs {
    /// Strategy to try (repeatable, in order): raspberrypi_cpu, uuid_getnode, random_fallback
    #[arg(long = "strategy", value_name = "NAME")]
    pub strategies: Vec<Strategy>,

    /// Read the hardware description from this file instead of /proc/cpuinfo
    #[arg(long, value_name = "PATH")]
    pub cpuinfo: Option<PathBuf>,

    /// Try identity-provider plugins registered under this extension point first
    #[arg(long, value_name = "EXTENSION_POINT")]
    pub providers: Option<String>,

    /// Print the ID and the strategy that produced it as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: IdArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let mut resolver = SystemId::from_config(&apply_overrides(config.system_id, &args));

    if let Some(extension_point) = &args.providers {
        let registry = ManifestRegistry::at(&config.plugins.registry);
        let plugins = load_classes(&registry, extension_point, Some(Capability::IdentityProvider));
        tracing::debug!(count = plugins.len(), "Loaded identity provider plugins");
        resolver = resolver.with_plugin_providers(plugins);
    }

    println!("{}", render(&resolver.resolve(), args.json)?);
    Ok(())
}

/// Command-line flags win over the configured resolver settings
fn apply_overrides(mut config: SystemIdConfig, args: &IdArgs) -> SystemIdConfig {
    if !args.strategies.is_empty() {
        config.strategies = args.strategies.clone();
    }
    if let Some(path) = &args.cpuinfo {
        config.cpuinfo_path = path.clone();
    }
    config
}

fn render(resolved: &ResolvedId, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(resolved)?)
    } else {
        Ok(resolved.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mostat_common::IdSource;

    fn args() -> IdArgs {
        IdArgs {
            strategies: Vec::new(),
            cpuinfo: None,
            providers: None,
            json: false,
        }
    }

    #[test]
    fn test_no_flags_keeps_config() {
        let config = apply_overrides(SystemIdConfig::default(), &args());
        assert_eq!(config, SystemIdConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let args = IdArgs {
            strategies: vec![Strategy::UuidGetnode],
            cpuinfo: Some(PathBuf::from("/tmp/cpuinfo")),
            ..args()
        };
        let config = apply_overrides(SystemIdConfig::default(), &args);
        assert_eq!(config.strategies, vec![Strategy::UuidGetnode]);
        assert_eq!(config.cpuinfo_path, PathBuf::from("/tmp/cpuinfo"));
        assert_eq!(config.net_class_dir, PathBuf::from("/sys/class/net"));
    }

    #[test]
    fn test_render_plain_and_json() {
        let resolved = ResolvedId {
            value: "RaspberryPi/unknown_model/ae463475".to_string(),
            source: IdSource::Strategy("raspberrypi_cpu".to_string()),
        };

        assert_eq!(
            render(&resolved, false).unwrap(),
            "RaspberryPi/unknown_model/ae463475"
        );

        let json: serde_json::Value =
            serde_json::from_str(&render(&resolved, true).unwrap()).unwrap();
        assert_eq!(json["value"], "RaspberryPi/unknown_model/ae463475");
        assert_eq!(json["source"]["strategy"], "raspberrypi_cpu");
    }
}
