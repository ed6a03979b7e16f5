//! Plugin registry commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use mostat_common::{EntryPointSpec, LoadedPlugin, ManifestRegistry, load_classes};
use mostat_plugin_api::Capability;

use crate::config::ConfigLoader;

#[derive(Args)]
pub struct PluginsArgs {
    /// Registry file to use instead of the configured one
    #[arg(long, value_name = "PATH", global = true)]
    pub registry: Option<PathBuf>,

    #[command(subcommand)]
    pub command: PluginsCommands,
}

#[derive(Subcommand)]
pub enum PluginsCommands {
    /// Load and list plugins registered under an extension point
    List {
        /// Extension point name, e.g. mostat.sensors
        extension_point: String,

        /// Only list plugins implementing this capability (sensor, identity-provider)
        #[arg(long, value_name = "CAPABILITY")]
        capability: Option<Capability>,
    },
    /// Register a plugin library under an extension point
    Register {
        /// Extension point name
        extension_point: String,
        /// Entry-point name for the plugin
        name: String,
        /// Shared library built with export_plugin!
        library: PathBuf,
    },
    /// Remove a plugin from an extension point
    Unregister {
        /// Extension point name
        extension_point: String,
        /// Entry-point name to remove
        name: String,
    },
}

pub fn run(args: PluginsArgs) -> Result<()> {
    let registry = ManifestRegistry::at(resolve_registry_path(args.registry)?);

    match args.command {
        PluginsCommands::List {
            extension_point,
            capability,
        } => list_plugins(&registry, &extension_point, capability),
        PluginsCommands::Register {
            extension_point,
            name,
            library,
        } => register_plugin(&registry, &extension_point, name, library),
        PluginsCommands::Unregister {
            extension_point,
            name,
        } => unregister_plugin(&registry, &extension_point, &name),
    }
}

/// The `--registry` flag, else the configured registry
pub fn resolve_registry_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    match flag {
        Some(path) => Ok(path),
        None => Ok(ConfigLoader::load()?.plugins.registry),
    }
}

fn list_plugins(
    registry: &ManifestRegistry,
    extension_point: &str,
    capability: Option<Capability>,
) -> Result<()> {
    let plugins = load_classes(registry, extension_point, capability);
    if plugins.is_empty() {
        println!("No plugins loaded for {}", extension_point);
        println!();
        println!("Registry: {}", registry.path().display());
        println!("Run with --verbose to see why registered plugins were skipped.");
        return Ok(());
    }

    for plugin in &plugins {
        println!("{}", describe(plugin));
    }
    Ok(())
}

fn register_plugin(
    registry: &ManifestRegistry,
    extension_point: &str,
    name: String,
    library: PathBuf,
) -> Result<()> {
    let exists = registry
        .entries(extension_point)?
        .iter()
        .any(|e| e.name == name);
    if exists {
        bail!(
            "'{}' is already registered under {}; unregister it first",
            name,
            extension_point
        );
    }

    let library = absolute_library(&library)?;
    registry
        .register(
            extension_point,
            EntryPointSpec {
                name: name.clone(),
                library: library.clone(),
            },
        )
        .with_context(|| format!("Failed to update {}", registry.path().display()))?;

    println!("Registered {} under {}: {}", name, extension_point, library.display());
    println!(
        "Run 'mostat plugins list {}' to verify the plugin loads correctly.",
        extension_point
    );
    Ok(())
}

/// Libraries given relative to the working directory are stored absolute
fn absolute_library(library: &Path) -> Result<PathBuf> {
    if library.is_absolute() {
        return Ok(library.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(library))
}

fn unregister_plugin(registry: &ManifestRegistry, extension_point: &str, name: &str) -> Result<()> {
    if !registry.unregister(extension_point, name)? {
        bail!("'{}' is not registered under {}", name, extension_point);
    }
    println!("Unregistered {} from {}", name, extension_point);
    Ok(())
}

fn describe(plugin: &LoadedPlugin) -> String {
    let manifest = plugin.manifest();
    let description = if manifest.description.is_empty() {
        "No description".to_string()
    } else {
        manifest.description
    };
    let capabilities: Vec<&str> = plugin
        .capabilities()
        .into_iter()
        .map(|c| c.as_str())
        .collect();

    format!(
        "{} v{}    {}    [{}]",
        plugin.name(),
        manifest.version,
        description,
        capabilities.join(", ")
    )
}
