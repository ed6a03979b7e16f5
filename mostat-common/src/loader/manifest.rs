//! File-backed plugin registry
//!
//! Stored as TOML, by default in `~/.config/mostat/plugins/registry.toml`:
//!
//! ```toml
//! [[entry_points."mostat.sensors"]]
//! name = "ds18b20"
//! library = "ds18b20/libmostat_ds18b20.so"
//! ```
//!
//! Relative library paths are resolved against the registry file's directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use libloading::Library;
use mostat_plugin_api::{API_VERSION, API_VERSION_SYMBOL, CREATE_SYMBOL, Plugin};
use serde::{Deserialize, Serialize};

use super::{LoadedPlugin, LoaderError, PluginCandidate, PluginRegistry};

/// One registered plugin library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointSpec {
    pub name: String,
    pub library: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    entry_points: BTreeMap<String, Vec<EntryPointSpec>>,
}

/// Registry of plugin shared libraries described by a TOML file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRegistry {
    path: PathBuf,
}

impl ManifestRegistry {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Registry in the user's mostat config directory
    pub fn default_location() -> Self {
        Self::at(mostat_paths::plugin_registry_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries registered under an extension point, in file order.
    ///
    /// A missing registry file has no entries.
    pub fn entries(&self, extension_point: &str) -> Result<Vec<EntryPointSpec>, LoaderError> {
        let mut file = self.read()?;
        Ok(file.entry_points.remove(extension_point).unwrap_or_default())
    }

    /// Append an entry under an extension point and save the file
    pub fn register(&self, extension_point: &str, spec: EntryPointSpec) -> Result<(), LoaderError> {
        let mut file = self.read()?;
        file.entry_points
            .entry(extension_point.to_string())
            .or_default()
            .push(spec);
        self.write(&file)
    }

    /// Remove every entry with `name` under an extension point.
    ///
    /// Returns whether anything was removed.
    pub fn unregister(&self, extension_point: &str, name: &str) -> Result<bool, LoaderError> {
        let mut file = self.read()?;
        let Some(entries) = file.entry_points.get_mut(extension_point) else {
            return Ok(false);
        };

        let before = entries.len();
        entries.retain(|e| e.name != name);
        let removed = entries.len() != before;
        if entries.is_empty() {
            file.entry_points.remove(extension_point);
        }
        if removed {
            self.write(&file)?;
        }
        Ok(removed)
    }

    fn resolve_library(&self, library: &Path) -> PathBuf {
        if library.is_absolute() {
            return library.to_path_buf();
        }
        match self.path.parent() {
            Some(dir) => dir.join(library),
            None => library.to_path_buf(),
        }
    }

    fn read(&self) -> Result<RegistryFile, LoaderError> {
        if !self.path.exists() {
            return Ok(RegistryFile::default());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| LoaderError::RegistryIo {
            path: self.path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| LoaderError::Registry {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn write(&self, file: &RegistryFile) -> Result<(), LoaderError> {
        let content = toml::to_string_pretty(file).map_err(|e| LoaderError::Registry {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        let io_err = |source| LoaderError::RegistryIo {
            path: self.path.clone(),
            source,
        };

        // Create parent directory if it doesn't exist
        if let Some(parent) = self.path.parent().filter(|p| !p.exists()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        std::fs::write(&self.path, content).map_err(io_err)
    }
}

impl PluginRegistry for ManifestRegistry {
    fn candidates(&self, extension_point: &str) -> Result<Vec<PluginCandidate>, LoaderError> {
        Ok(self
            .entries(extension_point)?
            .into_iter()
            .map(|spec| {
                let library = self.resolve_library(&spec.library);
                PluginCandidate::new(spec.name, move || load_library(&library))
            })
            .collect())
    }
}

/// Open a plugin library and construct its plugin
fn load_library(path: &Path) -> Result<LoadedPlugin, LoaderError> {
    tracing::debug!(library = %path.display(), "Loading plugin library");

    // SAFETY: the library was registered explicitly by the user and is
    // expected to be built with `export_plugin!`.
    let library = unsafe { Library::new(path)? };

    let found = {
        // SAFETY: symbol signature is fixed by `export_plugin!`.
        let api_version_fn: libloading::Symbol<extern "C" fn() -> u32> =
            unsafe { library.get(API_VERSION_SYMBOL)? };
        api_version_fn()
    };
    check_api_version(found)?;

    let instance = {
        // SAFETY: the create function returns a pointer obtained from
        // `Box::into_raw`, which we take back ownership of exactly once.
        let create_fn: libloading::Symbol<extern "C" fn() -> *mut dyn Plugin> =
            unsafe { library.get(CREATE_SYMBOL)? };
        unsafe { Box::from_raw(create_fn()) }
    };

    Ok(LoadedPlugin::with_library(instance, library))
}

fn check_api_version(found: u32) -> Result<(), LoaderError> {
    if found != API_VERSION {
        return Err(LoaderError::ApiVersionMismatch {
            expected: API_VERSION,
            found,
        });
    }
    Ok(())
}
