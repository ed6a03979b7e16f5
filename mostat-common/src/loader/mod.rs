//! Plugin discovery by extension point
//!
//! A [`PluginRegistry`] lists the candidates registered under an extension
//! point name (e.g. `mostat.sensors`). [`load_classes`] materializes each one,
//! drops the ones that fail, and optionally keeps only plugins implementing a
//! required [`Capability`].
//!
//! Two registries are provided:
//! - [`StaticRegistry`]: factories registered in-process
//! - [`ManifestRegistry`]: a TOML file pointing at plugin shared libraries
//!
//! # Example
//!
//! ```no_run
//! use mostat_common::{ManifestRegistry, load_classes};
//! use mostat_plugin_api::Capability;
//!
//! let registry = ManifestRegistry::default_location();
//! for plugin in load_classes(&registry, "mostat.sensors", Some(Capability::Sensor)) {
//!     println!("{}", plugin.name());
//! }
//! ```

mod error;
mod manifest;
mod registry;

use std::fmt;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};

use libloading::Library;
use mostat_plugin_api::{Capability, Plugin};

pub use error::LoaderError;
pub use manifest::{EntryPointSpec, ManifestRegistry};
pub use registry::StaticRegistry;

type Materialize = dyn Fn() -> Result<LoadedPlugin, LoaderError> + Send + Sync;

/// A registered, not yet loaded plugin
pub struct PluginCandidate {
    name: String,
    materialize: Box<Materialize>,
}

impl PluginCandidate {
    pub fn new<F>(name: impl Into<String>, materialize: F) -> Self
    where
        F: Fn() -> Result<LoadedPlugin, LoaderError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            materialize: Box::new(materialize),
        }
    }

    /// Entry point name this candidate was registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Materialize the plugin. A panicking factory is reported as an error.
    pub fn load(&self) -> Result<LoadedPlugin, LoaderError> {
        let mut plugin = panic::catch_unwind(AssertUnwindSafe(|| (self.materialize)()))
            .unwrap_or_else(|_| {
                Err(LoaderError::Panicked {
                    name: self.name.clone(),
                })
            })?;
        plugin.name = self.name.clone();
        Ok(plugin)
    }
}

impl fmt::Debug for PluginCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCandidate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Lists the candidates registered under an extension point, in registry order
pub trait PluginRegistry {
    fn candidates(&self, extension_point: &str) -> Result<Vec<PluginCandidate>, LoaderError>;
}

/// A materialized plugin
pub struct LoadedPlugin {
    name: String,
    instance: Box<dyn Plugin>,
    /// Keep the library loaded; declared after `instance` so it is dropped last
    _library: Option<Library>,
}

impl LoadedPlugin {
    pub fn new(instance: Box<dyn Plugin>) -> Self {
        Self {
            name: instance.manifest().name,
            instance,
            _library: None,
        }
    }

    pub(crate) fn with_library(instance: Box<dyn Plugin>, library: Library) -> Self {
        Self {
            _library: Some(library),
            ..Self::new(instance)
        }
    }

    /// Entry point name the plugin was loaded from
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plugin(&self) -> &dyn Plugin {
        self.instance.as_ref()
    }
}

impl Deref for LoadedPlugin {
    type Target = dyn Plugin;

    fn deref(&self) -> &Self::Target {
        self.instance.as_ref()
    }
}

impl fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("name", &self.name)
            .field("manifest", &self.instance.manifest())
            .field("dynamic", &self._library.is_some())
            .finish()
    }
}

/// Load every plugin registered under `extension_point`.
///
/// Candidates that fail to load are logged and skipped. When `required` is
/// set, only plugins implementing that capability are returned. The result
/// keeps registry order. This function never fails; an unreadable registry
/// yields an empty list.
pub fn load_classes<R>(
    registry: &R,
    extension_point: &str,
    required: Option<Capability>,
) -> Vec<LoadedPlugin>
where
    R: PluginRegistry + ?Sized,
{
    tracing::debug!(entry_point = %extension_point, "Loading classes for entrypoint");

    let candidates = match registry.candidates(extension_point) {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::warn!(
                entry_point = %extension_point,
                error = %e,
                "Failed to enumerate entry points"
            );
            return Vec::new();
        }
    };

    let mut loaded = Vec::new();
    for candidate in candidates {
        tracing::debug!(candidate = %candidate.name(), "Trying to load class from entry point");
        match candidate.load() {
            Ok(plugin) => {
                if required.is_none_or(|cap| plugin.satisfies(cap)) {
                    loaded.push(plugin);
                } else {
                    tracing::debug!(
                        candidate = %candidate.name(),
                        capability = ?required,
                        "Plugin does not implement required capability"
                    );
                }
            }
            Err(e) => {
                tracing::debug!(
                    candidate = %candidate.name(),
                    error = %e,
                    "Exception raised when loading entry point"
                );
            }
        }
    }

    let names: Vec<&str> = loaded.iter().map(LoadedPlugin::name).collect();
    tracing::debug!(
        entry_point = %extension_point,
        count = loaded.len(),
        plugins = ?names,
        "Classes loaded successfully"
    );
    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use mostat_plugin_api::{PluginError, PluginManifest, Sensor, SensorReading};
    use std::collections::BTreeMap;

    struct Named(&'static str);

    impl Plugin for Named {
        fn manifest(&self) -> PluginManifest {
            PluginManifest {
                name: self.0.to_string(),
                ..Default::default()
            }
        }
    }

    struct Thermometer;

    impl Plugin for Thermometer {
        fn manifest(&self) -> PluginManifest {
            PluginManifest {
                name: "thermometer".to_string(),
                ..Default::default()
            }
        }

        fn as_sensor(&self) -> Option<&dyn Sensor> {
            Some(self)
        }
    }

    impl Sensor for Thermometer {
        fn sensors_present(&self) -> bool {
            true
        }

        fn read(&self) -> Result<BTreeMap<String, SensorReading>, PluginError> {
            Ok(BTreeMap::new())
        }
    }

    struct Unreadable;

    impl PluginRegistry for Unreadable {
        fn candidates(&self, _extension_point: &str) -> Result<Vec<PluginCandidate>, LoaderError> {
            Err(LoaderError::Registry {
                path: "registry.toml".into(),
                message: "expected table".to_string(),
            })
        }
    }

    #[test]
    fn test_candidate_load_sets_entry_point_name() {
        let candidate =
            PluginCandidate::new("ep1", || Ok(LoadedPlugin::new(Box::new(Named("EP1")))));
        let plugin = candidate.load().unwrap();
        assert_eq!(plugin.name(), "ep1");
        assert_eq!(plugin.manifest().name, "EP1");
    }

    #[test]
    fn test_candidate_load_catches_panic() {
        let candidate = PluginCandidate::new("bad", || panic!("driver missing"));
        assert!(matches!(
            candidate.load(),
            Err(LoaderError::Panicked { name }) if name == "bad"
        ));
    }

    #[test]
    fn test_loaded_plugin_derefs_to_plugin() {
        let plugin = LoadedPlugin::new(Box::new(Thermometer));
        assert!(plugin.as_sensor().is_some());
        assert!(plugin.satisfies(Capability::Sensor));
        assert!(!plugin.plugin().satisfies(Capability::IdentityProvider));
    }

    #[test]
    fn test_capabilities_through_plugin_handle() {
        let loaded = LoadedPlugin::new(Box::new(Thermometer));
        let handle = loaded.plugin();
        assert!(handle.satisfies(Capability::Sensor));
        assert_eq!(handle.capabilities(), vec![Capability::Sensor]);
    }

    #[test]
    fn test_load_classes_skips_failures_in_order() {
        let registry = StaticRegistry::new()
            .with("my.entrypoint", "ep1", || Ok(Box::new(Named("EP1"))))
            .with("my.entrypoint", "ep1", || Ok(Box::new(Named("EP2"))))
            .with("my.entrypoint", "ep3", || Ok(Box::new(Named("EP3"))))
            .with("my.entrypoint", "ep4", || Err(PluginError::custom("boom")));

        let loaded = load_classes(&registry, "my.entrypoint", None);
        let names: Vec<String> = loaded.iter().map(|p| p.manifest().name).collect();
        assert_eq!(names, vec!["EP1", "EP2", "EP3"]);
    }

    #[test]
    fn test_load_classes_filters_by_capability() {
        let registry = StaticRegistry::new()
            .with("mostat.sensors", "plain", || Ok(Box::new(Named("plain"))))
            .with("mostat.sensors", "thermo", || Ok(Box::new(Thermometer)));

        let loaded = load_classes(&registry, "mostat.sensors", Some(Capability::Sensor));
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name(), "thermo");
    }

    #[test]
    fn test_load_classes_unknown_extension_point_is_empty() {
        let registry = StaticRegistry::new().with("a", "x", || Ok(Box::new(Named("x"))));
        assert!(load_classes(&registry, "b", None).is_empty());
    }

    #[test]
    fn test_load_classes_unreadable_registry_is_empty() {
        assert!(load_classes(&Unreadable, "mostat.sensors", None).is_empty());
    }

    #[test]
    fn test_load_classes_accepts_trait_object() {
        let registry: Box<dyn PluginRegistry> =
            Box::new(StaticRegistry::new().with("a", "x", || Ok(Box::new(Named("x")))));
        assert_eq!(load_classes(registry.as_ref(), "a", None).len(), 1);
    }
}
