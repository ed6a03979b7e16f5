//! In-process plugin registry

use std::collections::HashMap;
use std::sync::Arc;

use mostat_plugin_api::{Plugin, PluginError};

use super::{LoadedPlugin, LoaderError, PluginCandidate, PluginRegistry};

type Factory = Arc<dyn Fn() -> Result<Box<dyn Plugin>, PluginError> + Send + Sync>;

/// Registry of plugin factories compiled into the binary.
///
/// Candidates are returned in registration order. Registering the same name
/// twice under one extension point keeps both entries.
#[derive(Clone, Default)]
pub struct StaticRegistry {
    entry_points: HashMap<String, Vec<(String, Factory)>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under an extension point
    pub fn register<F>(&mut self, extension_point: &str, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn Plugin>, PluginError> + Send + Sync + 'static,
    {
        self.entry_points
            .entry(extension_point.to_string())
            .or_default()
            .push((name.to_string(), Arc::new(factory)));
        self
    }

    /// Builder form of [`register`](Self::register)
    pub fn with<F>(mut self, extension_point: &str, name: &str, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Plugin>, PluginError> + Send + Sync + 'static,
    {
        self.register(extension_point, name, factory);
        self
    }

    /// Names registered under an extension point, in order
    pub fn names(&self, extension_point: &str) -> Vec<&str> {
        self.entry_points
            .get(extension_point)
            .map(|entries| entries.iter().map(|(name, _)| name.as_str()).collect())
            .unwrap_or_default()
    }
}

impl PluginRegistry for StaticRegistry {
    fn candidates(&self, extension_point: &str) -> Result<Vec<PluginCandidate>, LoaderError> {
        let Some(entries) = self.entry_points.get(extension_point) else {
            return Ok(Vec::new());
        };

        Ok(entries
            .iter()
            .map(|(name, factory)| {
                let factory = Arc::clone(factory);
                PluginCandidate::new(name.clone(), move || {
                    Ok(LoadedPlugin::new(factory()?))
                })
            })
            .collect())
    }
}
