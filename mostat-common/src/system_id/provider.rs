//! Identity strategies backed by loaded plugins

use std::sync::Arc;

use mostat_plugin_api::{IdentityProvider, PluginError};

use super::Strategy;
use crate::loader::LoadedPlugin;

/// Owns a loaded plugin and forwards to its identity capability.
///
/// The provider reports the entry-point name the plugin was loaded under, so
/// provenance matches what `load_classes` logged.
#[derive(Debug)]
pub struct PluginIdentity {
    plugin: LoadedPlugin,
}

impl PluginIdentity {
    /// `None` when the plugin does not implement `IdentityProvider`
    pub fn new(plugin: LoadedPlugin) -> Option<Self> {
        if plugin.as_identity_provider().is_none() {
            tracing::debug!(plugin = %plugin.name(), "Plugin is not an identity provider");
            return None;
        }
        Some(Self { plugin })
    }

    pub fn plugin(&self) -> &LoadedPlugin {
        &self.plugin
    }
}

impl IdentityProvider for PluginIdentity {
    fn name(&self) -> &str {
        self.plugin.name()
    }

    fn system_id(&self) -> Result<Option<String>, PluginError> {
        match self.plugin.as_identity_provider() {
            Some(provider) => provider.system_id(),
            None => Ok(None),
        }
    }
}

impl Strategy {
    /// Wrap a loaded identity-provider plugin as a strategy
    pub fn from_plugin(plugin: LoadedPlugin) -> Option<Strategy> {
        PluginIdentity::new(plugin).map(|identity| Strategy::Provider(Arc::new(identity)))
    }
}
