//! mostat-plugin-api - Plugin API for mostat
//!
//! This crate provides the traits and types needed to write plugins that
//! mostat discovers through its entry-point registry. Plugins are native Rust
//! dynamic libraries (or in-process factories) that expose one or more
//! capabilities: reading sensors, or supplying a host identity.
//!
//! # Example
//!
//! ```ignore
//! use std::collections::BTreeMap;
//! use mostat_plugin_api::{
//!     Plugin, PluginError, PluginManifest, Sensor, SensorReading, export_plugin,
//! };
//!
//! #[derive(Default)]
//! pub struct Ds18b20;
//!
//! impl Plugin for Ds18b20 {
//!     fn manifest(&self) -> PluginManifest {
//!         PluginManifest {
//!             name: "ds18b20".to_string(),
//!             description: "1-wire temperature sensors".to_string(),
//!             ..Default::default()
//!         }
//!     }
//!
//!     fn as_sensor(&self) -> Option<&dyn Sensor> {
//!         Some(self)
//!     }
//! }
//!
//! impl Sensor for Ds18b20 {
//!     fn sensors_present(&self) -> bool {
//!         true
//!     }
//!
//!     fn read(&self) -> Result<BTreeMap<String, SensorReading>, PluginError> {
//!         Ok(BTreeMap::new())
//!     }
//! }
//!
//! export_plugin!(Ds18b20);
//! ```

use std::collections::BTreeMap;

pub mod error;
pub mod types;

pub use error::PluginError;
pub use types::*;

/// Current plugin API version. Plugins must match this exactly.
/// This is checked when a plugin is loaded from a dynamic library.
pub const API_VERSION: u32 = 1;

/// Symbol exported by [`export_plugin!`] returning [`API_VERSION`]
pub const API_VERSION_SYMBOL: &[u8] = b"_mostat_plugin_api_version";

/// Symbol exported by [`export_plugin!`] constructing the plugin
pub const CREATE_SYMBOL: &[u8] = b"_mostat_plugin_create";

/// The core plugin trait - implement this to create a mostat plugin.
///
/// Capability accessors default to `None`; a plugin opts into a capability by
/// returning itself as the matching trait object.
pub trait Plugin: Send + Sync {
    /// Return plugin metadata
    fn manifest(&self) -> PluginManifest;

    /// This plugin as a [`Sensor`], if it reads sensors
    fn as_sensor(&self) -> Option<&dyn Sensor> {
        None
    }

    /// This plugin as an [`IdentityProvider`], if it can identify the host
    fn as_identity_provider(&self) -> Option<&dyn IdentityProvider> {
        None
    }
}

impl<'a> dyn Plugin + 'a {
    /// Check whether this plugin implements the given capability
    pub fn satisfies(&self, capability: Capability) -> bool {
        match capability {
            Capability::Sensor => self.as_sensor().is_some(),
            Capability::IdentityProvider => self.as_identity_provider().is_some(),
        }
    }

    /// All capabilities this plugin implements
    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.satisfies(*c))
            .collect()
    }
}

/// A temperature/humidity sensor driver
pub trait Sensor: Send + Sync {
    /// Whether any sensor driven by this plugin is attached
    fn sensors_present(&self) -> bool;

    /// Read all attached sensors, keyed by a stable sensor identifier
    fn read(&self) -> Result<BTreeMap<String, SensorReading>, PluginError>;
}

/// A source of host identity, usable as a strategy in system ID resolution
pub trait IdentityProvider: Send + Sync {
    /// Short name used in logs and provenance
    fn name(&self) -> &str;

    /// The host identifier, or `None` if this provider does not apply here
    fn system_id(&self) -> Result<Option<String>, PluginError>;
}

/// Export a plugin type for dynamic loading.
///
/// This macro generates the C ABI entry points that mostat uses to load
/// plugins listed in its entry-point registry.
///
/// # Usage
///
/// ```ignore
/// mostat_plugin_api::export_plugin!(MyPlugin);
/// ```
///
/// # Generated Functions
///
/// - `_mostat_plugin_create()`: Creates a new plugin instance
/// - `_mostat_plugin_api_version()`: Returns the API version
#[macro_export]
macro_rules! export_plugin {
    ($plugin_type:ty) => {
        #[unsafe(no_mangle)]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn _mostat_plugin_create() -> *mut dyn $crate::Plugin {
            let plugin: Box<dyn $crate::Plugin> = Box::new(<$plugin_type>::default());
            Box::into_raw(plugin)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn _mostat_plugin_api_version() -> u32 {
            $crate::API_VERSION
        }
    };
}
