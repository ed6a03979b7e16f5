//! Plugin metadata and capability types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Plugin manifest containing metadata about the plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin name
    pub name: String,
    /// Plugin version (semver)
    pub version: String,
    /// API version this plugin was built against
    pub api_version: u32,
    /// Human-readable description
    pub description: String,
    /// Plugin author
    pub author: String,
}

impl Default for PluginManifest {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: "0.0.1".to_string(),
            api_version: crate::API_VERSION,
            description: String::new(),
            author: String::new(),
        }
    }
}

/// An interface a loaded plugin can be required to implement.
///
/// A plugin satisfies a capability when the matching accessor on
/// [`Plugin`](crate::Plugin) returns a trait object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Implements [`Sensor`](crate::Sensor)
    Sensor,
    /// Implements [`IdentityProvider`](crate::IdentityProvider)
    IdentityProvider,
}

impl Capability {
    /// Every capability, in declaration order
    pub const ALL: [Capability; 2] = [Capability::Sensor, Capability::IdentityProvider];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Sensor => "sensor",
            Capability::IdentityProvider => "identity-provider",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown capability '{}'", s))
    }
}

/// A single reading reported by a sensor plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Kind of measurement (e.g. "temp", "humidity")
    pub kind: String,
    /// Measured value
    pub value: f64,
    /// Optional human-friendly name for the sensor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}
