//! HAT Identity - An example identity plugin for mostat
//!
//! Raspberry Pi HATs carry an EEPROM whose product name and UUID the kernel
//! exposes under `/proc/device-tree/hat`. This plugin turns them into a host
//! identifier of the form `HAT/<product>/<uuid>`, which survives SD card moves
//! between boards that share a HAT.
//!
//! Set `MOSTAT_HAT_DIR` to read a different directory.
//!
//! ## Building
//!
//! ```bash
//! cargo build --release
//! ```
//!
//! ## Installing
//!
//! ```bash
//! mostat plugins register mostat.identity hat \
//!     "$PWD/target/release/libmostat_hat_identity.so"
//! mostat id --providers mostat.identity
//! ```

use std::io::ErrorKind;
use std::path::PathBuf;

use mostat_plugin_api::{IdentityProvider, Plugin, PluginError, PluginManifest, export_plugin};

const DEFAULT_HAT_DIR: &str = "/proc/device-tree/hat";

/// Reads the HAT EEPROM fields from device tree
pub struct HatIdentity {
    hat_dir: PathBuf,
}

impl Default for HatIdentity {
    fn default() -> Self {
        let hat_dir = std::env::var_os("MOSTAT_HAT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HAT_DIR));
        Self { hat_dir }
    }
}

impl HatIdentity {
    /// A device-tree string property; values are NUL-terminated
    fn property(&self, name: &str) -> Result<Option<String>, PluginError> {
        match std::fs::read_to_string(self.hat_dir.join(name)) {
            Ok(raw) => {
                let value = raw.trim_end_matches('\0').trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Plugin for HatIdentity {
    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            name: "hat-identity".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Host ID from a Raspberry Pi HAT EEPROM".to_string(),
            author: "mostat".to_string(),
            ..Default::default()
        }
    }

    fn as_identity_provider(&self) -> Option<&dyn IdentityProvider> {
        Some(self)
    }
}

impl IdentityProvider for HatIdentity {
    fn name(&self) -> &str {
        "hat_identity"
    }

    fn system_id(&self) -> Result<Option<String>, PluginError> {
        let Some(uuid) = self.property("uuid")? else {
            return Ok(None);
        };
        let product = self
            .property("product")?
            .unwrap_or_else(|| "unknown_product".to_string());
        Ok(Some(format!("HAT/{}/{}", product, uuid)))
    }
}

export_plugin!(HatIdentity);
