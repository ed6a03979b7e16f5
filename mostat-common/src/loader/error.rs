//! Plugin loader error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while enumerating or materializing plugin candidates.
///
/// [`load_classes`](super::load_classes) logs these per candidate and never
/// returns them.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Registry file could not be read or written
    #[error("Registry IO error at {path}: {source}")]
    RegistryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry file is not valid TOML
    #[error("Registry error at {path}: {message}")]
    Registry { path: PathBuf, message: String },

    /// Failed to load dynamic library or resolve one of its symbols
    #[error("Failed to load plugin library: {0}")]
    LibraryLoad(#[from] libloading::Error),

    /// API version mismatch between mostat and plugin
    #[error("API version mismatch: mostat expects {expected}, plugin has {found}")]
    ApiVersionMismatch { expected: u32, found: u32 },

    /// Plugin factory returned an error
    #[error("Plugin initialization failed: {0}")]
    InitFailed(#[from] mostat_plugin_api::PluginError),

    /// Plugin factory panicked
    #[error("Plugin '{name}' panicked while loading")]
    Panicked { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_mismatch_display() {
        let err = LoaderError::ApiVersionMismatch {
            expected: 1,
            found: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("1"));
        assert!(msg.contains("2"));
    }

    #[test]
    fn test_registry_io_display() {
        let err = LoaderError::RegistryIo {
            path: PathBuf::from("/etc/mostat/registry.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/etc/mostat/registry.toml"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_panicked_display() {
        let err = LoaderError::Panicked {
            name: "dht22".to_string(),
        };
        assert!(err.to_string().contains("dht22"));
    }

    #[test]
    fn test_plugin_error_conversion() {
        let err: LoaderError = mostat_plugin_api::PluginError::config("no bus").into();
        assert!(matches!(err, LoaderError::InitFailed(_)));
    }
}
