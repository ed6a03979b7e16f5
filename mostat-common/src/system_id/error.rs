//! Error types for system ID strategies

use std::path::PathBuf;

use mostat_plugin_api::PluginError;

/// Failure of a single identity strategy.
///
/// These never escape [`SystemId::id_string`](super::SystemId::id_string);
/// they are logged and the next strategy is tried.
#[derive(Debug, thiserror::Error)]
pub enum SystemIdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid hardware description pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("No usable hardware address found under {dir}")]
    NoHardwareAddress { dir: PathBuf },

    #[error("Identity provider '{name}' failed: {source}")]
    Provider {
        name: String,
        #[source]
        source: PluginError,
    },

    #[error("Strategy '{strategy}' panicked")]
    Panicked { strategy: String },
}

pub type Result<T> = std::result::Result<T, SystemIdError>;
