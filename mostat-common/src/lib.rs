//! mostat-common - host identity and plugin discovery
//!
//! - [`SystemId`]: resolves a stable identifier for the host through an
//!   ordered chain of strategies, falling back to a random UUID
//! - [`load_classes`]: materializes the plugins registered under an extension
//!   point, skipping any that fail to load

pub mod loader;
pub mod system_id;

pub use loader::{
    EntryPointSpec, LoadedPlugin, LoaderError, ManifestRegistry, PluginCandidate, PluginRegistry,
    StaticRegistry, load_classes,
};
pub use system_id::{
    HardwareDescriptor, HardwareReader, IdSource, NodeSource, PluginIdentity, ProcCpuinfo, ResolvedId,
    Strategy, SysfsNodeSource, SystemId, SystemIdConfig, SystemIdError,
};
