//! Host identity resolution
//!
//! [`SystemId`] runs an ordered list of [`Strategy`] values and returns the
//! first identifier one of them produces:
//!
//! 1. `raspberrypi_cpu`: board model and CPU serial parsed from `/proc/cpuinfo`
//! 2. `uuid_getnode`: the 48-bit hardware address of a network interface
//!
//! A strategy that errors or panics counts as "no result". When every
//! strategy comes up empty a random UUID is returned, so resolution never
//! fails.
//!
//! # Example
//!
//! ```no_run
//! use mostat_common::{Strategy, SystemId};
//!
//! let mut resolver = SystemId::new();
//! resolver.strategies_mut().retain(|s| *s != Strategy::RaspberrypiCpu);
//! println!("{}", resolver.id_string());
//! ```

mod cpuinfo;
mod error;
mod node;
mod provider;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use mostat_plugin_api::IdentityProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::loader::LoadedPlugin;

pub use cpuinfo::{
    HardwareDescriptor, HardwareReader, ProcCpuinfo, RPI_FAMILY, RPI_HARDWARE, RPI_REVISIONS,
    rpi_model,
};
pub use error::{Result, SystemIdError};
pub use node::{NODE_PREFIX, NodeSource, SysfsNodeSource, format_node, parse_hardware_address};
pub use provider::PluginIdentity;

/// One method of deriving a host identifier
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    RaspberrypiCpu,
    UuidGetnode,
    RandomFallback,
    /// An externally supplied identity source
    #[serde(skip)]
    Provider(Arc<dyn IdentityProvider>),
}

impl Strategy {
    pub fn name(&self) -> &str {
        match self {
            Strategy::RaspberrypiCpu => "raspberrypi_cpu",
            Strategy::UuidGetnode => "uuid_getnode",
            Strategy::RandomFallback => "random_fallback",
            Strategy::Provider(provider) => provider.name(),
        }
    }

    /// The order used when nothing else is configured
    pub fn defaults() -> Vec<Strategy> {
        vec![Strategy::RaspberrypiCpu, Strategy::UuidGetnode]
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Provider(provider) => {
                f.debug_tuple("Provider").field(&provider.name()).finish()
            }
            other => f.write_str(other.name()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq for Strategy {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Strategy::RaspberrypiCpu, Strategy::RaspberrypiCpu)
            | (Strategy::UuidGetnode, Strategy::UuidGetnode)
            | (Strategy::RandomFallback, Strategy::RandomFallback) => true,
            (Strategy::Provider(a), Strategy::Provider(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "raspberrypi_cpu" => Ok(Strategy::RaspberrypiCpu),
            "uuid_getnode" => Ok(Strategy::UuidGetnode),
            "random_fallback" => Ok(Strategy::RandomFallback),
            other => Err(format!(
                "unknown strategy '{}' (expected raspberrypi_cpu, uuid_getnode or random_fallback)",
                other
            )),
        }
    }
}

/// Where a resolved identifier came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdSource {
    /// Derived from host facts by the named strategy
    Strategy(String),
    /// Freshly generated; different on every call
    Random,
}

/// An identifier together with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedId {
    pub value: String,
    pub source: IdSource,
}

impl ResolvedId {
    /// Whether the same host will produce the same value on the next run
    pub fn is_stable(&self) -> bool {
        !matches!(self.source, IdSource::Random)
    }
}

/// Resolver settings, usually loaded from the `[system_id]` config section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemIdConfig {
    /// Strategies to try, in order
    pub strategies: Vec<Strategy>,
    /// cpuinfo-format file read by `raspberrypi_cpu`
    pub cpuinfo_path: PathBuf,
    /// sysfs network class directory read by `uuid_getnode`
    pub net_class_dir: PathBuf,
}

impl Default for SystemIdConfig {
    fn default() -> Self {
        Self {
            strategies: Strategy::defaults(),
            cpuinfo_path: PathBuf::from(ProcCpuinfo::DEFAULT_PATH),
            net_class_dir: PathBuf::from(SysfsNodeSource::DEFAULT_DIR),
        }
    }
}

/// Determines a unique ID for the hardware this is running on
pub struct SystemId {
    strategies: Vec<Strategy>,
    hardware: Box<dyn HardwareReader>,
    node: Box<dyn NodeSource>,
}

impl Default for SystemId {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemId {
    /// Resolver reading `/proc/cpuinfo` and `/sys/class/net`, default order
    pub fn new() -> Self {
        Self {
            strategies: Strategy::defaults(),
            hardware: Box::new(ProcCpuinfo::default()),
            node: Box::new(SysfsNodeSource::default()),
        }
    }

    pub fn from_config(config: &SystemIdConfig) -> Self {
        Self {
            strategies: config.strategies.clone(),
            hardware: Box::new(ProcCpuinfo::at(&config.cpuinfo_path)),
            node: Box::new(SysfsNodeSource::at(&config.net_class_dir)),
        }
    }

    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_hardware_reader(mut self, reader: impl HardwareReader + 'static) -> Self {
        self.hardware = Box::new(reader);
        self
    }

    pub fn with_node_source(mut self, source: impl NodeSource + 'static) -> Self {
        self.node = Box::new(source);
        self
    }

    /// Try identity-provider plugins before the configured strategies.
    ///
    /// Plugins without the identity capability are ignored.
    pub fn with_plugin_providers(mut self, plugins: impl IntoIterator<Item = LoadedPlugin>) -> Self {
        let mut strategies: Vec<Strategy> =
            plugins.into_iter().filter_map(Strategy::from_plugin).collect();
        strategies.append(&mut self.strategies);
        self.strategies = strategies;
        self
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Add, remove or reorder strategies in place
    pub fn strategies_mut(&mut self) -> &mut Vec<Strategy> {
        &mut self.strategies
    }

    /// Find or generate the system ID string. Never fails.
    pub fn id_string(&self) -> String {
        self.resolve().value
    }

    /// Like [`id_string`](Self::id_string), also reporting which strategy
    /// produced the value.
    pub fn resolve(&self) -> ResolvedId {
        for strategy in &self.strategies {
            match self.run_isolated(strategy) {
                Ok(Some(value)) => {
                    tracing::debug!(strategy = %strategy, "Determined SystemID via method");
                    tracing::debug!(id = %value, "Host ID");
                    let source = match strategy {
                        Strategy::RandomFallback => IdSource::Random,
                        other => IdSource::Strategy(other.name().to_string()),
                    };
                    return ResolvedId { value, source };
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        strategy = %strategy,
                        error = %e,
                        "Exception encountered when trying to determine system ID"
                    );
                }
            }
        }

        let value = self.random_fallback();
        tracing::debug!(strategy = "random_fallback", "Determined SystemID via method");
        tracing::debug!(id = %value, "Host ID");
        ResolvedId {
            value,
            source: IdSource::Random,
        }
    }

    /// If this is a Raspberry Pi, its model and CPU serial number
    pub fn raspberrypi_cpu(&self) -> Result<Option<String>> {
        let text = self.hardware.read_description()?;
        Ok(HardwareDescriptor::parse(&text)?.raspberry_pi_id())
    }

    /// The hardware node value, formatted as `uuid.getnode_<12 hex digits>`
    pub fn uuid_getnode(&self) -> Result<Option<String>> {
        Ok(Some(format_node(self.node.node()?)))
    }

    /// A random UUID as 32 hex digits. Used when no other method succeeds.
    pub fn random_fallback(&self) -> String {
        tracing::warn!("Could not determine system ID with any concrete method; using a random UUID.");
        Uuid::new_v4().simple().to_string()
    }

    fn run(&self, strategy: &Strategy) -> Result<Option<String>> {
        match strategy {
            Strategy::RaspberrypiCpu => self.raspberrypi_cpu(),
            Strategy::UuidGetnode => self.uuid_getnode(),
            Strategy::RandomFallback => Ok(Some(self.random_fallback())),
            Strategy::Provider(provider) => {
                provider
                    .system_id()
                    .map_err(|source| SystemIdError::Provider {
                        name: provider.name().to_string(),
                        source,
                    })
            }
        }
    }

    fn run_isolated(&self, strategy: &Strategy) -> Result<Option<String>> {
        panic::catch_unwind(AssertUnwindSafe(|| self.run(strategy))).unwrap_or_else(|_| {
            Err(SystemIdError::Panicked {
                strategy: strategy.name().to_string(),
            })
        })
    }
}
