//! 48-bit hardware node value, as used in RFC 4122 UUIDs

use std::fs;
use std::path::{Path, PathBuf};

use super::error::{Result, SystemIdError};

/// Prefix of identifiers derived from the node value
pub const NODE_PREFIX: &str = "uuid.getnode_";

/// Multicast bit of the first octet
const MULTICAST_BIT: u64 = 0x01 << 40;
/// Locally-administered bit of the first octet
const LOCAL_BIT: u64 = 0x02 << 40;

/// Format a node value as `uuid.getnode_` plus 12 lowercase hex digits
pub fn format_node(node: u64) -> String {
    format!("{}{:012x}", NODE_PREFIX, node)
}

/// Parse a colon-separated MAC address (`aa:bb:cc:dd:ee:ff`) into a node value
pub fn parse_hardware_address(value: &str) -> Option<u64> {
    let octets: Vec<&str> = value.trim().split(':').collect();
    if octets.len() != 6 {
        return None;
    }

    let mut node = 0u64;
    for octet in octets {
        if octet.len() != 2 || !octet.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        node = (node << 8) | u64::from(u8::from_str_radix(octet, 16).ok()?);
    }
    Some(node)
}

/// Source of the host's 48-bit hardware node value
pub trait NodeSource: Send + Sync {
    fn node(&self) -> Result<u64>;
}

/// Reads interface hardware addresses from sysfs (Linux only).
///
/// Interfaces are considered in name order. Universally administered
/// addresses win over locally administered ones; loopback, all-zero and
/// multicast addresses are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysfsNodeSource {
    net_class_dir: PathBuf,
}

impl SysfsNodeSource {
    pub const DEFAULT_DIR: &'static str = "/sys/class/net";

    pub fn at(net_class_dir: impl Into<PathBuf>) -> Self {
        Self {
            net_class_dir: net_class_dir.into(),
        }
    }

    pub fn net_class_dir(&self) -> &Path {
        &self.net_class_dir
    }

    /// Usable (interface, node) pairs, sorted by interface name
    fn candidates(&self) -> Result<Vec<(String, u64)>> {
        let mut found = Vec::new();

        for entry in fs::read_dir(&self.net_class_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name == "lo" {
                continue;
            }

            let Ok(raw) = fs::read_to_string(entry.path().join("address")) else {
                tracing::debug!(interface = %name, "No hardware address");
                continue;
            };
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            // Infiniband and similar links report longer addresses
            let Some(node) = parse_hardware_address(raw) else {
                tracing::debug!(interface = %name, address = %raw, "Not a 48-bit hardware address");
                continue;
            };
            if node == 0 || node & MULTICAST_BIT != 0 {
                continue;
            }
            found.push((name, node));
        }

        found.sort();
        Ok(found)
    }
}

impl Default for SysfsNodeSource {
    fn default() -> Self {
        Self::at(Self::DEFAULT_DIR)
    }
}

impl NodeSource for SysfsNodeSource {
    fn node(&self) -> Result<u64> {
        let candidates = self.candidates()?;

        let chosen = candidates
            .iter()
            .find(|(_, node)| node & LOCAL_BIT == 0)
            .or_else(|| candidates.first());

        match chosen {
            Some((interface, node)) => {
                tracing::debug!(interface = %interface, "Using hardware address for node value");
                Ok(*node)
            }
            None => Err(SystemIdError::NoHardwareAddress {
                dir: self.net_class_dir.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn add_interface(root: &Path, name: &str, address: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("address"), format!("{}\n", address)).unwrap();
    }

    #[test]
    fn test_format_node_known_value() {
        assert_eq!(format_node(163683361899416), "uuid.getnode_94de80a44398");
    }

    #[test]
    fn test_format_node_zero_pads() {
        assert_eq!(format_node(0x1), "uuid.getnode_000000000001");
    }

    #[test]
    fn test_parse_hardware_address() {
        assert_eq!(
            parse_hardware_address("94:de:80:a4:43:98"),
            Some(163683361899416)
        );
        assert_eq!(
            parse_hardware_address("94:DE:80:A4:43:98\n"),
            Some(163683361899416)
        );
    }

    #[test]
    fn test_parse_hardware_address_rejects_malformed() {
        assert_eq!(parse_hardware_address(""), None);
        assert_eq!(parse_hardware_address("94:de:80:a4:43"), None);
        assert_eq!(parse_hardware_address("94:de:80:a4:43:zz"), None);
        assert_eq!(parse_hardware_address("94:de:80:a4:43:398"), None);
        assert_eq!(parse_hardware_address("94:de:80:a4:43:+8"), None);
        assert_eq!(parse_hardware_address("94:de:80:a4:-3:98"), None);
    }

    #[test]
    fn test_sysfs_skips_loopback_and_zero() {
        let temp = TempDir::new().unwrap();
        add_interface(temp.path(), "lo", "00:00:00:00:00:00");
        add_interface(temp.path(), "dummy0", "00:00:00:00:00:00");
        add_interface(temp.path(), "eth0", "94:de:80:a4:43:98");

        let source = SysfsNodeSource::at(temp.path());
        assert_eq!(source.node().unwrap(), 163683361899416);
    }

    #[test]
    fn test_sysfs_prefers_universal_address() {
        let temp = TempDir::new().unwrap();
        add_interface(temp.path(), "docker0", "02:42:ac:11:00:01");
        add_interface(temp.path(), "wlan0", "b8:27:eb:12:34:56");

        let source = SysfsNodeSource::at(temp.path());
        assert_eq!(source.node().unwrap(), 0xb827eb123456);
    }

    #[test]
    fn test_sysfs_falls_back_to_local_address() {
        let temp = TempDir::new().unwrap();
        add_interface(temp.path(), "veth1", "02:42:ac:11:00:02");
        add_interface(temp.path(), "veth0", "02:42:ac:11:00:01");

        let source = SysfsNodeSource::at(temp.path());
        assert_eq!(source.node().unwrap(), 0x0242ac110001);
    }

    #[test]
    fn test_sysfs_no_interfaces_is_error() {
        let temp = TempDir::new().unwrap();
        add_interface(temp.path(), "lo", "00:00:00:00:00:00");

        let source = SysfsNodeSource::at(temp.path());
        assert!(matches!(
            source.node(),
            Err(SystemIdError::NoHardwareAddress { .. })
        ));
    }

    #[test]
    fn test_sysfs_missing_dir_is_error() {
        let source = SysfsNodeSource::at("/nonexistent/sys/class/net");
        assert!(matches!(source.node(), Err(SystemIdError::Io(_))));
    }

    #[test]
    fn test_sysfs_skips_non_ethernet_addresses() {
        let temp = TempDir::new().unwrap();
        add_interface(
            temp.path(),
            "ib0",
            "80:00:02:08:fe:80:00:00:00:00:00:00:00:02:c9:03:00:0a:bc:de",
        );
        add_interface(temp.path(), "eth0", "94:de:80:a4:43:98");

        let source = SysfsNodeSource::at(temp.path());
        assert_eq!(source.node().unwrap(), 163683361899416);
    }

    #[test]
    fn test_sysfs_only_malformed_addresses_is_error() {
        let temp = TempDir::new().unwrap();
        add_interface(temp.path(), "eth0", "not-a-mac");

        let source = SysfsNodeSource::at(temp.path());
        assert!(matches!(
            source.node(),
            Err(SystemIdError::NoHardwareAddress { .. })
        ));
    }
}
