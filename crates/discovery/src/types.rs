//! Core types for cluster discovery.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::DiscoveryError;

/// Stable identifier of a cluster peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Kind of service a node may run, each bound to a port on that node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Discovery,
    Replication,
    Storage,
    Tablet,
    Log,
    Management,
}

impl ModuleType {
    pub const ALL: [ModuleType; 6] = [
        Self::Discovery,
        Self::Replication,
        Self::Storage,
        Self::Tablet,
        Self::Log,
        Self::Management,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Replication => "replication",
            Self::Storage => "storage",
            Self::Tablet => "tablet",
            Self::Log => "log",
            Self::Management => "management",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleType {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DiscoveryError::UnknownModuleType(s.to_string()))
    }
}

/// One module advertised in a beacon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub module: ModuleType,
    pub port: u16,
}

/// Liveness descriptor carried by a beacon
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// Addresses the peer can be reached on
    #[serde(default)]
    pub addresses: Vec<String>,

    /// Raw module list, in the order the peer sent it
    #[serde(default, deserialize_with = "known_modules")]
    pub modules: Vec<ModuleDescriptor>,
}

/// Decode a module list, skipping descriptors whose module this build does
/// not know. A peer running a newer build still joins the table.
fn known_modules<'de, D>(deserializer: D) -> Result<Vec<ModuleDescriptor>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct WireDescriptor {
        module: String,
        port: u16,
    }

    let raw = Vec::<WireDescriptor>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|d| match d.module.parse::<ModuleType>() {
            Ok(module) => Some(ModuleDescriptor { module, port: d.port }),
            Err(_) => {
                tracing::debug!(module = %d.module, port = d.port, "Skipping unknown module");
                None
            }
        })
        .collect())
}

/// Last known state of a peer.
///
/// Never mutated once built. Any change to a node produces a new `NodeInfo`,
/// so holders of an `Arc<NodeInfo>` always see one beacon's content.
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    availability: Availability,
    /// Receipt time of the beacon, unix epoch milliseconds
    last_contact_time: i64,
    modules: HashMap<ModuleType, u16>,
}

impl NodeInfo {
    /// Build a `NodeInfo` stamped with the current time
    pub fn new(availability: Availability) -> Self {
        Self::with_contact_time(availability, chrono::Utc::now().timestamp_millis())
    }

    /// Build a `NodeInfo` with an explicit contact time.
    ///
    /// Duplicate module entries resolve to the last one in the list.
    pub fn with_contact_time(availability: Availability, last_contact_time: i64) -> Self {
        let modules = availability
            .modules
            .iter()
            .map(|d| (d.module, d.port))
            .collect();

        Self {
            availability,
            last_contact_time,
            modules,
        }
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    pub fn addresses(&self) -> &[String] {
        &self.availability.addresses
    }

    pub fn last_contact_time(&self) -> i64 {
        self.last_contact_time
    }

    pub fn modules(&self) -> &HashMap<ModuleType, u16> {
        &self.modules
    }

    /// Port for `module`, if this node advertises it
    pub fn port_of(&self, module: ModuleType) -> Option<u16> {
        self.modules.get(&module).copied()
    }
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} last contact: {}",
            self.availability, self.last_contact_time
        )
    }
}

/// Point query input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfoRequest {
    pub node_id: NodeId,
    pub module_type: ModuleType,
}

impl NodeInfoRequest {
    pub fn new(node_id: NodeId, module_type: ModuleType) -> Self {
        Self {
            node_id,
            module_type,
        }
    }
}

/// Point query output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfoReply {
    /// Was the node/module information found?
    pub found: bool,
    pub addresses: Vec<String>,
    pub port: u16,
}

impl NodeInfoReply {
    /// Answer for an unknown node or a module the node does not advertise
    pub const NOT_FOUND: NodeInfoReply = NodeInfoReply {
        found: false,
        addresses: Vec::new(),
        port: 0,
    };

    pub fn found(addresses: Vec<String>, port: u16) -> Self {
        Self {
            found: true,
            addresses,
            port,
        }
    }
}

/// Emitted the first time a node id is installed in the table
#[derive(Debug, Clone)]
pub struct NewNodeVisible {
    pub new_node_id: NodeId,
    pub node_info: Arc<NodeInfo>,
}

impl NewNodeVisible {
    pub fn new(new_node_id: NodeId, node_info: Arc<NodeInfo>) -> Self {
        Self {
            new_node_id,
            node_info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn availability(modules: &[(ModuleType, u16)]) -> Availability {
        Availability {
            addresses: vec!["10.0.0.7".to_string()],
            modules: modules
                .iter()
                .map(|&(module, port)| ModuleDescriptor { module, port })
                .collect(),
        }
    }

    #[test]
    fn test_node_info_builds_module_map() {
        let info = NodeInfo::with_contact_time(
            availability(&[(ModuleType::Storage, 9001), (ModuleType::Log, 9002)]),
            42,
        );

        assert_eq!(info.port_of(ModuleType::Storage), Some(9001));
        assert_eq!(info.port_of(ModuleType::Log), Some(9002));
        assert_eq!(info.port_of(ModuleType::Discovery), None);
        assert_eq!(info.last_contact_time(), 42);
        assert_eq!(info.addresses(), ["10.0.0.7".to_string()]);
    }

    #[test]
    fn test_duplicate_module_last_entry_wins() {
        let info = NodeInfo::new(availability(&[
            (ModuleType::Storage, 9001),
            (ModuleType::Storage, 9500),
        ]));

        assert_eq!(info.modules().len(), 1);
        assert_eq!(info.port_of(ModuleType::Storage), Some(9500));
        // Raw descriptor list is kept as received
        assert_eq!(info.availability().modules.len(), 2);
    }

    #[test]
    fn test_node_info_defaults_to_now() {
        let before = chrono::Utc::now().timestamp_millis();
        let info = NodeInfo::new(Availability::default());
        let after = chrono::Utc::now().timestamp_millis();

        assert!(info.last_contact_time() >= before);
        assert!(info.last_contact_time() <= after);
        assert!(info.modules().is_empty());
    }

    #[test]
    fn test_module_type_parsing() {
        assert_eq!("storage".parse::<ModuleType>().unwrap(), ModuleType::Storage);
        assert_eq!("DISCOVERY".parse::<ModuleType>().unwrap(), ModuleType::Discovery);

        let err = "gpu".parse::<ModuleType>().unwrap_err();
        assert!(matches!(err, DiscoveryError::UnknownModuleType(ref s) if s == "gpu"));
    }

    #[test]
    fn test_not_found_reply_is_empty() {
        let reply = NodeInfoReply::NOT_FOUND;
        assert!(!reply.found);
        assert!(reply.addresses.is_empty());
        assert_eq!(reply.port, 0);
    }

    #[test]
    fn test_availability_json_shape() {
        let json = r#"{"addresses":["10.0.0.1"],"modules":[{"module":"storage","port":9001}]}"#;
        let parsed: Availability = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.modules[0].module, ModuleType::Storage);
        assert_eq!(parsed.modules[0].port, 9001);
    }

    #[test]
    fn test_unknown_modules_are_skipped() {
        let json = r#"{"addresses":["10.0.0.1"],"modules":[
            {"module":"storage","port":9001},
            {"module":"gpu","port":7000},
            {"module":"log","port":9002}
        ]}"#;
        let parsed: Availability = serde_json::from_str(json).unwrap();

        assert_eq!(
            parsed.modules,
            vec![
                ModuleDescriptor {
                    module: ModuleType::Storage,
                    port: 9001,
                },
                ModuleDescriptor {
                    module: ModuleType::Log,
                    port: 9002,
                },
            ]
        );
    }

    #[test]
    fn test_missing_module_list_is_empty() {
        let parsed: Availability = serde_json::from_str(r#"{"addresses":[]}"#).unwrap();
        assert!(parsed.modules.is_empty());
    }
}
