//! Data structures shared by the probe, the tracker and the registry.
//!
//! Everything here is a value type.  Host records come out of a probe and
//! are never edited afterwards; node definitions come out of the cluster
//! file and live for the whole session.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder used when a probe could not resolve a MAC address or hostname.
pub const UNKNOWN: &str = "unknown";

/// One live host as reported by a single probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostRecord {
    pub address: String,
    pub hardware_address: String,
    pub hostname: String,
}

impl HostRecord {
    pub fn new(
        address: impl Into<String>,
        hardware_address: Option<String>,
        hostname: Option<String>,
    ) -> Self {
        Self {
            address: address.into(),
            hardware_address: hardware_address.unwrap_or_else(|| UNKNOWN.to_string()),
            hostname: hostname.unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

/// Snapshot of the hosts seen by one probe, in the probe's output order.
///
/// Addresses are unique: when a probe reports the same address twice the
/// first record wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSet {
    hosts: Vec<HostRecord>,
}

impl HostSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(|h| h.address.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostRecord> {
        self.hosts.iter()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn into_records(self) -> Vec<HostRecord> {
        self.hosts
    }
}

impl FromIterator<HostRecord> for HostSet {
    fn from_iter<I: IntoIterator<Item = HostRecord>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let hosts = iter
            .into_iter()
            .filter(|h| seen.insert(h.address.clone()))
            .collect();
        Self { hosts }
    }
}

/// Role a node plays in the cluster.
///
/// Only `manager` and `worker` get inventory groups; anything else is kept
/// verbatim so it still shows up in the host list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Manager,
    Worker,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Manager => "manager",
            Role::Worker => "worker",
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "manager" => Role::Manager,
            "worker" => Role::Worker,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A machine as declared in the cluster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub name: String,
    #[serde(rename = "ip")]
    pub expected_address: String,
    pub role: Role,
    #[serde(default)]
    pub containers: Vec<String>,
}

/// A confirmed pairing of a configured node with the host that appeared for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeMapping {
    pub node_name: String,
    pub expected_address: String,
    pub observed_address: String,
    pub hardware_address: String,
    pub hostname: String,
    pub role: Role,
    pub containers: Vec<String>,
    pub address_mismatch: bool,
}

impl NodeMapping {
    pub fn new(node: &NodeDefinition, host: &HostRecord) -> Self {
        Self {
            node_name: node.name.clone(),
            expected_address: node.expected_address.clone(),
            observed_address: host.address.clone(),
            hardware_address: host.hardware_address.clone(),
            hostname: host.hostname.clone(),
            role: node.role.clone(),
            containers: node.containers.clone(),
            address_mismatch: host.address != node.expected_address,
        }
    }
}
