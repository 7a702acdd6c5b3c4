//! Append-only log of confirmed node mappings and the inventory derived from it.

use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use crate::types::{HostRecord, NodeDefinition, NodeMapping, Role};

/// Per-host entry of the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryHost {
    pub address: String,
    pub role: Role,
    pub containers: Vec<String>,
}

/// Confirmed nodes grouped for deployment tooling.
///
/// `groups` always carries `manager` and `worker`, listed in recording order.
/// Nodes with any other role appear only under `hosts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryModel {
    pub hosts: BTreeMap<String, InventoryHost>,
    pub groups: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
pub struct NodeMappingRegistry {
    mappings: Vec<NodeMapping>,
}

impl NodeMappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `host` is where `node` showed up.  Recording the same node
    /// twice is a caller error and is not checked.
    pub fn record(&mut self, node: &NodeDefinition, host: &HostRecord) -> &NodeMapping {
        let mapping = NodeMapping::new(node, host);
        if mapping.address_mismatch {
            warn!(
                "{} came up at {} instead of the configured {}",
                mapping.node_name, mapping.observed_address, mapping.expected_address
            );
        }
        self.mappings.push(mapping);
        &self.mappings[self.mappings.len() - 1]
    }

    pub fn summary(&self) -> &[NodeMapping] {
        &self.mappings
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn to_inventory(&self) -> InventoryModel {
        let mut inventory = InventoryModel::default();
        for role in [Role::Manager, Role::Worker] {
            inventory.groups.insert(role.to_string(), Vec::new());
        }

        for mapping in &self.mappings {
            inventory.hosts.insert(
                mapping.node_name.clone(),
                InventoryHost {
                    address: mapping.observed_address.clone(),
                    role: mapping.role.clone(),
                    containers: mapping.containers.clone(),
                },
            );
            if let Role::Manager | Role::Worker = mapping.role {
                if let Some(members) = inventory.groups.get_mut(mapping.role.as_str()) {
                    members.push(mapping.node_name.clone());
                }
            }
        }

        inventory
    }
}
