//! Ansible inventory document built from an [`InventoryModel`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::registry::{InventoryModel, NodeMappingRegistry};
use crate::types::Role;

#[derive(Debug, Serialize)]
pub struct AnsibleInventory {
    all: AllGroup,
}

#[derive(Debug, Serialize)]
struct AllGroup {
    hosts: BTreeMap<String, HostVars>,
    children: BTreeMap<String, ChildGroup>,
}

#[derive(Debug, Serialize)]
struct HostVars {
    ansible_host: String,
    ansible_user: String,
    node_role: String,
    containers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ChildGroup {
    hosts: BTreeMap<String, Option<()>>,
}

/// Ansible group name for an inventory group key.
fn child_group_name(group: &str) -> String {
    format!("{group}s")
}

impl AnsibleInventory {
    pub fn new(model: &InventoryModel, ansible_user: &str) -> Self {
        let hosts = model
            .hosts
            .iter()
            .map(|(name, host)| {
                let vars = HostVars {
                    ansible_host: host.address.clone(),
                    ansible_user: ansible_user.to_string(),
                    node_role: String::from(host.role.clone()),
                    containers: host.containers.clone(),
                };
                (name.clone(), vars)
            })
            .collect();

        let children = [Role::Manager, Role::Worker]
            .iter()
            .map(|role| {
                let members = model
                    .groups
                    .get(role.as_str())
                    .map(|names| names.iter().map(|n| (n.clone(), None)).collect())
                    .unwrap_or_default();
                (child_group_name(role.as_str()), ChildGroup { hosts: members })
            })
            .collect();

        Self {
            all: AllGroup { hosts, children },
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("failed to render inventory")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_yaml()?;
        fs::write(path, contents)
            .with_context(|| format!("failed to write inventory {}", path.display()))?;
        info!("Inventory written to {}", path.display());
        Ok(())
    }
}

/// Where a partial run's inventory goes: `inventory.yml` becomes
/// `inventory.partial.yml`.
pub fn partial_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "inventory".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{stem}.partial.{}", ext.to_string_lossy()),
        None => format!("{stem}.partial"),
    };
    path.with_file_name(name)
}

/// Write what an unfinished run recorded to the partial path next to
/// `inventory_path`.  Returns the path written, or `None` if nothing was recorded.
pub fn save_partial(
    registry: &NodeMappingRegistry,
    inventory_path: &Path,
    ansible_user: &str,
) -> Result<Option<PathBuf>> {
    if registry.is_empty() {
        return Ok(None);
    }
    let path = partial_path(inventory_path);
    AnsibleInventory::new(&registry.to_inventory(), ansible_user).save(&path)?;
    warn!(
        "Partial inventory with {} node(s) written to {}",
        registry.len(),
        path.display()
    );
    Ok(Some(path))
}
