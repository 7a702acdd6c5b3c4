//! Plain-text rendering of node cards and mapping summaries.

use std::fmt::Write;

use crate::types::{NodeDefinition, NodeMapping};

/// Card shown before the operator connects a node; `index` is 1-based.
pub fn render_node_card(node: &NodeDefinition, index: usize, total: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{index}/{total}] Connect the following node to the network");
    let _ = writeln!(out, "  Node:        {}", node.name);
    let _ = writeln!(out, "  Assigned IP: {}", node.expected_address);
    let _ = writeln!(out, "  Role:        {}", node.role);
    match node.containers.split_first() {
        None => {
            let _ = write!(out, "  Containers:  (none)");
        }
        Some((first, rest)) => {
            let _ = write!(out, "  Containers:  - {first}");
            for container in rest {
                let _ = write!(out, "\n               - {container}");
            }
        }
    }
    out
}

pub fn render_mapping(mapping: &NodeMapping) -> String {
    let mut out = format!(
        "New host detected: {} (MAC: {}, hostname: {})\n{} -> {} mapped",
        mapping.observed_address,
        mapping.hardware_address,
        mapping.hostname,
        mapping.node_name,
        mapping.observed_address
    );
    if mapping.address_mismatch {
        let _ = write!(
            out,
            "\nDetected IP {} differs from configured IP {}; using the detected IP",
            mapping.observed_address, mapping.expected_address
        );
    }
    out
}

pub fn render_summary(mappings: &[NodeMapping]) -> String {
    let mut out = String::from("Detected nodes:");
    for (i, mapping) in mappings.iter().enumerate() {
        let _ = write!(
            out,
            "\n  {}. {} ({}) - {}",
            i + 1,
            mapping.node_name,
            mapping.observed_address,
            mapping.role
        );
        if !mapping.containers.is_empty() {
            let _ = write!(out, "\n     containers: {}", mapping.containers.join(", "));
        }
    }
    out
}
