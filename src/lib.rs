//! Interactive discovery of cluster machines.
//!
//! The operator connects configured machines one at a time; each time, a
//! ping scan is diffed against the hosts already known, the newcomer is
//! recorded against the node it stands for, and the resulting mapping is
//! turned into an inventory for deployment tooling.

pub mod cli;
pub mod config;
pub mod controller;
pub mod inventory;
pub mod operator;
pub mod orchestrator;
pub mod probe;
pub mod registry;
pub mod report;
pub mod tracker;
pub mod types;

#[cfg(test)]
mod testing;
