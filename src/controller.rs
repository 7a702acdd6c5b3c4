//! Per-node wait-for-device loop.
//!
//! For each node the controller waits for the operator, probes, and decides
//! by how many unknown hosts showed up:
//!
//! * none (or a failed probe): offer a retry, otherwise the node is abandoned;
//! * exactly one: that host is confirmed and absorbed into the baseline;
//! * several: the first in probe order is confirmed and *all* of them are
//!   absorbed, so the next node does not trip over the same extras.  The
//!   operator is told which addresses were set aside.

use std::io;

use log::{error, info, warn};
use thiserror::Error;

use crate::operator::Operator;
use crate::probe::{HostProbe, ProbeFailure};
use crate::tracker::HostSetTracker;
use crate::types::{HostRecord, NodeDefinition};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("operator input failed: {0}")]
    Operator(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    Confirmed(HostRecord),
    Abandoned,
}

pub struct InteractiveMappingController<P, O> {
    tracker: HostSetTracker<P>,
    operator: O,
    tool_unavailable_streak: u32,
}

impl<P: HostProbe, O: Operator> InteractiveMappingController<P, O> {
    pub fn new(tracker: HostSetTracker<P>, operator: O) -> Self {
        Self {
            tracker,
            operator,
            tool_unavailable_streak: 0,
        }
    }

    pub fn tracker(&self) -> &HostSetTracker<P> {
        &self.tracker
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    pub fn operator_mut(&mut self) -> &mut O {
        &mut self.operator
    }

    /// Snapshot the hosts already on the network.  If the probe keeps failing
    /// and the operator stops retrying, setup continues with an empty baseline.
    pub async fn establish_baseline(&mut self) -> Result<(), SetupError> {
        loop {
            let target = self.tracker.target().to_string();
            self.operator
                .show(&format!("Taking an initial snapshot of {target}..."))
                .await?;

            match self.tracker.take_baseline().await {
                Ok(count) => {
                    self.tool_unavailable_streak = 0;
                    self.operator
                        .show(&format!("{count} host(s) currently present."))
                        .await?;
                    return Ok(());
                }
                Err(failure) => {
                    self.report_probe_failure(&failure).await?;
                    if !self.operator.confirm("Retry the initial scan? (y/n): ").await? {
                        warn!(
                            "Continuing without a baseline; every live host on {} will look new",
                            target
                        );
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Wait for `node` to appear on the network and return the host that did.
    pub async fn acquire_host_for(
        &mut self,
        node: &NodeDefinition,
    ) -> Result<Acquisition, SetupError> {
        loop {
            self.operator
                .wait_for_ready(&format!(
                    "Connect {} (power on or plug in the cable) and press Enter... ",
                    node.name
                ))
                .await?;

            info!("Scanning {} for {}", self.tracker.target(), node.name);
            match self.tracker.detect_new_hosts().await {
                Ok(fresh) => {
                    self.tool_unavailable_streak = 0;
                    if let Some(host) = self.settle(node, fresh).await? {
                        return Ok(Acquisition::Confirmed(host));
                    }
                    warn!("No new host appeared for {}", node.name);
                    self.operator.show("No new host was detected.").await?;
                }
                Err(failure) => self.report_probe_failure(&failure).await?,
            }

            if !self.operator.confirm("Try again? (y/n): ").await? {
                info!("Detection for {} abandoned by the operator", node.name);
                return Ok(Acquisition::Abandoned);
            }
        }
    }

    async fn settle(
        &mut self,
        node: &NodeDefinition,
        fresh: Vec<HostRecord>,
    ) -> Result<Option<HostRecord>, SetupError> {
        let Some(chosen) = fresh.first().cloned() else {
            return Ok(None);
        };

        if fresh.len() > 1 {
            let others: Vec<&str> = fresh[1..].iter().map(|h| h.address.as_str()).collect();
            warn!(
                "{} new hosts appeared at once for {}; using {} and marking {} as already known",
                fresh.len(),
                node.name,
                chosen.address,
                others.join(", ")
            );
            self.operator
                .show(&format!(
                    "Multiple new hosts appeared ({}). Using the first one, {}; {} will not be offered again.",
                    fresh.len(),
                    chosen.address,
                    others.join(", ")
                ))
                .await?;
        }

        self.tracker.absorb(&fresh);
        Ok(Some(chosen))
    }

    async fn report_probe_failure(&mut self, failure: &ProbeFailure) -> Result<(), SetupError> {
        if failure.is_environment_problem() {
            self.tool_unavailable_streak += 1;
            error!("Network scan unavailable: {}", failure);
            let mut text = format!(
                "Scan failed: {failure}. This is an environment problem: install nmap or set setup.nmap_path."
            );
            if self.tool_unavailable_streak > 1 {
                text.push_str(" Retrying will not help until it is fixed.");
            }
            self.operator.show(&text).await?;
        } else {
            self.tool_unavailable_streak = 0;
            warn!("Network scan failed: {}", failure);
            self.operator.show(&format!("Scan failed: {failure}.")).await?;
        }
        Ok(())
    }
}
