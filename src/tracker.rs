//! Snapshot diffing against a baseline of already-known addresses.

use std::collections::HashSet;

use log::{debug, info};

use crate::probe::{HostProbe, ProbeFailure};
use crate::types::{HostRecord, HostSet};

/// Owns the baseline of known addresses and diffs fresh probes against it.
///
/// Detection never moves the baseline; callers commit results with
/// [`HostSetTracker::absorb`] once they have decided what to keep.
pub struct HostSetTracker<P> {
    probe: P,
    target: String,
    baseline: HashSet<String>,
}

impl<P: HostProbe> HostSetTracker<P> {
    pub fn new(probe: P, target: impl Into<String>) -> Self {
        Self {
            probe,
            target: target.into(),
            baseline: HashSet::new(),
        }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn baseline_len(&self) -> usize {
        self.baseline.len()
    }

    pub fn is_known(&self, address: &str) -> bool {
        self.baseline.contains(address)
    }

    /// Replace the baseline with a fresh probe.  On failure the previous
    /// baseline is left untouched.
    pub async fn take_baseline(&mut self) -> Result<usize, ProbeFailure> {
        let snapshot = self.probe.probe(&self.target).await?;
        self.baseline = snapshot.addresses().map(str::to_string).collect();
        info!(
            "Baseline of {} contains {} hosts",
            self.target,
            self.baseline.len()
        );
        Ok(self.baseline.len())
    }

    /// Probe again and return the hosts whose address is not in the baseline,
    /// in probe order.
    pub async fn detect_new_hosts(&self) -> Result<Vec<HostRecord>, ProbeFailure> {
        let current = self.probe.probe(&self.target).await?;
        let fresh = new_hosts(&self.baseline, current);
        debug!("{} host(s) not in baseline", fresh.len());
        Ok(fresh)
    }

    /// Merge addresses into the baseline so they are never reported as new again.
    pub fn absorb<'a>(&mut self, hosts: impl IntoIterator<Item = &'a HostRecord>) {
        for host in hosts {
            self.baseline.insert(host.address.clone());
        }
    }
}

fn new_hosts(baseline: &HashSet<String>, current: HostSet) -> Vec<HostRecord> {
    current
        .into_records()
        .into_iter()
        .filter(|h| !baseline.contains(&h.address))
        .collect()
}
