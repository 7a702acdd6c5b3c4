use async_trait::async_trait;
use thiserror::Error;

use crate::types::HostSet;

pub mod nmap;
pub use nmap::NmapProbe;

/// Why a probe produced no snapshot.  All variants are recoverable at the
/// single-node level; `ToolUnavailable` points at the environment rather
/// than at a transient condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    #[error("probe tool `{0}` is not installed or not executable")]
    ToolUnavailable(String),
    #[error("probe did not finish within {0} seconds")]
    Timeout(u64),
    #[error("probe output could not be parsed: {0}")]
    MalformedOutput(String),
    /// Exit code, or -1 when the process was killed by a signal.
    #[error("probe exited with status {0}")]
    NonZeroExit(i32),
}

impl ProbeFailure {
    pub fn is_environment_problem(&self) -> bool {
        matches!(self, ProbeFailure::ToolUnavailable(_))
    }
}

#[async_trait]
pub trait HostProbe: Send + Sync {
    /// Scan `target` once and return the hosts that answered.
    /// Implementations must return within a bounded time.
    async fn probe(&self, target: &str) -> Result<HostSet, ProbeFailure>;
}
