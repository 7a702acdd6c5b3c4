use std::future::Future;

use log::{error, info};

use crate::controller::{Acquisition, InteractiveMappingController, SetupError};
use crate::operator::Operator;
use crate::probe::HostProbe;
use crate::registry::NodeMappingRegistry;
use crate::report::{render_mapping, render_node_card, render_summary};
use crate::types::NodeDefinition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every configured node was mapped.
    Completed,
    /// The operator gave up on `node`; later nodes were not attempted.
    Abandoned { node: String },
}

/// How an interactive session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// All nodes mapped and the operator confirmed the summary.
    Confirmed,
    /// All nodes mapped but the operator declined to continue.
    Declined,
    Abandoned(String),
    /// The shutdown signal fired first.
    Interrupted,
    Failed(SetupError),
}

/// Walks the configured nodes in order, stopping at the first abandoned one.
/// Whatever was recorded stays in the registry however the run ends.
pub struct SetupOrchestrator<P, O> {
    nodes: Vec<NodeDefinition>,
    controller: InteractiveMappingController<P, O>,
    registry: NodeMappingRegistry,
}

impl<P: HostProbe, O: Operator> SetupOrchestrator<P, O> {
    pub fn new(nodes: Vec<NodeDefinition>, controller: InteractiveMappingController<P, O>) -> Self {
        Self {
            nodes,
            controller,
            registry: NodeMappingRegistry::new(),
        }
    }

    pub fn registry(&self) -> &NodeMappingRegistry {
        &self.registry
    }

    pub fn controller(&self) -> &InteractiveMappingController<P, O> {
        &self.controller
    }

    pub fn operator_mut(&mut self) -> &mut O {
        self.controller.operator_mut()
    }

    pub async fn run(&mut self) -> Result<RunOutcome, SetupError> {
        self.controller.establish_baseline().await?;

        let total = self.nodes.len();
        info!("Mapping {} node(s)", total);

        for (index, node) in self.nodes.iter().enumerate() {
            self.controller
                .operator_mut()
                .show(&render_node_card(node, index + 1, total))
                .await?;

            match self.controller.acquire_host_for(node).await? {
                Acquisition::Confirmed(host) => {
                    let mapping = self.registry.record(node, &host);
                    info!("{} -> {}", mapping.node_name, mapping.observed_address);
                    let text = render_mapping(mapping);
                    self.controller.operator_mut().show(&text).await?;
                }
                Acquisition::Abandoned => {
                    error!(
                        "Could not detect {}; stopping with {} of {} node(s) mapped",
                        node.name,
                        self.registry.len(),
                        total
                    );
                    return Ok(RunOutcome::Abandoned {
                        node: node.name.clone(),
                    });
                }
            }
        }

        Ok(RunOutcome::Completed)
    }

    /// Run all nodes, then ask for confirmation of the summary, unless
    /// `shutdown` resolves first.  The registry keeps whatever was recorded
    /// before the session stopped.
    pub async fn run_session<F>(&mut self, shutdown: F) -> SessionEnd
    where
        F: Future<Output = ()>,
    {
        let session = async {
            match self.run().await? {
                RunOutcome::Abandoned { node } => Ok::<_, SetupError>(SessionEnd::Abandoned(node)),
                RunOutcome::Completed => {
                    let summary = render_summary(self.registry.summary());
                    let operator = self.controller.operator_mut();
                    operator.show(&summary).await?;
                    if operator.confirm("Continue? (y/n): ").await? {
                        Ok(SessionEnd::Confirmed)
                    } else {
                        Ok(SessionEnd::Declined)
                    }
                }
            }
        };

        tokio::select! {
            result = session => result.unwrap_or_else(SessionEnd::Failed),
            () = shutdown => SessionEnd::Interrupted,
        }
    }
}
