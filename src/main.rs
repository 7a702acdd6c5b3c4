//! rccr-setup entry point.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use tokio::signal;

use rccr_setup::cli::Cli;
use rccr_setup::config::ClusterConfig;
use rccr_setup::controller::InteractiveMappingController;
use rccr_setup::inventory::{save_partial, AnsibleInventory};
use rccr_setup::operator::{Operator, TerminalOperator};
use rccr_setup::orchestrator::{SessionEnd, SetupOrchestrator};
use rccr_setup::probe::NmapProbe;
use rccr_setup::tracker::HostSetTracker;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Setup failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Load configuration
    let mut cfg = ClusterConfig::load(&cli.config)
        .with_context(|| format!("cannot use {}", cli.config.display()))?;
    if let Some(output) = cli.output {
        cfg.setup.inventory_path = output;
    }
    info!(
        "Loaded {} machine(s) for {} from {}",
        cfg.machines.len(),
        cfg.network_config.subnet,
        cli.config.display()
    );

    let probe = NmapProbe::new(cfg.setup.nmap_path.clone(), cfg.setup.probe_timeout());
    let tracker = HostSetTracker::new(probe, cfg.network_config.subnet.clone());
    let controller = InteractiveMappingController::new(tracker, TerminalOperator::new());
    let mut orchestrator = SetupOrchestrator::new(cfg.machines.clone(), controller);

    // Ctrl+C ends the session at whatever prompt or scan it is waiting on.
    let end = orchestrator.run_session(interrupted()).await;

    let registry = orchestrator.registry();
    let settings = &cfg.setup;
    match end {
        SessionEnd::Confirmed => {
            AnsibleInventory::new(&registry.to_inventory(), &settings.ansible_user)
                .save(&settings.inventory_path)?;
            let next = format!(
                "Node mapping complete. Next: run the Ansible playbooks against {}.",
                settings.inventory_path.display()
            );
            orchestrator.operator_mut().show(&next).await?;
            return Ok(ExitCode::SUCCESS);
        }
        SessionEnd::Declined => {
            warn!("Setup cancelled; no inventory written");
            return Ok(ExitCode::FAILURE);
        }
        SessionEnd::Abandoned(node) => error!("Setup stopped at {}", node),
        SessionEnd::Interrupted => warn!("Setup interrupted by the operator"),
        SessionEnd::Failed(e) => error!("{}", e),
    }

    save_partial(registry, &settings.inventory_path, &settings.ansible_user)?;
    Ok(ExitCode::FAILURE)
}

async fn interrupted() {
    match signal::ctrl_c().await {
        Ok(()) => {}
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    }
}
