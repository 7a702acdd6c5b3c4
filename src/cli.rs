use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "rccr-setup")]
#[command(about = "Detect cluster machines as they are connected and build an Ansible inventory")]
pub struct Cli {
    /// Cluster definition file.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
    /// Where to write the inventory; overrides `setup.inventory_path`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
