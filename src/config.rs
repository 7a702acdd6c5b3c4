use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::NodeDefinition;

/// Default location of the cluster file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "cluster_config.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] figment::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterConfig {
    pub network_config: NetworkConfig,
    pub machines: Vec<NodeDefinition>,
    #[serde(default)]
    pub setup: SetupSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Range handed to the probe, e.g. `192.168.219.0/24`.
    pub subnet: String,
}

/// Knobs for the setup run itself; none of them are required in the file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SetupSettings {
    pub nmap_path: String,
    pub probe_timeout_secs: u64,
    pub inventory_path: PathBuf,
    pub ansible_user: String,
}

impl Default for SetupSettings {
    fn default() -> Self {
        Self {
            nmap_path: "nmap".into(),
            probe_timeout_secs: 60,
            inventory_path: PathBuf::from("inventory.yml"),
            ansible_user: "root".into(),
        }
    }
}

impl SetupSettings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            network_config: NetworkConfig {
                subnet: "192.168.1.0/24".into(),
            },
            machines: Vec::new(),
            setup: SetupSettings::default(),
        }
    }
}

impl ClusterConfig {
    /// Loads the cluster file at `path`, layered over defaults and under
    /// `RCCR_`-prefixed environment variables (`__` separates nested keys).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let config: ClusterConfig = Figment::from(Serialized::defaults(ClusterConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("RCCR_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.machines.is_empty() {
            return Err(ConfigError::Invalid("no machines are defined".into()));
        }

        let mut names = HashSet::new();
        for node in &self.machines {
            if node.name.trim().is_empty() {
                return Err(ConfigError::Invalid("machine with an empty name".into()));
            }
            if !names.insert(node.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "machine name `{}` is defined more than once",
                    node.name
                )));
            }
        }

        if self.setup.probe_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "setup.probe_timeout_secs must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
