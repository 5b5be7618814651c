//! `quest.toml` — governance constants, delay-queue settings and logging.

use anyhow::Context;
use quest_governance::GovernanceConfig;
use quest_nullables::QueueSettings;
use quest_types::Address;
use quest_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CliConfig {
    /// Identity the delay queue uses when it runs proposal calls.
    #[serde(default = "default_executor")]
    pub executor: Address,

    #[serde(default)]
    pub governance: GovernanceConfig,

    #[serde(default)]
    pub queue: QueueSettings,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,

    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_executor() -> Address {
    Address::new("quest-timelock")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            executor: default_executor(),
            governance: GovernanceConfig::default(),
            queue: QueueSettings::default(),
            log: LogConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.governance.validate()?;
        anyhow::ensure!(
            config.executor.is_valid(),
            "executor address {:?} is malformed",
            config.executor.as_str()
        );
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
