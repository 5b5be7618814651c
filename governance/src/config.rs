//! Protocol constants with TOML file support.
//!
//! Cooldown periods, the quest deadline and the reward amounts are fixed when
//! the orchestrator is constructed. No operation accepts them from a caller.

use crate::cooldown::CooldownPeriods;
use crate::rewards::RewardSchedule;
use quest_types::{Address, Credits};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration of the governance core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// The governor's own identity: ledger owner, item custodian, and the
    /// target address of self-governance calls.
    #[serde(default = "default_governor")]
    pub governor: Address,

    /// Minimum seconds between two proposals by the same account.
    #[serde(default = "default_cooldown")]
    pub propose_cooldown_secs: u64,

    /// Minimum seconds between two votes by the same account.
    #[serde(default = "default_cooldown")]
    pub vote_cooldown_secs: u64,

    /// Seconds after execution during which participants may submit proof.
    #[serde(default = "default_quest_deadline")]
    pub quest_deadline_secs: u64,

    #[serde(default = "default_proposer_reward")]
    pub proposer_reward: u64,

    #[serde(default = "default_voter_reward")]
    pub voter_reward: u64,

    #[serde(default = "default_participant_reward")]
    pub participant_reward: u64,

    /// Accounts granted item mint access at construction.
    #[serde(default)]
    pub minters: Vec<Address>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_governor() -> Address {
    Address::new("quest-governor")
}

fn default_cooldown() -> u64 {
    60
}

fn default_quest_deadline() -> u64 {
    7 * 24 * 3600
}

fn default_proposer_reward() -> u64 {
    100
}

fn default_voter_reward() -> u64 {
    10
}

fn default_participant_reward() -> u64 {
    50
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GovernanceConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.governor.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "governor address {:?} is malformed",
                self.governor.as_str()
            )));
        }
        if let Some(bad) = self.minters.iter().find(|m| !m.is_valid()) {
            return Err(ConfigError::Invalid(format!(
                "minter address {:?} is malformed",
                bad.as_str()
            )));
        }
        Ok(())
    }

    pub fn cooldown_periods(&self) -> CooldownPeriods {
        CooldownPeriods {
            propose_secs: self.propose_cooldown_secs,
            vote_secs: self.vote_cooldown_secs,
        }
    }

    pub fn reward_schedule(&self) -> RewardSchedule {
        RewardSchedule {
            proposer: Credits::new(u128::from(self.proposer_reward)),
            voter: Credits::new(u128::from(self.voter_reward)),
            participant: Credits::new(u128::from(self.participant_reward)),
        }
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            governor: default_governor(),
            propose_cooldown_secs: default_cooldown(),
            vote_cooldown_secs: default_cooldown(),
            quest_deadline_secs: default_quest_deadline(),
            proposer_reward: default_proposer_reward(),
            voter_reward: default_voter_reward(),
            participant_reward: default_participant_reward(),
            minters: Vec::new(),
        }
    }
}
