//! Self-governance calldata.
//!
//! A proposal call whose target is the governor's own address carries a
//! bincode-encoded [`SelfCall`]. These are the only way to pay a proposer
//! reward or change minter and item-URI settings.

use crate::error::GovernanceError;
use quest_types::{Address, Call, ItemId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfCall {
    ClaimProposerReward { account: Address },
    SetMintAccess { account: Address, allowed: bool },
    SetItemUri { item: ItemId, uri: String },
}

impl SelfCall {
    pub fn encode(&self) -> Result<Vec<u8>, GovernanceError> {
        bincode::serialize(self).map_err(|e| GovernanceError::InvalidCalldata(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, GovernanceError> {
        bincode::deserialize(bytes).map_err(|e| GovernanceError::InvalidCalldata(e.to_string()))
    }

    /// Wrap as a zero-value call addressed to `governor`.
    pub fn into_call(self, governor: &Address) -> Result<Call, GovernanceError> {
        Ok(Call::new(governor.clone(), 0, self.encode()?))
    }
}
