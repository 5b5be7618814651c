//! A single call carried by a proposal.

use crate::address::Address;
use serde::{Deserialize, Serialize};

/// One `(target, value, calldata)` entry of a proposal's call list.
///
/// Calls whose target is the governor itself are self-governance calls and
/// are decoded and dispatched by the orchestrator on execution; all others
/// are relayed to the embedding layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
    pub target: Address,
    #[serde(default)]
    pub value: u128,
    #[serde(default)]
    pub calldata: Vec<u8>,
}

impl Call {
    pub fn new(target: Address, value: u128, calldata: Vec<u8>) -> Self {
        Self {
            target,
            value,
            calldata,
        }
    }
}
