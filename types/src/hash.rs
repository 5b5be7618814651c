//! Proposal identifiers derived from proposal content.

use crate::call::Call;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

type Blake2b256 = Blake2b<U32>;

/// A 256-bit proposal identifier.
///
/// The delay queue derives it deterministically from the proposal's call list
/// and description, so submitting the same tuple twice yields the same ID.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProposalId([u8; 32]);

impl ProposalId {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Hash a proposal's `(targets, values, calldatas, description)` tuple.
    ///
    /// Every variable-length field is length-prefixed so that distinct tuples
    /// cannot collide by shifting bytes between neighbouring fields. The
    /// description enters as its own digest.
    pub fn from_content(calls: &[Call], description: &str) -> Self {
        let description_hash = Blake2b256::digest(description.as_bytes());

        let mut hasher = Blake2b256::new();
        hasher.update((calls.len() as u64).to_le_bytes());
        for call in calls {
            let target = call.target.as_str().as_bytes();
            hasher.update((target.len() as u64).to_le_bytes());
            hasher.update(target);
            hasher.update(call.value.to_le_bytes());
            hasher.update((call.calldata.len() as u64).to_le_bytes());
            hasher.update(&call.calldata);
        }
        hasher.update(description_hash);

        let mut output = [0u8; 32];
        output.copy_from_slice(&hasher.finalize());
        Self(output)
    }
}

impl fmt::Debug for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProposalId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for ProposalId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

// IDs travel as hex strings in JSON scripts and event output.
impl Serialize for ProposalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ProposalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
