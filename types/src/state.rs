//! State and role enums shared by the orchestrator and its collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a proposal, as reported by the delay queue.
///
/// `Pending → Active → (Defeated | Succeeded) → Queued → Executed`, with
/// `Canceled` reachable from every non-terminal state except `Defeated`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalState {
    /// Created; voting has not started yet.
    Pending,
    /// Voting window is open.
    Active,
    /// Voting closed without quorum or majority.
    Defeated,
    /// Voting closed with quorum and majority; not yet queued.
    Succeeded,
    /// Waiting out the mandatory delay before execution.
    Queued,
    /// Executed; the quest is approved.
    Executed,
    /// Withdrawn by its proposer before execution.
    Canceled,
}

impl ProposalState {
    /// Whether the proposal may still be canceled from this state.
    pub fn is_cancelable(&self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Active | Self::Succeeded | Self::Queued
        )
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A vote choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteSupport {
    Against,
    For,
    Abstain,
}

impl VoteSupport {
    /// Decode the conventional `0 = against, 1 = for, 2 = abstain` encoding.
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Against),
            1 => Some(Self::For),
            2 => Some(Self::Abstain),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Against => 0,
            Self::For => 1,
            Self::Abstain => 2,
        }
    }
}

/// An account's role within one proposal's context.
///
/// Starts as `Unregistered` and moves at most once to one of the other three.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Unregistered,
    Voter,
    Proposer,
    Participant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Throttled action kinds. Each kind has its own cooldown period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Propose,
    Vote,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Propose => write!(f, "PROPOSE"),
            Self::Vote => write!(f, "VOTE"),
        }
    }
}
