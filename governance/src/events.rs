//! Domain events buffered by the orchestrator for the embedding layer.

use quest_types::{Address, Credits, ItemId, ProposalId, Timestamp, VoteSupport};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    Proposed {
        proposal: ProposalId,
        proposer: Address,
        description: String,
        at: Timestamp,
    },
    Voted {
        proposal: ProposalId,
        voter: Address,
        support: VoteSupport,
        weight: Credits,
        reason: String,
    },
    Queued {
        proposal: ProposalId,
        eta: Timestamp,
    },
    Executed {
        proposal: ProposalId,
        at: Timestamp,
    },
    Canceled {
        proposal: ProposalId,
    },
    /// A call to a target other than the governor, for the embedder to carry out.
    CallRelayed {
        proposal: ProposalId,
        target: Address,
        value: u128,
        calldata: String,
    },
    ProposerRewarded {
        proposal: ProposalId,
        account: Address,
        amount: Credits,
    },
    VoterRewarded {
        proposal: ProposalId,
        account: Address,
        amount: Credits,
    },
    ParticipantRewarded {
        proposal: ProposalId,
        account: Address,
        amount: Credits,
        proof: String,
    },
    Redeemed {
        account: Address,
        item: ItemId,
        price: Credits,
    },
    ItemsMinted {
        minter: Address,
        ids: Vec<ItemId>,
        values: Vec<u64>,
    },
    MintAccessChanged {
        account: Address,
        allowed: bool,
    },
    ItemUriChanged {
        item: ItemId,
        uri: String,
    },
}
