//! Delay queue trait: proposal creation, vote casting, timelocked queueing
//! and execution. Vote tallying and quorum arithmetic live behind this trait.

use crate::ledger::VotesView;
use quest_types::{Address, Call, Credits, ProposalId, ProposalState, Timestamp, VoteSupport};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("proposal {0} not found")]
    UnknownProposal(ProposalId),

    #[error("proposal {0} already exists")]
    DuplicateProposal(ProposalId),

    #[error("a proposal must carry at least one call")]
    EmptyProposal,

    #[error("proposal {id} is {actual}, expected one of {expected:?}")]
    UnexpectedState {
        id: ProposalId,
        actual: ProposalState,
        expected: Vec<ProposalState>,
    },

    #[error("{voter} has already voted on proposal {id}")]
    AlreadyVoted { id: ProposalId, voter: Address },

    #[error("proposer {proposer} holds {votes}, below the threshold of {threshold}")]
    BelowThreshold {
        proposer: Address,
        votes: Credits,
        threshold: Credits,
    },

    #[error("vote tally overflow on proposal {0}")]
    TallyOverflow(ProposalId),

    #[error("proposal {id} is not ready: eta {eta}, now {now}")]
    NotReady {
        id: ProposalId,
        eta: Timestamp,
        now: Timestamp,
    },
}

/// The voting collaborator plus the mandatory wait between approval and execution.
pub trait DelayQueue {
    /// Deterministic ID for a proposal's content.
    fn hash_proposal(&self, calls: &[Call], description: &str) -> ProposalId;

    fn propose(
        &mut self,
        proposer: &Address,
        calls: &[Call],
        description: &str,
        votes: &dyn VotesView,
        now: Timestamp,
    ) -> Result<ProposalId, QueueError>;

    /// Record a vote and return the weight counted for it.
    fn cast_vote(
        &mut self,
        id: ProposalId,
        voter: &Address,
        support: VoteSupport,
        reason: &str,
        votes: &dyn VotesView,
        now: Timestamp,
    ) -> Result<Credits, QueueError>;

    /// Queue a succeeded proposal and return its eta.
    fn queue(
        &mut self,
        calls: &[Call],
        description: &str,
        votes: &dyn VotesView,
        now: Timestamp,
    ) -> Result<Timestamp, QueueError>;

    /// Mark a queued proposal whose eta has passed as executed.
    fn execute(
        &mut self,
        calls: &[Call],
        description: &str,
        votes: &dyn VotesView,
        now: Timestamp,
    ) -> Result<ProposalId, QueueError>;

    fn cancel(
        &mut self,
        calls: &[Call],
        description: &str,
        votes: &dyn VotesView,
        now: Timestamp,
    ) -> Result<ProposalId, QueueError>;

    fn state(
        &self,
        id: ProposalId,
        votes: &dyn VotesView,
        now: Timestamp,
    ) -> Result<ProposalState, QueueError>;

    /// Earliest execution time, once queued.
    fn proposal_eta(&self, id: ProposalId) -> Option<Timestamp>;

    /// Identity the queue uses when it runs a proposal's calls.
    fn executor(&self) -> &Address;
}
