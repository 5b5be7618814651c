use quest_interfaces::{ItemError, LedgerError, QueueError};
use quest_types::{ActionKind, Address, ProposalId, ProposalState, Role, Timestamp};
use thiserror::Error;

/// Every rejection of an attempted operation. No variant leaves partial effects behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    // ── Admission ───────────────────────────────────────────────────────
    #[error("{account} is on cooldown for {kind} until after {available_after}")]
    ActionOnCooldown {
        account: Address,
        kind: ActionKind,
        available_after: Timestamp,
    },

    #[error("{account} holds role {actual} on proposal {proposal}, expected {expected}")]
    UnauthorizedRole {
        account: Address,
        proposal: ProposalId,
        actual: Role,
        expected: Role,
    },

    #[error("{caller} has no mint access")]
    MintAccessDenied { caller: Address },

    #[error("{caller} may only act through an executing governance proposal")]
    OnlyGovernance { caller: Address },

    // ── Existence / state ───────────────────────────────────────────────
    #[error("proposal {proposal} has existence flag {exists}, which this operation rejects")]
    InvalidProposalExistence { proposal: ProposalId, exists: bool },

    #[error("proposal {proposal} is {actual}, expected {expected}")]
    InvalidProposalState {
        proposal: ProposalId,
        expected: ProposalState,
        actual: ProposalState,
    },

    #[error("{account} already submitted a proof for proposal {proposal}")]
    InvalidProofExistence {
        proposal: ProposalId,
        account: Address,
    },

    #[error("{account} already claimed the voter reward for proposal {proposal}")]
    RewardAlreadyClaimed {
        proposal: ProposalId,
        account: Address,
    },

    // ── Temporal ────────────────────────────────────────────────────────
    #[error("quest for proposal {proposal} expired at {deadline} (now {now})")]
    QuestExpired {
        proposal: ProposalId,
        deadline: Timestamp,
        now: Timestamp,
    },

    // ── Input validation ────────────────────────────────────────────────
    #[error("input length mismatch: {ids} ids, {values} values, {prices} prices, {uris} uris")]
    InvalidInputLength {
        ids: usize,
        values: usize,
        prices: usize,
        uris: usize,
    },

    #[error("undecodable governance calldata: {0}")]
    InvalidCalldata(String),

    // ── Reentrancy ──────────────────────────────────────────────────────
    #[error("reentrant call rejected")]
    Reentrancy,

    // ── Collaborators ───────────────────────────────────────────────────
    #[error("token ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("delay queue: {0}")]
    Queue(#[from] QueueError),

    #[error("item registry: {0}")]
    Item(#[from] ItemError),
}

/// Coarse classification of a [`GovernanceError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Admission,
    State,
    Temporal,
    Input,
    Reentrancy,
    Collaborator,
}

impl GovernanceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ActionOnCooldown { .. }
            | Self::UnauthorizedRole { .. }
            | Self::MintAccessDenied { .. }
            | Self::OnlyGovernance { .. } => ErrorClass::Admission,
            Self::InvalidProposalExistence { .. }
            | Self::InvalidProposalState { .. }
            | Self::InvalidProofExistence { .. }
            | Self::RewardAlreadyClaimed { .. } => ErrorClass::State,
            Self::QuestExpired { .. } => ErrorClass::Temporal,
            Self::InvalidInputLength { .. } | Self::InvalidCalldata(_) => ErrorClass::Input,
            Self::Reentrancy => ErrorClass::Reentrancy,
            Self::Ledger(_) | Self::Queue(_) | Self::Item(_) => ErrorClass::Collaborator,
        }
    }

    /// Whether resubmitting the same request later can succeed without any
    /// other change. Only cooldowns clear by themselves.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ActionOnCooldown { .. })
    }
}
