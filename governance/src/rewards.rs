//! Reward issuance — fixed-size credit grants to proposers, voters and
//! quest participants.
//!
//! Amounts come from the [`RewardSchedule`] fixed at construction. Each path
//! checks all of its preconditions before minting and only records the claim
//! once the mint has gone through.

use crate::error::GovernanceError;
use crate::registry::ProposalRegistry;
use quest_interfaces::TokenLedger;
use quest_types::{Address, Credits, ProposalId, ProposalState, Role, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSchedule {
    pub proposer: Credits,
    pub voter: Credits,
    pub participant: Credits,
}

/// Who is asking for a governance-only effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOrigin {
    /// The executor, while running the calls of `proposal`.
    Governance { proposal: ProposalId },
    External { caller: Address },
}

impl CallOrigin {
    pub fn require_governance(&self) -> Result<ProposalId, GovernanceError> {
        match self {
            Self::Governance { proposal } => Ok(*proposal),
            Self::External { caller } => Err(GovernanceError::OnlyGovernance {
                caller: caller.clone(),
            }),
        }
    }
}

/// Minting identity plus the ledger it mints on.
pub struct Treasury<'a, L: TokenLedger> {
    pub ledger: &'a mut L,
    pub authority: &'a Address,
}

impl<L: TokenLedger> Treasury<'_, L> {
    fn pay(
        &mut self,
        to: &Address,
        amount: Credits,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        self.ledger.mint(self.authority, to, amount, now)?;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct RewardIssuer {
    schedule: RewardSchedule,
    quest_deadline_secs: u64,
    proofs: HashMap<(ProposalId, Address), String>,
    voter_claims: HashSet<(ProposalId, Address)>,
}

impl RewardIssuer {
    pub fn new(schedule: RewardSchedule, quest_deadline_secs: u64) -> Self {
        Self {
            schedule,
            quest_deadline_secs,
            proofs: HashMap::new(),
            voter_claims: HashSet::new(),
        }
    }

    /// Pay the proposer reward to `account`. Governance origin only.
    pub fn issue_proposer_reward<L: TokenLedger>(
        &self,
        origin: &CallOrigin,
        treasury: &mut Treasury<'_, L>,
        account: &Address,
        now: Timestamp,
    ) -> Result<Credits, GovernanceError> {
        origin.require_governance()?;
        treasury.pay(account, self.schedule.proposer, now)?;
        Ok(self.schedule.proposer)
    }

    /// Pay `account` for having voted on an executed proposal, once.
    ///
    /// `state` is the proposal's current state as reported by the delay queue.
    pub fn issue_voter_reward<L: TokenLedger>(
        &mut self,
        registry: &ProposalRegistry,
        state: ProposalState,
        treasury: &mut Treasury<'_, L>,
        proposal: ProposalId,
        account: &Address,
        now: Timestamp,
    ) -> Result<Credits, GovernanceError> {
        registry.check_existence(proposal, true)?;
        require_executed(proposal, state)?;
        registry.check_role(proposal, account, Role::Voter)?;
        let key = (proposal, account.clone());
        if self.voter_claims.contains(&key) {
            return Err(GovernanceError::RewardAlreadyClaimed {
                proposal,
                account: account.clone(),
            });
        }

        treasury.pay(account, self.schedule.voter, now)?;
        self.voter_claims.insert(key);
        Ok(self.schedule.voter)
    }

    /// Record `proof` for `account` and pay the participant reward.
    ///
    /// Claims are accepted up to and including `executed_at + quest_deadline`.
    #[allow(clippy::too_many_arguments)]
    pub fn issue_participant_reward<L: TokenLedger>(
        &mut self,
        registry: &mut ProposalRegistry,
        state: ProposalState,
        treasury: &mut Treasury<'_, L>,
        proposal: ProposalId,
        account: &Address,
        proof: &str,
        now: Timestamp,
    ) -> Result<Credits, GovernanceError> {
        registry.check_existence(proposal, true)?;
        require_executed(proposal, state)?;
        let executed_at =
            registry
                .execution_timestamp(proposal)
                .ok_or(GovernanceError::InvalidProposalState {
                    proposal,
                    expected: ProposalState::Executed,
                    actual: state,
                })?;
        let deadline = executed_at.saturating_add_secs(self.quest_deadline_secs);
        if executed_at.is_past_window(self.quest_deadline_secs, now) {
            return Err(GovernanceError::QuestExpired {
                proposal,
                deadline,
                now,
            });
        }
        let key = (proposal, account.clone());
        if self.proofs.contains_key(&key) {
            return Err(GovernanceError::InvalidProofExistence {
                proposal,
                account: account.clone(),
            });
        }

        treasury.pay(account, self.schedule.participant, now)?;
        self.proofs.insert(key, proof.to_string());
        if registry.role_of(proposal, account) == Role::Unregistered {
            registry.assign_role(proposal, account, Role::Participant)?;
        }
        Ok(self.schedule.participant)
    }

    pub fn proof_of(&self, proposal: ProposalId, account: &Address) -> Option<&str> {
        self.proofs
            .get(&(proposal, account.clone()))
            .map(String::as_str)
    }

    pub fn voter_reward_claimed(&self, proposal: ProposalId, account: &Address) -> bool {
        self.voter_claims.contains(&(proposal, account.clone()))
    }
}

fn require_executed(proposal: ProposalId, actual: ProposalState) -> Result<(), GovernanceError> {
    if actual != ProposalState::Executed {
        return Err(GovernanceError::InvalidProposalState {
            proposal,
            expected: ProposalState::Executed,
            actual,
        });
    }
    Ok(())
}
