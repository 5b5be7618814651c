//! Proposal registry — existence flags, per-account roles, execution stamps,
//! and the append-only list of every proposal ID in creation order.

use crate::error::GovernanceError;
use quest_types::{Address, ProposalId, ProposalState, Role, Timestamp};
use std::collections::HashMap;

/// Locally owned record of one proposal.
#[derive(Clone, Debug, Default)]
pub struct ProposalRecord {
    pub executed_at: Option<Timestamp>,
    pub eta: Option<Timestamp>,
    roles: HashMap<Address, Role>,
}

impl ProposalRecord {
    pub fn role_of(&self, account: &Address) -> Role {
        self.roles.get(account).copied().unwrap_or_default()
    }
}

/// Records are never removed; an ID marked existing stays existing.
#[derive(Clone, Debug, Default)]
pub struct ProposalRegistry {
    records: HashMap<ProposalId, ProposalRecord>,
    order: Vec<ProposalId>,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as existing. Returns `false` if it already was.
    pub fn register_existence(&mut self, id: ProposalId) -> bool {
        if self.records.contains_key(&id) {
            return false;
        }
        self.records.insert(id, ProposalRecord::default());
        self.order.push(id);
        true
    }

    pub fn exists(&self, id: ProposalId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn check_existence(&self, id: ProposalId, expected: bool) -> Result<(), GovernanceError> {
        let exists = self.exists(id);
        if exists != expected {
            return Err(GovernanceError::InvalidProposalExistence {
                proposal: id,
                exists,
            });
        }
        Ok(())
    }

    fn record_mut(&mut self, id: ProposalId) -> Result<&mut ProposalRecord, GovernanceError> {
        self.records
            .get_mut(&id)
            .ok_or(GovernanceError::InvalidProposalExistence {
                proposal: id,
                exists: false,
            })
    }

    pub fn role_of(&self, id: ProposalId, account: &Address) -> Role {
        self.records
            .get(&id)
            .map(|r| r.role_of(account))
            .unwrap_or_default()
    }

    /// Assign a role. Roles only ever move away from `Unregistered`, once.
    pub fn assign_role(
        &mut self,
        id: ProposalId,
        account: &Address,
        role: Role,
    ) -> Result<(), GovernanceError> {
        let record = self.record_mut(id)?;
        let actual = record.role_of(account);
        if actual != Role::Unregistered || role == Role::Unregistered {
            return Err(GovernanceError::UnauthorizedRole {
                account: account.clone(),
                proposal: id,
                actual,
                expected: Role::Unregistered,
            });
        }
        record.roles.insert(account.clone(), role);
        Ok(())
    }

    pub fn check_role(
        &self,
        id: ProposalId,
        account: &Address,
        expected: Role,
    ) -> Result<(), GovernanceError> {
        let actual = self.role_of(id, account);
        if actual != expected {
            return Err(GovernanceError::UnauthorizedRole {
                account: account.clone(),
                proposal: id,
                actual,
                expected,
            });
        }
        Ok(())
    }

    /// Stamp the execution time. Set exactly once.
    pub fn record_execution_timestamp(
        &mut self,
        id: ProposalId,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        let record = self.record_mut(id)?;
        if record.executed_at.is_some() {
            return Err(GovernanceError::InvalidProposalState {
                proposal: id,
                expected: ProposalState::Queued,
                actual: ProposalState::Executed,
            });
        }
        record.executed_at = Some(now);
        Ok(())
    }

    pub fn record_eta(&mut self, id: ProposalId, eta: Timestamp) -> Result<(), GovernanceError> {
        self.record_mut(id)?.eta = Some(eta);
        Ok(())
    }

    /// Eta recorded when the proposal was queued.
    pub fn eta(&self, id: ProposalId) -> Option<Timestamp> {
        self.records.get(&id).and_then(|r| r.eta)
    }

    pub fn execution_timestamp(&self, id: ProposalId) -> Option<Timestamp> {
        self.records.get(&id).and_then(|r| r.executed_at)
    }

    /// Every registered ID, in creation order.
    pub fn list_proposal_ids(&self) -> &[ProposalId] {
        &self.order
    }
}
