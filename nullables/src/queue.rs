//! Nullable delay queue — governor-with-timelock semantics in memory.
//!
//! Voting opens `voting_delay_secs` after creation (the snapshot), stays open
//! for `voting_period_secs`, and a succeeded proposal must wait
//! `min_delay_secs` in the queue before it can be executed.

use quest_interfaces::{DelayQueue, QueueError, VotesView};
use quest_types::{Address, Call, Credits, ProposalId, ProposalState, Timestamp, VoteSupport};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Voting and timelock parameters of the delay queue.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueSettings {
    /// Seconds between proposal creation and the voting snapshot.
    #[serde(default = "default_voting_delay")]
    pub voting_delay_secs: u64,

    /// Seconds the voting window stays open after the snapshot.
    #[serde(default = "default_voting_period")]
    pub voting_period_secs: u64,

    /// Quorum as a fraction of total supply at the snapshot (basis points).
    #[serde(default = "default_quorum_bps")]
    pub quorum_bps: u32,

    /// Mandatory wait between queueing and execution.
    #[serde(default = "default_min_delay")]
    pub min_delay_secs: u64,

    /// Voting weight a proposer must hold at proposal time.
    #[serde(default)]
    pub proposal_threshold: u64,
}

fn default_voting_delay() -> u64 {
    24 * 3600
}

fn default_voting_period() -> u64 {
    7 * 24 * 3600
}

fn default_quorum_bps() -> u32 {
    400 // 4%
}

fn default_min_delay() -> u64 {
    2 * 24 * 3600
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            voting_delay_secs: default_voting_delay(),
            voting_period_secs: default_voting_period(),
            quorum_bps: default_quorum_bps(),
            min_delay_secs: default_min_delay(),
            proposal_threshold: 0,
        }
    }
}

/// How one account voted on one proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteReceipt {
    pub support: VoteSupport,
    pub weight: Credits,
    pub reason: String,
}

struct ProposalCore {
    proposer: Address,
    snapshot: Timestamp,
    deadline: Timestamp,
    for_votes: Credits,
    against_votes: Credits,
    abstain_votes: Credits,
    receipts: HashMap<Address, VoteReceipt>,
    eta: Option<Timestamp>,
    executed: bool,
    canceled: bool,
}

pub struct NullDelayQueue {
    settings: QueueSettings,
    executor: Address,
    proposals: HashMap<ProposalId, ProposalCore>,
}

impl NullDelayQueue {
    pub fn new(settings: QueueSettings, executor: Address) -> Self {
        Self {
            settings,
            executor,
            proposals: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &QueueSettings {
        &self.settings
    }

    pub fn proposer_of(&self, id: ProposalId) -> Option<&Address> {
        self.proposals.get(&id).map(|p| &p.proposer)
    }

    /// Voting snapshot and deadline of a proposal.
    pub fn voting_window(&self, id: ProposalId) -> Option<(Timestamp, Timestamp)> {
        self.proposals.get(&id).map(|p| (p.snapshot, p.deadline))
    }

    /// `(against, for, abstain)` tallies.
    pub fn tally(&self, id: ProposalId) -> Option<(Credits, Credits, Credits)> {
        self.proposals
            .get(&id)
            .map(|p| (p.against_votes, p.for_votes, p.abstain_votes))
    }

    pub fn receipt(&self, id: ProposalId, voter: &Address) -> Option<&VoteReceipt> {
        self.proposals.get(&id).and_then(|p| p.receipts.get(voter))
    }

    fn core(&self, id: ProposalId) -> Result<&ProposalCore, QueueError> {
        self.proposals.get(&id).ok_or(QueueError::UnknownProposal(id))
    }

    fn core_mut(&mut self, id: ProposalId) -> Result<&mut ProposalCore, QueueError> {
        self.proposals
            .get_mut(&id)
            .ok_or(QueueError::UnknownProposal(id))
    }

    fn expect_state(
        &self,
        id: ProposalId,
        votes: &dyn VotesView,
        now: Timestamp,
        expected: &[ProposalState],
    ) -> Result<ProposalState, QueueError> {
        let actual = self.state(id, votes, now)?;
        if !expected.contains(&actual) {
            return Err(QueueError::UnexpectedState {
                id,
                actual,
                expected: expected.to_vec(),
            });
        }
        Ok(actual)
    }
}

impl DelayQueue for NullDelayQueue {
    fn hash_proposal(&self, calls: &[Call], description: &str) -> ProposalId {
        ProposalId::from_content(calls, description)
    }

    fn propose(
        &mut self,
        proposer: &Address,
        calls: &[Call],
        description: &str,
        votes: &dyn VotesView,
        now: Timestamp,
    ) -> Result<ProposalId, QueueError> {
        if calls.is_empty() {
            return Err(QueueError::EmptyProposal);
        }
        let id = self.hash_proposal(calls, description);
        if self.proposals.contains_key(&id) {
            return Err(QueueError::DuplicateProposal(id));
        }

        let threshold = Credits::new(u128::from(self.settings.proposal_threshold));
        let proposer_votes = votes.balance_at(proposer, now);
        if proposer_votes < threshold {
            return Err(QueueError::BelowThreshold {
                proposer: proposer.clone(),
                votes: proposer_votes,
                threshold,
            });
        }

        let snapshot = now.saturating_add_secs(self.settings.voting_delay_secs);
        let deadline = snapshot.saturating_add_secs(self.settings.voting_period_secs);
        self.proposals.insert(
            id,
            ProposalCore {
                proposer: proposer.clone(),
                snapshot,
                deadline,
                for_votes: Credits::ZERO,
                against_votes: Credits::ZERO,
                abstain_votes: Credits::ZERO,
                receipts: HashMap::new(),
                eta: None,
                executed: false,
                canceled: false,
            },
        );
        Ok(id)
    }

    fn cast_vote(
        &mut self,
        id: ProposalId,
        voter: &Address,
        support: VoteSupport,
        reason: &str,
        votes: &dyn VotesView,
        now: Timestamp,
    ) -> Result<Credits, QueueError> {
        self.expect_state(id, votes, now, &[ProposalState::Active])?;
        let core = self.core_mut(id)?;
        if core.receipts.contains_key(voter) {
            return Err(QueueError::AlreadyVoted {
                id,
                voter: voter.clone(),
            });
        }

        let weight = votes.balance_at(voter, core.snapshot);
        let bucket = match support {
            VoteSupport::Against => &mut core.against_votes,
            VoteSupport::For => &mut core.for_votes,
            VoteSupport::Abstain => &mut core.abstain_votes,
        };
        *bucket = bucket
            .checked_add(weight)
            .ok_or(QueueError::TallyOverflow(id))?;
        core.receipts.insert(
            voter.clone(),
            VoteReceipt {
                support,
                weight,
                reason: reason.to_string(),
            },
        );
        Ok(weight)
    }

    fn queue(
        &mut self,
        calls: &[Call],
        description: &str,
        votes: &dyn VotesView,
        now: Timestamp,
    ) -> Result<Timestamp, QueueError> {
        let id = self.hash_proposal(calls, description);
        self.expect_state(id, votes, now, &[ProposalState::Succeeded])?;
        let eta = now.saturating_add_secs(self.settings.min_delay_secs);
        self.core_mut(id)?.eta = Some(eta);
        Ok(eta)
    }

    fn execute(
        &mut self,
        calls: &[Call],
        description: &str,
        votes: &dyn VotesView,
        now: Timestamp,
    ) -> Result<ProposalId, QueueError> {
        let id = self.hash_proposal(calls, description);
        self.expect_state(id, votes, now, &[ProposalState::Queued])?;
        let core = self.core_mut(id)?;
        let eta = core.eta.unwrap_or(Timestamp::EPOCH);
        if now < eta {
            return Err(QueueError::NotReady { id, eta, now });
        }
        core.executed = true;
        Ok(id)
    }

    fn cancel(
        &mut self,
        calls: &[Call],
        description: &str,
        votes: &dyn VotesView,
        now: Timestamp,
    ) -> Result<ProposalId, QueueError> {
        let id = self.hash_proposal(calls, description);
        let actual = self.state(id, votes, now)?;
        if !actual.is_cancelable() {
            return Err(QueueError::UnexpectedState {
                id,
                actual,
                expected: vec![
                    ProposalState::Pending,
                    ProposalState::Active,
                    ProposalState::Succeeded,
                    ProposalState::Queued,
                ],
            });
        }
        self.core_mut(id)?.canceled = true;
        Ok(id)
    }

    fn state(
        &self,
        id: ProposalId,
        votes: &dyn VotesView,
        now: Timestamp,
    ) -> Result<ProposalState, QueueError> {
        let core = self.core(id)?;
        if core.executed {
            return Ok(ProposalState::Executed);
        }
        if core.canceled {
            return Ok(ProposalState::Canceled);
        }
        if now <= core.snapshot {
            return Ok(ProposalState::Pending);
        }
        if now <= core.deadline {
            return Ok(ProposalState::Active);
        }

        let quorum = votes
            .total_supply_at(core.snapshot)
            .mul_bps(self.settings.quorum_bps);
        let participation = core.for_votes.checked_add(core.abstain_votes);
        let quorum_reached = participation.map_or(true, |p| p >= quorum);
        if !quorum_reached || core.for_votes <= core.against_votes {
            return Ok(ProposalState::Defeated);
        }

        Ok(match core.eta {
            Some(_) => ProposalState::Queued,
            None => ProposalState::Succeeded,
        })
    }

    fn proposal_eta(&self, id: ProposalId) -> Option<Timestamp> {
        self.proposals.get(&id).and_then(|p| p.eta)
    }

    fn executor(&self) -> &Address {
        &self.executor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::NullTokenLedger;
    use quest_interfaces::TokenLedger;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    fn settings() -> QueueSettings {
        QueueSettings {
            voting_delay_secs: 10,
            voting_period_secs: 100,
            quorum_bps: 1000,
            min_delay_secs: 50,
            proposal_threshold: 0,
        }
    }

    fn calls() -> Vec<Call> {
        vec![Call::new(addr("governor"), 0, vec![7])]
    }

    fn setup() -> (NullDelayQueue, NullTokenLedger) {
        let queue = NullDelayQueue::new(settings(), addr("timelock"));
        let ledger = NullTokenLedger::new(addr("governor"))
            .with_balance(&addr("alice"), 60)
            .with_balance(&addr("bob"), 40);
        (queue, ledger)
    }

    #[test]
    fn full_lifecycle_reaches_executed() {
        let (mut queue, ledger) = setup();
        let id = queue
            .propose(&addr("carol"), &calls(), "q", &ledger, ts(0))
            .unwrap();
        assert_eq!(queue.state(id, &ledger, ts(10)).unwrap(), ProposalState::Pending);
        assert_eq!(queue.state(id, &ledger, ts(11)).unwrap(), ProposalState::Active);

        let weight = queue
            .cast_vote(id, &addr("alice"), VoteSupport::For, "yes", &ledger, ts(11))
            .unwrap();
        assert_eq!(weight, Credits::new(60));
        assert_eq!(queue.state(id, &ledger, ts(110)).unwrap(), ProposalState::Active);
        assert_eq!(
            queue.state(id, &ledger, ts(111)).unwrap(),
            ProposalState::Succeeded
        );

        let eta = queue.queue(&calls(), "q", &ledger, ts(111)).unwrap();
        assert_eq!(eta, ts(161));
        assert_eq!(queue.state(id, &ledger, ts(120)).unwrap(), ProposalState::Queued);

        let err = queue.execute(&calls(), "q", &ledger, ts(160)).unwrap_err();
        assert!(matches!(err, QueueError::NotReady { .. }));
        queue.execute(&calls(), "q", &ledger, ts(161)).unwrap();
        assert_eq!(
            queue.state(id, &ledger, ts(161)).unwrap(),
            ProposalState::Executed
        );
    }

    #[test]
    fn majority_against_is_defeated() {
        let (mut queue, ledger) = setup();
        let id = queue
            .propose(&addr("carol"), &calls(), "q", &ledger, ts(0))
            .unwrap();
        queue
            .cast_vote(id, &addr("alice"), VoteSupport::Against, "", &ledger, ts(20))
            .unwrap();
        queue
            .cast_vote(id, &addr("bob"), VoteSupport::For, "", &ledger, ts(20))
            .unwrap();
        assert_eq!(
            queue.state(id, &ledger, ts(200)).unwrap(),
            ProposalState::Defeated
        );
    }

    #[test]
    fn no_votes_misses_quorum() {
        let (mut queue, ledger) = setup();
        let id = queue
            .propose(&addr("carol"), &calls(), "q", &ledger, ts(0))
            .unwrap();
        assert_eq!(
            queue.state(id, &ledger, ts(200)).unwrap(),
            ProposalState::Defeated
        );
    }

    #[test]
    fn duplicate_content_is_rejected() {
        let (mut queue, ledger) = setup();
        let id = queue
            .propose(&addr("carol"), &calls(), "q", &ledger, ts(0))
            .unwrap();
        let err = queue
            .propose(&addr("dave"), &calls(), "q", &ledger, ts(5))
            .unwrap_err();
        assert_eq!(err, QueueError::DuplicateProposal(id));
    }

    #[test]
    fn double_vote_is_rejected() {
        let (mut queue, ledger) = setup();
        let id = queue
            .propose(&addr("carol"), &calls(), "q", &ledger, ts(0))
            .unwrap();
        queue
            .cast_vote(id, &addr("alice"), VoteSupport::For, "", &ledger, ts(20))
            .unwrap();
        let err = queue
            .cast_vote(id, &addr("alice"), VoteSupport::Against, "", &ledger, ts(21))
            .unwrap_err();
        assert!(matches!(err, QueueError::AlreadyVoted { .. }));
    }

    #[test]
    fn voting_after_deadline_is_rejected() {
        let (mut queue, ledger) = setup();
        let id = queue
            .propose(&addr("carol"), &calls(), "q", &ledger, ts(0))
            .unwrap();
        let err = queue
            .cast_vote(id, &addr("alice"), VoteSupport::For, "", &ledger, ts(111))
            .unwrap_err();
        assert!(matches!(err, QueueError::UnexpectedState { .. }));
    }

    #[test]
    fn vote_weight_uses_snapshot_balance() {
        let (mut queue, mut ledger) = setup();
        let id = queue
            .propose(&addr("carol"), &calls(), "q", &ledger, ts(0))
            .unwrap();
        // Credits minted after the snapshot do not count.
        ledger
            .mint(&addr("governor"), &addr("bob"), Credits::new(1000), ts(15))
            .unwrap();
        let weight = queue
            .cast_vote(id, &addr("bob"), VoteSupport::For, "", &ledger, ts(20))
            .unwrap();
        assert_eq!(weight, Credits::new(40));
    }

    #[test]
    fn executed_proposal_cannot_be_canceled() {
        let (mut queue, ledger) = setup();
        let id = queue
            .propose(&addr("carol"), &calls(), "q", &ledger, ts(0))
            .unwrap();
        queue
            .cast_vote(id, &addr("alice"), VoteSupport::For, "", &ledger, ts(20))
            .unwrap();
        queue.queue(&calls(), "q", &ledger, ts(111)).unwrap();
        queue.execute(&calls(), "q", &ledger, ts(161)).unwrap();
        let err = queue.cancel(&calls(), "q", &ledger, ts(162)).unwrap_err();
        assert!(matches!(
            err,
            QueueError::UnexpectedState {
                actual: ProposalState::Executed,
                ..
            }
        ));
    }

    #[test]
    fn proposal_threshold_is_enforced() {
        let mut queue = NullDelayQueue::new(
            QueueSettings {
                proposal_threshold: 50,
                ..settings()
            },
            addr("timelock"),
        );
        let ledger = NullTokenLedger::new(addr("governor")).with_balance(&addr("bob"), 40);
        let err = queue
            .propose(&addr("bob"), &calls(), "q", &ledger, ts(0))
            .unwrap_err();
        assert!(matches!(err, QueueError::BelowThreshold { .. }));
    }

    /// Every account weighs the whole credit range.
    struct Saturated;

    impl VotesView for Saturated {
        fn balance_at(&self, _: &Address, _: Timestamp) -> Credits {
            Credits::new(u128::MAX)
        }

        fn total_supply_at(&self, _: Timestamp) -> Credits {
            Credits::new(u128::MAX)
        }
    }

    #[test]
    fn tally_overflow_rejects_the_vote() {
        let mut queue = NullDelayQueue::new(settings(), addr("timelock"));
        let id = queue
            .propose(&addr("carol"), &calls(), "q", &Saturated, ts(0))
            .unwrap();
        queue
            .cast_vote(id, &addr("alice"), VoteSupport::For, "", &Saturated, ts(20))
            .unwrap();

        let err = queue
            .cast_vote(id, &addr("bob"), VoteSupport::For, "", &Saturated, ts(21))
            .unwrap_err();
        assert_eq!(err, QueueError::TallyOverflow(id));
        assert!(queue.receipt(id, &addr("bob")).is_none());
        assert_eq!(
            queue.tally(id),
            Some((Credits::ZERO, Credits::new(u128::MAX), Credits::ZERO))
        );
    }
}
