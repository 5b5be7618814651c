//! End-to-end proposal lifecycle against the nullable collaborators.

use quest_governance::{
    GovernanceConfig, GovernanceError, GovernanceEvent, ReentrancyGuard, SelfCall,
};
use quest_interfaces::{DelayQueue, ItemError, ItemRegistry, QueueError};
use quest_nullables::{
    NullClock, NullDelayQueue, NullItemRegistry, NullTokenLedger, QueueSettings,
};
use quest_types::{
    ActionKind, Address, Call, Credits, ItemId, ProposalId, ProposalState, Role, Timestamp,
    VoteSupport,
};

type Orchestrator =
    quest_governance::GovernanceOrchestrator<NullTokenLedger, NullDelayQueue, NullItemRegistry>;

const GOV: &str = "gov";
const QUEST_DEADLINE: u64 = 1000;

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

fn config() -> GovernanceConfig {
    GovernanceConfig {
        governor: addr(GOV),
        propose_cooldown_secs: 60,
        vote_cooldown_secs: 60,
        quest_deadline_secs: QUEST_DEADLINE,
        proposer_reward: 100,
        voter_reward: 10,
        participant_reward: 50,
        minters: vec![addr("curator")],
    }
}

fn setup() -> Orchestrator {
    setup_with_items(NullItemRegistry::new())
}

fn setup_with_items<R: ItemRegistry>(
    items: R,
) -> quest_governance::GovernanceOrchestrator<NullTokenLedger, NullDelayQueue, R> {
    let ledger = NullTokenLedger::new(addr(GOV))
        .with_balance(&addr("alice"), 60)
        .with_balance(&addr("bob"), 40);
    let queue = NullDelayQueue::new(settings(), addr("timelock"));
    quest_governance::GovernanceOrchestrator::new(&config(), ledger, queue, items)
}

fn self_call(call: SelfCall) -> Call {
    call.into_call(&addr(GOV)).unwrap()
}

fn relay() -> Call {
    Call::new(addr("city-hall"), 0, b"plant".to_vec())
}

/// Propose at `t0`, pass it with alice's vote and queue it. Eta is `t0 + 161`.
fn pass(
    orch: &mut Orchestrator,
    proposer: &str,
    calls: &[Call],
    desc: &str,
    t0: u64,
) -> ProposalId {
    let id = orch.initiate(&addr(proposer), calls, desc, ts(t0)).unwrap();
    orch.vote(&addr("alice"), id, VoteSupport::For, "yes", ts(t0 + 11))
        .unwrap();
    let eta = orch.queue_proposal(calls, desc, ts(t0 + 111)).unwrap();
    assert_eq!(eta, ts(t0 + 161));
    id
}

// ── Admission ───────────────────────────────────────────────────────────

#[test]
fn propose_cooldown_scenario() {
    let mut orch = setup();
    let p = addr("p");
    let first = orch.initiate(&p, &[relay()], "quest one", ts(0)).unwrap();

    let err = orch.initiate(&p, &[relay()], "quest two", ts(30)).unwrap_err();
    assert_eq!(
        err,
        GovernanceError::ActionOnCooldown {
            account: p.clone(),
            kind: ActionKind::Propose,
            available_after: ts(60),
        }
    );
    assert!(err.is_transient());

    let second = orch.initiate(&p, &[relay()], "quest two", ts(61)).unwrap();
    assert_ne!(first, second);
    assert_eq!(orch.proposal_ids(), &[first, second]);
}

#[test]
fn identical_proposal_collides() {
    let mut orch = setup();
    let id = orch.initiate(&addr("p"), &[relay()], "same", ts(0)).unwrap();
    let err = orch
        .initiate(&addr("q"), &[relay()], "same", ts(1))
        .unwrap_err();
    assert_eq!(
        err,
        GovernanceError::InvalidProposalExistence {
            proposal: id,
            exists: true
        }
    );
    assert_eq!(orch.last_action_timestamp(&addr("q"), ActionKind::Propose), None);
}

#[test]
fn proposer_cannot_vote_on_own_proposal() {
    let mut orch = setup();
    let id = orch.initiate(&addr("alice"), &[relay()], "mine", ts(0)).unwrap();
    let err = orch
        .vote(&addr("alice"), id, VoteSupport::For, "", ts(11))
        .unwrap_err();
    assert_eq!(
        err,
        GovernanceError::UnauthorizedRole {
            account: addr("alice"),
            proposal: id,
            actual: Role::Proposer,
            expected: Role::Unregistered,
        }
    );
}

#[test]
fn vote_returns_snapshot_weight_and_records_role() {
    let mut orch = setup();
    let id = orch.initiate(&addr("p"), &[relay()], "q", ts(0)).unwrap();
    orch.drain_events();

    let weight = orch
        .vote(&addr("bob"), id, VoteSupport::Against, "no", ts(11))
        .unwrap();
    assert_eq!(weight, Credits::new(40));
    assert_eq!(orch.role_of(id, &addr("bob")), Role::Voter);
    assert_eq!(
        orch.last_action_timestamp(&addr("bob"), ActionKind::Vote),
        Some(ts(11))
    );
    assert!(matches!(
        orch.drain_events().as_slice(),
        [GovernanceEvent::Voted { support: VoteSupport::Against, .. }]
    ));

    let err = orch
        .vote(&addr("bob"), id, VoteSupport::For, "", ts(100))
        .unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::UnauthorizedRole { actual: Role::Voter, .. }
    ));
}

#[test]
fn vote_cooldown_spans_proposals() {
    let mut orch = setup();
    let a = orch.initiate(&addr("p"), &[relay()], "a", ts(0)).unwrap();
    let b = orch.initiate(&addr("q"), &[relay()], "b", ts(0)).unwrap();

    orch.vote(&addr("alice"), a, VoteSupport::For, "", ts(11)).unwrap();
    let err = orch
        .vote(&addr("alice"), b, VoteSupport::For, "", ts(20))
        .unwrap_err();
    assert!(matches!(err, GovernanceError::ActionOnCooldown { kind: ActionKind::Vote, .. }));
    assert_eq!(orch.role_of(b, &addr("alice")), Role::Unregistered);

    orch.vote(&addr("alice"), b, VoteSupport::For, "", ts(72)).unwrap();
}

#[test]
fn voting_closes_with_the_window() {
    let mut orch = setup();
    let id = orch.initiate(&addr("p"), &[relay()], "q", ts(0)).unwrap();

    let early = orch
        .vote(&addr("alice"), id, VoteSupport::For, "", ts(10))
        .unwrap_err();
    assert!(matches!(early, GovernanceError::Queue(QueueError::UnexpectedState { .. })));

    let late = orch
        .vote(&addr("alice"), id, VoteSupport::For, "", ts(111))
        .unwrap_err();
    assert!(matches!(late, GovernanceError::Queue(QueueError::UnexpectedState { .. })));
    assert_eq!(orch.role_of(id, &addr("alice")), Role::Unregistered);
    assert_eq!(orch.last_action_timestamp(&addr("alice"), ActionKind::Vote), None);
}

#[test]
fn delegated_weight_votes_through_delegatee() {
    let mut orch = setup();
    orch.delegate(&addr("alice"), &addr("bob"), ts(1)).unwrap();
    let id = orch.initiate(&addr("p"), &[relay()], "q", ts(5)).unwrap();
    let weight = orch
        .vote(&addr("bob"), id, VoteSupport::For, "", ts(16))
        .unwrap();
    assert_eq!(weight, Credits::new(100));
}

// ── Execution ───────────────────────────────────────────────────────────

#[test]
fn executed_proposal_pays_proposer_and_relays_calls() {
    let mut orch = setup();
    let calls = vec![
        self_call(SelfCall::ClaimProposerReward { account: addr("pat") }),
        relay(),
    ];
    let id = pass(&mut orch, "pat", &calls, "reward pat", 0);
    orch.drain_events();

    let err = orch.execute(&calls, "reward pat", ts(160)).unwrap_err();
    assert!(matches!(err, GovernanceError::Queue(QueueError::NotReady { .. })));
    assert_eq!(orch.balance_of(&addr("pat")), Credits::ZERO);

    assert_eq!(orch.execute(&calls, "reward pat", ts(161)).unwrap(), id);
    assert_eq!(orch.balance_of(&addr("pat")), Credits::new(100));
    assert_eq!(orch.execution_timestamp(id), Some(ts(161)));
    assert_eq!(orch.proposal_state(id, ts(162)).unwrap(), ProposalState::Executed);
    assert_eq!(orch.proposal_eta(id), Some(ts(161)));
    assert_eq!(orch.queue().proposal_eta(id), orch.proposal_eta(id));

    let events = orch.drain_events();
    assert!(matches!(
        events.as_slice(),
        [
            GovernanceEvent::ProposerRewarded { .. },
            GovernanceEvent::CallRelayed { .. },
            GovernanceEvent::Executed { .. },
        ]
    ));
    if let GovernanceEvent::CallRelayed { calldata, .. } = &events[1] {
        assert_eq!(calldata, &hex::encode(b"plant"));
    }
}

#[test]
fn execute_requires_queued_state() {
    let mut orch = setup();
    let calls = vec![relay()];
    let id = orch.initiate(&addr("p"), &calls, "q", ts(0)).unwrap();
    orch.vote(&addr("alice"), id, VoteSupport::For, "", ts(11)).unwrap();

    let err = orch.execute(&calls, "q", ts(111)).unwrap_err();
    assert_eq!(
        err,
        GovernanceError::InvalidProposalState {
            proposal: id,
            expected: ProposalState::Queued,
            actual: ProposalState::Succeeded,
        }
    );
}

#[test]
fn undecodable_self_call_fails_before_any_effect() {
    let mut orch = setup();
    let calls = vec![relay(), Call::new(addr(GOV), 0, vec![0xff; 4])];
    let id = pass(&mut orch, "p", &calls, "garbage", 0);
    orch.drain_events();

    let err = orch.execute(&calls, "garbage", ts(200)).unwrap_err();
    assert!(matches!(err, GovernanceError::InvalidCalldata(_)));
    assert_eq!(orch.proposal_state(id, ts(200)).unwrap(), ProposalState::Queued);
    assert!(orch.drain_events().is_empty());
}

#[test]
fn failed_execution_unwinds_every_effect() {
    let mut orch = setup();
    let calls = vec![
        self_call(SelfCall::ClaimProposerReward { account: addr("pat") }),
        self_call(SelfCall::SetMintAccess {
            account: addr("bob"),
            allowed: true,
        }),
        self_call(SelfCall::SetItemUri {
            item: ItemId::new(99),
            uri: "ipfs://missing".into(),
        }),
    ];
    let id = pass(&mut orch, "pat", &calls, "doomed", 0);
    orch.drain_events();

    let err = orch.execute(&calls, "doomed", ts(200)).unwrap_err();
    assert_eq!(err, GovernanceError::Item(ItemError::UnknownItem(ItemId::new(99))));

    assert_eq!(orch.balance_of(&addr("pat")), Credits::ZERO);
    assert!(!orch.is_authorized_minter(&addr("bob")));
    assert_eq!(orch.execution_timestamp(id), None);
    assert_eq!(orch.proposal_state(id, ts(200)).unwrap(), ProposalState::Queued);
    assert!(orch.drain_events().is_empty());
}

#[test]
fn governance_can_grant_mint_access_and_set_uris() {
    let mut orch = setup();
    orch.mint(
        &addr("curator"),
        &[ItemId::new(1)],
        &[3],
        &[Credits::new(5)],
        &["ipfs://old".to_string()],
    )
    .unwrap();

    let calls = vec![
        self_call(SelfCall::SetMintAccess {
            account: addr("bob"),
            allowed: true,
        }),
        self_call(SelfCall::SetMintAccess {
            account: addr("curator"),
            allowed: false,
        }),
        self_call(SelfCall::SetItemUri {
            item: ItemId::new(1),
            uri: "ipfs://new".into(),
        }),
    ];
    pass(&mut orch, "p", &calls, "reshuffle", 0);
    orch.execute(&calls, "reshuffle", ts(161)).unwrap();

    assert!(orch.is_authorized_minter(&addr("bob")));
    assert!(!orch.is_authorized_minter(&addr("curator")));
    assert_eq!(orch.metadata_uri(ItemId::new(1)).as_deref(), Some("ipfs://new"));
}

// ── Cancellation ────────────────────────────────────────────────────────

#[test]
fn only_the_proposer_cancels_and_ids_stay_taken() {
    let mut orch = setup();
    let calls = vec![relay()];
    let id = orch.initiate(&addr("p"), &calls, "q", ts(0)).unwrap();

    let err = orch.cancel(&addr("alice"), &calls, "q", ts(1)).unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::UnauthorizedRole { expected: Role::Proposer, .. }
    ));

    assert_eq!(orch.cancel(&addr("p"), &calls, "q", ts(2)).unwrap(), id);
    assert_eq!(orch.proposal_state(id, ts(3)).unwrap(), ProposalState::Canceled);
    assert!(orch.proposal_exists(id));

    let err = orch.initiate(&addr("p"), &calls, "q", ts(100)).unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::InvalidProposalExistence { exists: true, .. }
    ));
}

#[test]
fn executed_proposal_cannot_be_canceled() {
    let mut orch = setup();
    let calls = vec![relay()];
    let id = pass(&mut orch, "p", &calls, "done", 0);
    orch.execute(&calls, "done", ts(161)).unwrap();

    let err = orch.cancel(&addr("p"), &calls, "done", ts(170)).unwrap_err();
    assert!(matches!(err, GovernanceError::Queue(QueueError::UnexpectedState { .. })));
    assert_eq!(orch.proposal_state(id, ts(170)).unwrap(), ProposalState::Executed);
}

// ── Rewards ─────────────────────────────────────────────────────────────

#[test]
fn voter_reward_after_execution_only() {
    let mut orch = setup();
    let calls = vec![relay()];
    let id = pass(&mut orch, "p", &calls, "q", 0);

    let err = orch.claim_voter_reward(&addr("alice"), id, ts(150)).unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::InvalidProposalState { actual: ProposalState::Queued, .. }
    ));

    orch.execute(&calls, "q", ts(161)).unwrap();
    assert_eq!(
        orch.claim_voter_reward(&addr("alice"), id, ts(170)).unwrap(),
        Credits::new(10)
    );
    assert_eq!(orch.balance_of(&addr("alice")), Credits::new(70));
    assert!(orch.voter_reward_claimed(id, &addr("alice")));

    assert!(matches!(
        orch.claim_voter_reward(&addr("alice"), id, ts(171)),
        Err(GovernanceError::RewardAlreadyClaimed { .. })
    ));
    assert!(matches!(
        orch.claim_voter_reward(&addr("bob"), id, ts(171)),
        Err(GovernanceError::UnauthorizedRole { actual: Role::Unregistered, .. })
    ));
}

#[test]
fn participant_proof_scenario() {
    let mut orch = setup();
    let calls = vec![relay()];
    let id = pass(&mut orch, "p", &calls, "clean the beach", 0);
    let c = addr("carol");

    let err = orch
        .claim_participant_reward(&c, id, "x", ts(150))
        .unwrap_err();
    assert!(matches!(err, GovernanceError::InvalidProposalState { .. }));

    orch.execute(&calls, "clean the beach", ts(161)).unwrap();
    let before = orch.balance_of(&c);
    orch.claim_participant_reward(&c, id, "x", ts(200)).unwrap();
    assert_eq!(orch.balance_of(&c), before + Credits::new(50));
    assert_eq!(orch.proof_of(id, &c), Some("x"));
    assert_eq!(orch.role_of(id, &c), Role::Participant);

    let err = orch
        .claim_participant_reward(&c, id, "y", ts(201))
        .unwrap_err();
    assert_eq!(
        err,
        GovernanceError::InvalidProofExistence {
            proposal: id,
            account: c.clone()
        }
    );
    assert_eq!(orch.proof_of(id, &c), Some("x"));
}

#[test]
fn participant_deadline_edge() {
    let mut orch = setup();
    let calls = vec![relay()];
    let id = pass(&mut orch, "p", &calls, "q", 0);
    let executed = ts(161);
    orch.execute(&calls, "q", executed).unwrap();

    let deadline = executed.saturating_add_secs(QUEST_DEADLINE);
    orch.claim_participant_reward(&addr("dave"), id, "on time", deadline)
        .unwrap();

    let late = deadline.saturating_add_secs(1);
    let err = orch
        .claim_participant_reward(&addr("erin"), id, "late", late)
        .unwrap_err();
    assert_eq!(
        err,
        GovernanceError::QuestExpired {
            proposal: id,
            deadline,
            now: late,
        }
    );
    assert!(!err.is_transient());
    assert_eq!(orch.balance_of(&addr("erin")), Credits::ZERO);
}

#[test]
fn voters_keep_their_role_when_submitting_proof() {
    let mut orch = setup();
    let calls = vec![relay()];
    let id = pass(&mut orch, "p", &calls, "q", 0);
    orch.execute(&calls, "q", ts(161)).unwrap();

    orch.claim_participant_reward(&addr("alice"), id, "did it", ts(170))
        .unwrap();
    assert_eq!(orch.role_of(id, &addr("alice")), Role::Voter);
    orch.claim_voter_reward(&addr("alice"), id, ts(171)).unwrap();
    assert_eq!(orch.balance_of(&addr("alice")), Credits::new(120));
}

// ── Items ───────────────────────────────────────────────────────────────

#[test]
fn mint_with_mismatched_lengths_fails() {
    let mut orch = setup();
    let err = orch
        .mint(
            &addr("curator"),
            &[ItemId::new(1), ItemId::new(2)],
            &[1],
            &[Credits::new(5), Credits::new(5)],
            &["a".to_string(), "b".to_string()],
        )
        .unwrap_err();
    assert_eq!(
        err,
        GovernanceError::InvalidInputLength {
            ids: 2,
            values: 1,
            prices: 2,
            uris: 2,
        }
    );
    assert!(orch.price_of(ItemId::new(1)).is_err());
}

#[test]
fn mint_then_redeem() {
    let mut orch = setup();
    orch.mint(
        &addr("curator"),
        &[ItemId::new(1), ItemId::new(2)],
        &[1, 0],
        &[Credits::new(5), Credits::new(7)],
        &["a".to_string(), "b".to_string()],
    )
    .unwrap();
    assert_eq!(orch.price_of(ItemId::new(2)).unwrap(), Credits::new(7));
    assert_eq!(orch.metadata_uri(ItemId::new(1)).as_deref(), Some("a"));

    let paid = orch.redeem(&addr("alice"), ItemId::new(1), ts(5)).unwrap();
    assert_eq!(paid, Credits::new(5));
    assert_eq!(orch.balance_of(&addr("alice")), Credits::new(55));
    assert_eq!(orch.item_balance(&addr("alice"), ItemId::new(1)), 1);

    // Sold out: the burn is rolled back.
    let err = orch.redeem(&addr("alice"), ItemId::new(1), ts(6)).unwrap_err();
    assert!(matches!(err, GovernanceError::Item(ItemError::OutOfStock { .. })));
    assert_eq!(orch.balance_of(&addr("alice")), Credits::new(55));

    // Never stocked.
    assert!(orch.redeem(&addr("alice"), ItemId::new(2), ts(7)).is_err());
    assert_eq!(orch.balance_of(&addr("alice")), Credits::new(55));
    assert!(!orch.reentrancy_guard().is_entered());
}

#[test]
fn redeem_without_credits_fails() {
    let mut orch = setup();
    orch.mint(
        &addr("curator"),
        &[ItemId::new(1)],
        &[1],
        &[Credits::new(5)],
        &["a".to_string()],
    )
    .unwrap();
    let err = orch.redeem(&addr("carol"), ItemId::new(1), ts(5)).unwrap_err();
    assert!(matches!(err, GovernanceError::Ledger(_)));
    assert_eq!(orch.item_balance(&addr(GOV), ItemId::new(1)), 1);
}

/// Item registry that refuses every metadata write.
#[derive(Default)]
struct UriLockedItems {
    inner: NullItemRegistry,
}

impl ItemRegistry for UriLockedItems {
    fn mint_batch(
        &mut self,
        to: &Address,
        ids: &[ItemId],
        amounts: &[u64],
    ) -> Result<(), ItemError> {
        self.inner.mint_batch(to, ids, amounts)
    }

    fn burn_batch(
        &mut self,
        from: &Address,
        ids: &[ItemId],
        amounts: &[u64],
    ) -> Result<(), ItemError> {
        self.inner.burn_batch(from, ids, amounts)
    }

    fn delist(&mut self, id: ItemId) -> Result<(), ItemError> {
        self.inner.delist(id)
    }

    fn set_price(&mut self, id: ItemId, price: Credits) -> Result<(), ItemError> {
        self.inner.set_price(id, price)
    }

    fn set_metadata_uri(&mut self, id: ItemId, _: &str) -> Result<(), ItemError> {
        Err(ItemError::UnknownItem(id))
    }

    fn clear_metadata_uri(&mut self, id: ItemId) -> Result<(), ItemError> {
        self.inner.clear_metadata_uri(id)
    }

    fn metadata_uri(&self, id: ItemId) -> Option<String> {
        self.inner.metadata_uri(id)
    }

    fn price_of(&self, id: ItemId) -> Result<Credits, ItemError> {
        self.inner.price_of(id)
    }

    fn supply_of(&self, holder: &Address, id: ItemId) -> u64 {
        self.inner.supply_of(holder, id)
    }

    fn transfer_one(&mut self, from: &Address, id: ItemId, to: &Address) -> Result<(), ItemError> {
        self.inner.transfer_one(from, id, to)
    }
}

#[test]
fn failed_mint_leaves_no_sellable_stock() {
    let mut orch = setup_with_items(UriLockedItems::default());
    let id = ItemId::new(1);
    let err = orch
        .mint(
            &addr("curator"),
            &[id, id],
            &[3, 2],
            &[Credits::new(5), Credits::new(6)],
            &["a".to_string(), "b".to_string()],
        )
        .unwrap_err();
    assert_eq!(err, GovernanceError::Item(ItemError::UnknownItem(id)));

    assert_eq!(orch.item_balance(&addr(GOV), id), 0);
    assert_eq!(
        orch.price_of(id),
        Err(GovernanceError::Item(ItemError::UnknownItem(id)))
    );
    assert!(orch.redeem(&addr("alice"), id, ts(1)).is_err());
    assert_eq!(orch.balance_of(&addr("alice")), Credits::new(60));
    assert!(orch.drain_events().is_empty());
}

#[test]
fn failed_restock_restores_existing_item() {
    let mut items = UriLockedItems::default();
    let id = ItemId::new(7);
    items.inner.mint_batch(&addr(GOV), &[id], &[2]).unwrap();
    items.inner.set_price(id, Credits::new(4)).unwrap();
    items.inner.set_metadata_uri(id, "ipfs://old").unwrap();
    let mut orch = setup_with_items(items);

    assert!(orch
        .mint(
            &addr("curator"),
            &[id],
            &[3],
            &[Credits::new(9)],
            &["ipfs://new".to_string()],
        )
        .is_err());

    assert_eq!(orch.item_balance(&addr(GOV), id), 2);
    assert_eq!(orch.items().inner.minted(id), 2);
    assert_eq!(orch.price_of(id), Ok(Credits::new(4)));
    assert_eq!(orch.metadata_uri(id).as_deref(), Some("ipfs://old"));
}

// ── Reentrancy ──────────────────────────────────────────────────────────

/// Item registry that tries to re-enter the guarded region while transferring.
#[derive(Default)]
struct HostileItems {
    inner: NullItemRegistry,
    guard: Option<ReentrancyGuard>,
    fail_transfer: bool,
    reentry_attempts: Vec<Result<(), GovernanceError>>,
}

impl ItemRegistry for HostileItems {
    fn mint_batch(
        &mut self,
        to: &Address,
        ids: &[ItemId],
        amounts: &[u64],
    ) -> Result<(), ItemError> {
        self.inner.mint_batch(to, ids, amounts)
    }

    fn burn_batch(
        &mut self,
        from: &Address,
        ids: &[ItemId],
        amounts: &[u64],
    ) -> Result<(), ItemError> {
        self.inner.burn_batch(from, ids, amounts)
    }

    fn delist(&mut self, id: ItemId) -> Result<(), ItemError> {
        self.inner.delist(id)
    }

    fn set_price(&mut self, id: ItemId, price: Credits) -> Result<(), ItemError> {
        self.inner.set_price(id, price)
    }

    fn set_metadata_uri(&mut self, id: ItemId, uri: &str) -> Result<(), ItemError> {
        self.inner.set_metadata_uri(id, uri)
    }

    fn clear_metadata_uri(&mut self, id: ItemId) -> Result<(), ItemError> {
        self.inner.clear_metadata_uri(id)
    }

    fn metadata_uri(&self, id: ItemId) -> Option<String> {
        self.inner.metadata_uri(id)
    }

    fn price_of(&self, id: ItemId) -> Result<Credits, ItemError> {
        self.inner.price_of(id)
    }

    fn supply_of(&self, holder: &Address, id: ItemId) -> u64 {
        self.inner.supply_of(holder, id)
    }

    fn transfer_one(&mut self, from: &Address, id: ItemId, to: &Address) -> Result<(), ItemError> {
        if let Some(guard) = &self.guard {
            let attempt = guard.enter().map(drop);
            self.reentry_attempts.push(attempt);
        }
        if self.fail_transfer {
            return Err(ItemError::OutOfStock {
                item: id,
                holder: from.clone(),
            });
        }
        self.inner.transfer_one(from, id, to)
    }
}

fn hostile_setup(
    fail_transfer: bool,
) -> quest_governance::GovernanceOrchestrator<NullTokenLedger, NullDelayQueue, HostileItems> {
    let mut orch = setup_with_items(HostileItems {
        fail_transfer,
        ..HostileItems::default()
    });
    orch.mint(
        &addr("curator"),
        &[ItemId::new(1)],
        &[5],
        &[Credits::new(10)],
        &["a".to_string()],
    )
    .unwrap();
    let guard = orch.reentrancy_guard();
    orch.items_mut().guard = Some(guard);
    orch
}

#[test]
fn reentrant_redeem_is_refused() {
    let mut orch = hostile_setup(false);
    orch.redeem(&addr("alice"), ItemId::new(1), ts(1)).unwrap();

    assert_eq!(
        orch.items().reentry_attempts,
        vec![Err(GovernanceError::Reentrancy)]
    );
    assert!(!orch.reentrancy_guard().is_entered());
    assert_eq!(orch.balance_of(&addr("alice")), Credits::new(50));
}

#[test]
fn guard_clears_after_failed_redeem() {
    let mut orch = hostile_setup(true);
    assert!(orch.redeem(&addr("alice"), ItemId::new(1), ts(1)).is_err());
    assert!(!orch.reentrancy_guard().is_entered());
    assert_eq!(orch.balance_of(&addr("alice")), Credits::new(60));

    // The next redeem enters normally (and fails the same way).
    assert!(matches!(
        orch.redeem(&addr("alice"), ItemId::new(1), ts(2)),
        Err(GovernanceError::Item(_))
    ));
    assert_eq!(orch.items().reentry_attempts.len(), 2);
}

// ── Clock-driven walkthrough ────────────────────────────────────────────

#[test]
fn clock_driven_quest_walkthrough() {
    let clock = NullClock::new(1_000);
    let mut orch = setup();
    let calls = vec![
        self_call(SelfCall::ClaimProposerReward { account: addr("pat") }),
        relay(),
    ];

    let id = orch
        .initiate(&addr("pat"), &calls, "community garden", clock.now())
        .unwrap();
    assert_eq!(orch.proposal_state(id, clock.now()).unwrap(), ProposalState::Pending);

    clock.advance(11);
    orch.vote(&addr("alice"), id, VoteSupport::For, "", clock.now())
        .unwrap();
    orch.vote(&addr("bob"), id, VoteSupport::Abstain, "", clock.now())
        .unwrap();

    clock.advance(100);
    assert_eq!(orch.proposal_state(id, clock.now()).unwrap(), ProposalState::Succeeded);
    let eta = orch.queue_proposal(&calls, "community garden", clock.now()).unwrap();

    clock.set(eta.as_secs());
    orch.execute(&calls, "community garden", clock.now()).unwrap();
    orch.claim_voter_reward(&addr("bob"), id, clock.now()).unwrap();
    orch.claim_participant_reward(&addr("carol"), id, "photo.jpg", clock.advance(500))
        .unwrap();

    assert_eq!(orch.balance_of(&addr("pat")), Credits::new(100));
    assert_eq!(orch.balance_of(&addr("bob")), Credits::new(50));
    assert_eq!(orch.balance_of(&addr("carol")), Credits::new(50));
}
