//! Governance orchestrator — composes cooldowns, the proposal registry, reward
//! issuance and redemption over the external token ledger, delay queue and
//! item registry.
//!
//! Every mutating operation either completes in full or returns an error with
//! no effect left behind. Checks run first, then the collaborator call that can
//! still fail, then local bookkeeping that cannot. Operations that make several
//! fallible collaborator calls (`execute`, `mint`) journal each applied effect
//! and unwind the journal on failure.

use crate::calls::SelfCall;
use crate::config::GovernanceConfig;
use crate::cooldown::CooldownTracker;
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;
use crate::guard::ReentrancyGuard;
use crate::redemption::RedemptionEngine;
use crate::registry::ProposalRegistry;
use crate::rewards::{CallOrigin, RewardIssuer, Treasury};
use quest_interfaces::{DelayQueue, ItemRegistry, TokenLedger};
use quest_types::{
    ActionKind, Address, Call, Credits, ItemId, ProposalId, ProposalState, Role, Timestamp,
    VoteSupport,
};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Inverse of one applied effect.
#[derive(Debug)]
enum Undo {
    Minted {
        account: Address,
        amount: Credits,
        at: Timestamp,
    },
    MintAccess {
        account: Address,
        previous: bool,
    },
    /// The item did not exist before this operation.
    ItemListed {
        item: ItemId,
    },
    ItemStock {
        item: ItemId,
        amount: u64,
    },
    ItemPrice {
        item: ItemId,
        previous: Credits,
    },
    ItemUri {
        item: ItemId,
        previous: Option<String>,
    },
}

/// Context of the proposal currently being executed.
struct Execution {
    proposal: ProposalId,
    journal: Vec<Undo>,
}

enum Step {
    Dispatch(SelfCall),
    Relay(Call),
}

pub struct GovernanceOrchestrator<L, Q, R> {
    governor: Address,
    ledger: L,
    queue: Q,
    items: R,
    cooldowns: CooldownTracker,
    registry: ProposalRegistry,
    rewards: RewardIssuer,
    redemption: RedemptionEngine,
    minters: BTreeSet<Address>,
    guard: ReentrancyGuard,
    execution: Option<Execution>,
    /// Pending events for the embedding layer to drain.
    pending_events: Vec<GovernanceEvent>,
}

impl<L, Q, R> GovernanceOrchestrator<L, Q, R>
where
    L: TokenLedger,
    Q: DelayQueue,
    R: ItemRegistry,
{
    /// The ledger must accept `config.governor` as its minting authority and
    /// the item registry must hold redeemable stock in the governor's custody.
    pub fn new(config: &GovernanceConfig, ledger: L, queue: Q, items: R) -> Self {
        Self {
            governor: config.governor.clone(),
            ledger,
            queue,
            items,
            cooldowns: CooldownTracker::new(config.cooldown_periods()),
            registry: ProposalRegistry::new(),
            rewards: RewardIssuer::new(config.reward_schedule(), config.quest_deadline_secs),
            redemption: RedemptionEngine,
            minters: config.minters.iter().cloned().collect(),
            guard: ReentrancyGuard::new(),
            execution: None,
            pending_events: Vec::new(),
        }
    }

    // ── Proposal lifecycle ──────────────────────────────────────────────

    /// Create a proposal with `caller` as its Proposer.
    pub fn initiate(
        &mut self,
        caller: &Address,
        calls: &[Call],
        description: &str,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        self.cooldowns
            .check_cooldown(caller, ActionKind::Propose, now)?;
        let expected = self.queue.hash_proposal(calls, description);
        self.registry.check_existence(expected, false)?;

        let id = self
            .queue
            .propose(caller, calls, description, &self.ledger, now)?;
        self.registry.register_existence(id);
        self.registry.assign_role(id, caller, Role::Proposer)?;
        self.cooldowns
            .record_action(caller, ActionKind::Propose, now);

        info!(proposal = %id, proposer = %caller, calls = calls.len(), "proposal created");
        self.emit(GovernanceEvent::Proposed {
            proposal: id,
            proposer: caller.clone(),
            description: description.to_string(),
            at: now,
        });
        Ok(id)
    }

    /// Cast `caller`'s vote and return the weight counted for it.
    ///
    /// Accounts holding any role on the proposal, its proposer included, are
    /// refused with `UnauthorizedRole`.
    pub fn vote(
        &mut self,
        caller: &Address,
        proposal: ProposalId,
        support: VoteSupport,
        reason: &str,
        now: Timestamp,
    ) -> Result<Credits, GovernanceError> {
        self.registry.check_existence(proposal, true)?;
        self.cooldowns.check_cooldown(caller, ActionKind::Vote, now)?;
        self.registry
            .check_role(proposal, caller, Role::Unregistered)?;

        let weight = self
            .queue
            .cast_vote(proposal, caller, support, reason, &self.ledger, now)?;
        self.registry.assign_role(proposal, caller, Role::Voter)?;
        self.cooldowns.record_action(caller, ActionKind::Vote, now);

        info!(proposal = %proposal, voter = %caller, ?support, %weight, "vote cast");
        self.emit(GovernanceEvent::Voted {
            proposal,
            voter: caller.clone(),
            support,
            weight,
            reason: reason.to_string(),
        });
        Ok(weight)
    }

    /// Move a succeeded proposal into the delay queue. Returns its eta.
    pub fn queue_proposal(
        &mut self,
        calls: &[Call],
        description: &str,
        now: Timestamp,
    ) -> Result<Timestamp, GovernanceError> {
        let id = self.queue.hash_proposal(calls, description);
        self.registry.check_existence(id, true)?;

        let eta = self.queue.queue(calls, description, &self.ledger, now)?;
        self.registry.record_eta(id, eta)?;

        info!(proposal = %id, %eta, "proposal queued");
        self.emit(GovernanceEvent::Queued { proposal: id, eta });
        Ok(eta)
    }

    /// Run a queued proposal's calls.
    ///
    /// Calls addressed to the governor are decoded as [`SelfCall`]s and
    /// dispatched with the executor as caller. Other calls are relayed as
    /// `CallRelayed` events. If anything fails, every applied effect is
    /// reversed and the events of this execution are dropped.
    pub fn execute(
        &mut self,
        calls: &[Call],
        description: &str,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        let id = self.queue.hash_proposal(calls, description);
        self.registry.check_existence(id, true)?;
        let state = self.queue.state(id, &self.ledger, now)?;
        if state != ProposalState::Queued {
            return Err(GovernanceError::InvalidProposalState {
                proposal: id,
                expected: ProposalState::Queued,
                actual: state,
            });
        }
        let steps = calls
            .iter()
            .map(|call| {
                if call.target == self.governor {
                    SelfCall::decode(&call.calldata).map(Step::Dispatch)
                } else {
                    Ok(Step::Relay(call.clone()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mark = self.pending_events.len();
        self.execution = Some(Execution {
            proposal: id,
            journal: Vec::new(),
        });
        let outcome = self.run_steps(id, steps, calls, description, now);
        let journal = self
            .execution
            .take()
            .map(|e| e.journal)
            .unwrap_or_default();

        match outcome {
            Ok(()) => {
                info!(proposal = %id, at = %now, "proposal executed");
                Ok(id)
            }
            Err(e) => {
                warn!(
                    proposal = %id,
                    error = %e,
                    undo = journal.len(),
                    "execution failed, unwinding"
                );
                self.unwind(journal);
                self.pending_events.truncate(mark);
                Err(e)
            }
        }
    }

    fn run_steps(
        &mut self,
        id: ProposalId,
        steps: Vec<Step>,
        calls: &[Call],
        description: &str,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        let executor = self.queue.executor().clone();
        for step in steps {
            match step {
                Step::Dispatch(SelfCall::ClaimProposerReward { account }) => {
                    self.claim_proposer_reward(&executor, &account, now)?;
                }
                Step::Dispatch(SelfCall::SetMintAccess { account, allowed }) => {
                    self.set_mint_access(&executor, &account, allowed)?;
                }
                Step::Dispatch(SelfCall::SetItemUri { item, uri }) => {
                    self.set_item_uri(&executor, item, &uri)?;
                }
                Step::Relay(call) => {
                    debug!(proposal = %id, target = %call.target, "relaying call");
                    self.emit(GovernanceEvent::CallRelayed {
                        proposal: id,
                        target: call.target,
                        value: call.value,
                        calldata: hex::encode(&call.calldata),
                    });
                }
            }
        }

        self.queue.execute(calls, description, &self.ledger, now)?;
        self.registry.record_execution_timestamp(id, now)?;
        self.emit(GovernanceEvent::Executed {
            proposal: id,
            at: now,
        });
        Ok(())
    }

    fn unwind(&mut self, journal: Vec<Undo>) {
        for undo in journal.into_iter().rev() {
            match undo {
                Undo::Minted {
                    account,
                    amount,
                    at,
                } => {
                    if let Err(e) = self.ledger.burn(&self.governor, &account, amount, at) {
                        tracing::error!(
                            %account,
                            %amount,
                            error = %e,
                            "failed to reverse reward mint"
                        );
                    }
                }
                Undo::MintAccess { account, previous } => {
                    if previous {
                        self.minters.insert(account);
                    } else {
                        self.minters.remove(&account);
                    }
                }
                Undo::ItemUri { item, previous } => {
                    let restored = match previous {
                        Some(uri) => self.items.set_metadata_uri(item, &uri),
                        None => self.items.clear_metadata_uri(item),
                    };
                    if let Err(e) = restored {
                        tracing::error!(%item, error = %e, "failed to restore item uri");
                    }
                }
                Undo::ItemPrice { item, previous } => {
                    if let Err(e) = self.items.set_price(item, previous) {
                        tracing::error!(%item, error = %e, "failed to restore item price");
                    }
                }
                Undo::ItemStock { item, amount } => {
                    if let Err(e) = self.items.burn_batch(&self.governor, &[item], &[amount]) {
                        tracing::error!(
                            %item,
                            amount,
                            error = %e,
                            "failed to withdraw minted stock"
                        );
                    }
                }
                Undo::ItemListed { item } => {
                    if let Err(e) = self.items.delist(item) {
                        tracing::error!(%item, error = %e, "failed to delist item");
                    }
                }
            }
        }
    }

    /// Cancel a proposal that has not been executed. Proposer only.
    pub fn cancel(
        &mut self,
        caller: &Address,
        calls: &[Call],
        description: &str,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        let id = self.queue.hash_proposal(calls, description);
        self.registry.check_existence(id, true)?;
        self.registry.check_role(id, caller, Role::Proposer)?;

        let id = self.queue.cancel(calls, description, &self.ledger, now)?;

        info!(proposal = %id, by = %caller, "proposal canceled");
        self.emit(GovernanceEvent::Canceled { proposal: id });
        Ok(id)
    }

    // ── Governance-only effects ─────────────────────────────────────────

    fn origin(&self, caller: &Address) -> CallOrigin {
        match &self.execution {
            Some(exec) if caller == self.queue.executor() => CallOrigin::Governance {
                proposal: exec.proposal,
            },
            _ => CallOrigin::External {
                caller: caller.clone(),
            },
        }
    }

    fn journal(&mut self, undo: Undo) {
        if let Some(exec) = self.execution.as_mut() {
            exec.journal.push(undo);
        }
    }

    /// Pay the proposer reward to `account`. Only reachable from a call in an
    /// executing proposal; any other caller gets `OnlyGovernance`.
    pub fn claim_proposer_reward(
        &mut self,
        caller: &Address,
        account: &Address,
        now: Timestamp,
    ) -> Result<Credits, GovernanceError> {
        let origin = self.origin(caller);
        let proposal = origin.require_governance()?;
        let mut treasury = Treasury {
            ledger: &mut self.ledger,
            authority: &self.governor,
        };
        let amount = self
            .rewards
            .issue_proposer_reward(&origin, &mut treasury, account, now)?;
        self.journal(Undo::Minted {
            account: account.clone(),
            amount,
            at: now,
        });

        info!(proposal = %proposal, %account, %amount, "proposer rewarded");
        self.emit(GovernanceEvent::ProposerRewarded {
            proposal,
            account: account.clone(),
            amount,
        });
        Ok(amount)
    }

    pub fn set_mint_access(
        &mut self,
        caller: &Address,
        account: &Address,
        allowed: bool,
    ) -> Result<(), GovernanceError> {
        self.origin(caller).require_governance()?;
        let previous = if allowed {
            !self.minters.insert(account.clone())
        } else {
            self.minters.remove(account)
        };
        self.journal(Undo::MintAccess {
            account: account.clone(),
            previous,
        });

        info!(%account, allowed, "mint access changed");
        self.emit(GovernanceEvent::MintAccessChanged {
            account: account.clone(),
            allowed,
        });
        Ok(())
    }

    pub fn set_item_uri(
        &mut self,
        caller: &Address,
        item: ItemId,
        uri: &str,
    ) -> Result<(), GovernanceError> {
        self.origin(caller).require_governance()?;
        let previous = self.items.metadata_uri(item);
        self.items.set_metadata_uri(item, uri)?;
        self.journal(Undo::ItemUri { item, previous });

        info!(%item, uri, "item uri changed");
        self.emit(GovernanceEvent::ItemUriChanged {
            item,
            uri: uri.to_string(),
        });
        Ok(())
    }

    // ── Rewards ─────────────────────────────────────────────────────────

    /// Voter reward for an executed proposal, once per voter.
    pub fn claim_voter_reward(
        &mut self,
        caller: &Address,
        proposal: ProposalId,
        now: Timestamp,
    ) -> Result<Credits, GovernanceError> {
        self.registry.check_existence(proposal, true)?;
        let state = self.queue.state(proposal, &self.ledger, now)?;
        let mut treasury = Treasury {
            ledger: &mut self.ledger,
            authority: &self.governor,
        };
        let amount = self.rewards.issue_voter_reward(
            &self.registry,
            state,
            &mut treasury,
            proposal,
            caller,
            now,
        )?;

        info!(proposal = %proposal, account = %caller, %amount, "voter rewarded");
        self.emit(GovernanceEvent::VoterRewarded {
            proposal,
            account: caller.clone(),
            amount,
        });
        Ok(amount)
    }

    /// Submit `proof` of quest completion and collect the participant reward.
    pub fn claim_participant_reward(
        &mut self,
        caller: &Address,
        proposal: ProposalId,
        proof: &str,
        now: Timestamp,
    ) -> Result<Credits, GovernanceError> {
        self.registry.check_existence(proposal, true)?;
        let state = self.queue.state(proposal, &self.ledger, now)?;
        let mut treasury = Treasury {
            ledger: &mut self.ledger,
            authority: &self.governor,
        };
        let amount = self.rewards.issue_participant_reward(
            &mut self.registry,
            state,
            &mut treasury,
            proposal,
            caller,
            proof,
            now,
        )?;

        info!(proposal = %proposal, account = %caller, %amount, "participant rewarded");
        self.emit(GovernanceEvent::ParticipantRewarded {
            proposal,
            account: caller.clone(),
            amount,
            proof: proof.to_string(),
        });
        Ok(amount)
    }

    // ── Items ───────────────────────────────────────────────────────────

    /// Exchange credits for one unit of `item`. Non-reentrant.
    pub fn redeem(
        &mut self,
        caller: &Address,
        item: ItemId,
        now: Timestamp,
    ) -> Result<Credits, GovernanceError> {
        let _entered = self.guard.enter()?;
        let price = self.redemption.redeem(
            &mut self.ledger,
            &mut self.items,
            &self.governor,
            caller,
            item,
            now,
        )?;

        info!(account = %caller, %item, %price, "item redeemed");
        self.emit(GovernanceEvent::Redeemed {
            account: caller.clone(),
            item,
            price,
        });
        Ok(price)
    }

    /// Mint `values[i]` units of `ids[i]` into the governor's custody, priced at
    /// `prices[i]` with metadata `uris[i]`.
    pub fn mint(
        &mut self,
        caller: &Address,
        ids: &[ItemId],
        values: &[u64],
        prices: &[Credits],
        uris: &[String],
    ) -> Result<(), GovernanceError> {
        if !self.minters.contains(caller) {
            return Err(GovernanceError::MintAccessDenied {
                caller: caller.clone(),
            });
        }
        let n = ids.len();
        if values.len() != n || prices.len() != n || uris.len() != n {
            return Err(GovernanceError::InvalidInputLength {
                ids: n,
                values: values.len(),
                prices: prices.len(),
                uris: uris.len(),
            });
        }

        let mut journal = Vec::new();
        if let Err(e) = self.stock_items(ids, values, prices, uris, &mut journal) {
            warn!(minter = %caller, error = %e, undo = journal.len(), "mint failed, unwinding");
            self.unwind(journal);
            return Err(e);
        }

        info!(minter = %caller, items = n, "items minted");
        self.emit(GovernanceEvent::ItemsMinted {
            minter: caller.clone(),
            ids: ids.to_vec(),
            values: values.to_vec(),
        });
        Ok(())
    }

    fn stock_items(
        &mut self,
        ids: &[ItemId],
        values: &[u64],
        prices: &[Credits],
        uris: &[String],
        journal: &mut Vec<Undo>,
    ) -> Result<(), GovernanceError> {
        let unlisted: BTreeSet<ItemId> = ids
            .iter()
            .copied()
            .filter(|id| self.items.price_of(*id).is_err())
            .collect();

        self.items.mint_batch(&self.governor, ids, values)?;
        for (id, value) in ids.iter().zip(values) {
            if !unlisted.contains(id) {
                journal.push(Undo::ItemStock {
                    item: *id,
                    amount: *value,
                });
            }
        }
        journal.extend(unlisted.into_iter().map(|item| Undo::ItemListed { item }));

        for ((id, price), uri) in ids.iter().zip(prices).zip(uris) {
            let previous = self.items.price_of(*id)?;
            self.items.set_price(*id, *price)?;
            journal.push(Undo::ItemPrice {
                item: *id,
                previous,
            });

            let previous = self.items.metadata_uri(*id);
            self.items.set_metadata_uri(*id, uri)?;
            journal.push(Undo::ItemUri {
                item: *id,
                previous,
            });
        }
        Ok(())
    }

    pub fn delegate(
        &mut self,
        caller: &Address,
        delegatee: &Address,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        self.ledger.delegate(caller, delegatee, now)?;
        debug!(account = %caller, %delegatee, "voting weight delegated");
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn governor(&self) -> &Address {
        &self.governor
    }

    pub fn proposal_exists(&self, proposal: ProposalId) -> bool {
        self.registry.exists(proposal)
    }

    pub fn role_of(&self, proposal: ProposalId, account: &Address) -> Role {
        self.registry.role_of(proposal, account)
    }

    /// `None` if `account` has never performed `kind`.
    pub fn last_action_timestamp(&self, account: &Address, kind: ActionKind) -> Option<Timestamp> {
        self.cooldowns.last_action(account, kind)
    }

    /// All proposal IDs in creation order.
    pub fn proposal_ids(&self) -> &[ProposalId] {
        self.registry.list_proposal_ids()
    }

    pub fn price_of(&self, item: ItemId) -> Result<Credits, GovernanceError> {
        Ok(self.items.price_of(item)?)
    }

    pub fn balance_of(&self, account: &Address) -> Credits {
        self.ledger.balance_of(account)
    }

    pub fn is_authorized_minter(&self, account: &Address) -> bool {
        self.minters.contains(account)
    }

    pub fn proof_of(&self, proposal: ProposalId, account: &Address) -> Option<&str> {
        self.rewards.proof_of(proposal, account)
    }

    pub fn voter_reward_claimed(&self, proposal: ProposalId, account: &Address) -> bool {
        self.rewards.voter_reward_claimed(proposal, account)
    }

    pub fn proposal_state(
        &self,
        proposal: ProposalId,
        now: Timestamp,
    ) -> Result<ProposalState, GovernanceError> {
        self.registry.check_existence(proposal, true)?;
        Ok(self.queue.state(proposal, &self.ledger, now)?)
    }

    pub fn proposal_eta(&self, proposal: ProposalId) -> Option<Timestamp> {
        self.registry.eta(proposal)
    }

    pub fn execution_timestamp(&self, proposal: ProposalId) -> Option<Timestamp> {
        self.registry.execution_timestamp(proposal)
    }

    pub fn metadata_uri(&self, item: ItemId) -> Option<String> {
        self.items.metadata_uri(item)
    }

    /// Units of `item` held by `holder`.
    pub fn item_balance(&self, holder: &Address, item: ItemId) -> u64 {
        self.items.supply_of(holder, item)
    }

    /// A handle sharing the flag that guards `redeem`.
    pub fn reentrancy_guard(&self) -> ReentrancyGuard {
        self.guard.clone()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn items(&self) -> &R {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut R {
        &mut self.items
    }

    // ── Events ──────────────────────────────────────────────────────────

    fn emit(&mut self, event: GovernanceEvent) {
        self.pending_events.push(event);
    }

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> Vec<GovernanceEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
