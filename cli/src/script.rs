//! JSON action scripts replayed against the in-memory collaborators.
//!
//! A script seeds credit balances and then lists timestamped steps. Proposals
//! are referred to by a script-local key chosen at `initiate`. Each emitted
//! event is written as one JSON line; a failed step writes an error line and
//! the replay carries on.

use crate::config::CliConfig;
use anyhow::{anyhow, Context};
use quest_governance::{GovernanceError, GovernanceOrchestrator, SelfCall};
use quest_nullables::{NullDelayQueue, NullItemRegistry, NullTokenLedger};
use quest_types::{Address, Call, Credits, ItemId, ProposalId, Timestamp, VoteSupport};
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

pub type Orchestrator = GovernanceOrchestrator<NullTokenLedger, NullDelayQueue, NullItemRegistry>;

#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub balances: BTreeMap<Address, u64>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    /// Seconds since the epoch at which the step runs.
    pub at: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptCall {
    /// A call to an outside target, relayed on execution.
    Relay {
        target: Address,
        #[serde(default)]
        value: u64,
        #[serde(default)]
        calldata_hex: String,
    },
    /// A call back into the governor.
    Governance(SelfCall),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Initiate {
        caller: Address,
        key: String,
        calls: Vec<ScriptCall>,
        description: String,
    },
    Vote {
        caller: Address,
        proposal: String,
        support: VoteSupport,
        #[serde(default)]
        reason: String,
    },
    Queue {
        proposal: String,
    },
    Execute {
        proposal: String,
    },
    Cancel {
        caller: Address,
        proposal: String,
    },
    Redeem {
        caller: Address,
        item: ItemId,
    },
    ClaimVoter {
        caller: Address,
        proposal: String,
    },
    ClaimParticipant {
        caller: Address,
        proposal: String,
        proof: String,
    },
    Mint {
        caller: Address,
        ids: Vec<ItemId>,
        values: Vec<u64>,
        prices: Vec<u64>,
        uris: Vec<String>,
    },
    Delegate {
        caller: Address,
        delegatee: Address,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initiate { .. } => "initiate",
            Self::Vote { .. } => "vote",
            Self::Queue { .. } => "queue",
            Self::Execute { .. } => "execute",
            Self::Cancel { .. } => "cancel",
            Self::Redeem { .. } => "redeem",
            Self::ClaimVoter { .. } => "claim_voter",
            Self::ClaimParticipant { .. } => "claim_participant",
            Self::Mint { .. } => "mint",
            Self::Delegate { .. } => "delegate",
        }
    }
}

/// Outcome counts of one replay.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub steps: usize,
    pub failed: usize,
    pub events: usize,
}

struct Proposal {
    id: ProposalId,
    calls: Vec<Call>,
    description: String,
}

pub struct Simulation {
    orchestrator: Orchestrator,
    proposals: HashMap<String, Proposal>,
}

impl Simulation {
    pub fn new(config: &CliConfig, balances: &BTreeMap<Address, u64>) -> Self {
        let governor = config.governance.governor.clone();
        let ledger = balances
            .iter()
            .fold(NullTokenLedger::new(governor), |ledger, (account, amount)| {
                ledger.with_balance(account, u128::from(*amount))
            });
        let queue = NullDelayQueue::new(config.queue.clone(), config.executor.clone());
        let orchestrator =
            GovernanceOrchestrator::new(&config.governance, ledger, queue, NullItemRegistry::new());
        Self {
            orchestrator,
            proposals: HashMap::new(),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    #[cfg(test)]
    pub fn proposal_id(&self, key: &str) -> Option<ProposalId> {
        self.proposals.get(key).map(|p| p.id)
    }

    fn resolve_calls(&self, calls: &[ScriptCall]) -> anyhow::Result<Vec<Call>> {
        let governor = self.orchestrator.governor();
        calls
            .iter()
            .map(|call| -> anyhow::Result<Call> {
                match call {
                    ScriptCall::Relay {
                        target,
                        value,
                        calldata_hex,
                    } => {
                        let calldata = hex::decode(calldata_hex)
                            .with_context(|| format!("bad calldata for {target}"))?;
                        Ok(Call::new(target.clone(), u128::from(*value), calldata))
                    }
                    ScriptCall::Governance(self_call) => Ok(self_call.clone().into_call(governor)?),
                }
            })
            .collect()
    }

    /// Apply one step.
    pub fn apply(&mut self, step: &Step) -> anyhow::Result<()> {
        let now = Timestamp::new(step.at);
        match &step.action {
            Action::Initiate {
                caller,
                key,
                calls,
                description,
            } => {
                anyhow::ensure!(
                    !self.proposals.contains_key(key),
                    "proposal key {key:?} is already in use"
                );
                let calls = self.resolve_calls(calls)?;
                let id = self
                    .orchestrator
                    .initiate(caller, &calls, description, now)?;
                self.proposals.insert(
                    key.clone(),
                    Proposal {
                        id,
                        calls,
                        description: description.clone(),
                    },
                );
            }
            Action::Vote {
                caller,
                proposal,
                support,
                reason,
            } => {
                let id = lookup(&self.proposals, proposal)?.id;
                self.orchestrator.vote(caller, id, *support, reason, now)?;
            }
            Action::Queue { proposal } => {
                let p = lookup(&self.proposals, proposal)?;
                self.orchestrator
                    .queue_proposal(&p.calls, &p.description, now)?;
            }
            Action::Execute { proposal } => {
                let p = lookup(&self.proposals, proposal)?;
                self.orchestrator.execute(&p.calls, &p.description, now)?;
            }
            Action::Cancel { caller, proposal } => {
                let p = lookup(&self.proposals, proposal)?;
                self.orchestrator
                    .cancel(caller, &p.calls, &p.description, now)?;
            }
            Action::Redeem { caller, item } => {
                self.orchestrator.redeem(caller, *item, now)?;
            }
            Action::ClaimVoter { caller, proposal } => {
                let id = lookup(&self.proposals, proposal)?.id;
                self.orchestrator.claim_voter_reward(caller, id, now)?;
            }
            Action::ClaimParticipant {
                caller,
                proposal,
                proof,
            } => {
                let id = lookup(&self.proposals, proposal)?.id;
                self.orchestrator
                    .claim_participant_reward(caller, id, proof, now)?;
            }
            Action::Mint {
                caller,
                ids,
                values,
                prices,
                uris,
            } => {
                let prices: Vec<Credits> = prices
                    .iter()
                    .map(|p| Credits::new(u128::from(*p)))
                    .collect();
                self.orchestrator.mint(caller, ids, values, &prices, uris)?;
            }
            Action::Delegate { caller, delegatee } => {
                self.orchestrator.delegate(caller, delegatee, now)?;
            }
        }
        Ok(())
    }

    /// Replay every step, writing events and step failures to `out`.
    pub fn run<W: Write>(&mut self, steps: &[Step], out: &mut W) -> anyhow::Result<RunSummary> {
        let mut summary = RunSummary::default();
        for (index, step) in steps.iter().enumerate() {
            summary.steps += 1;
            if let Err(e) = self.apply(step) {
                summary.failed += 1;
                let class = e
                    .downcast_ref::<GovernanceError>()
                    .map(|g| format!("{:?}", g.class()).to_lowercase());
                tracing::warn!(
                    step = index,
                    action = step.action.name(),
                    error = %e,
                    "step rejected"
                );
                let line = json!({
                    "step": index,
                    "at": step.at,
                    "action": step.action.name(),
                    "error": e.to_string(),
                    "class": class,
                });
                writeln!(out, "{line}")?;
            }
            for event in self.orchestrator.drain_events() {
                summary.events += 1;
                writeln!(out, "{}", serde_json::to_string(&event)?)?;
            }
        }
        Ok(summary)
    }
}

fn lookup<'a>(proposals: &'a HashMap<String, Proposal>, key: &str) -> anyhow::Result<&'a Proposal> {
    proposals
        .get(key)
        .ok_or_else(|| anyhow!("unknown proposal key {key:?}"))
}

pub fn parse_script(json: &str) -> anyhow::Result<Script> {
    serde_json::from_str(json).context("invalid action script")
}
