//! Per-account, per-action-kind throttling.
//!
//! An account may repeat an action of kind `K` only once `now` lies strictly
//! after its last recorded action of that kind plus the period for `K`.
//! Accounts with no record have never acted and are always admitted.

use crate::error::GovernanceError;
use quest_types::{ActionKind, Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cooldown length per action kind, fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownPeriods {
    pub propose_secs: u64,
    pub vote_secs: u64,
}

impl CooldownPeriods {
    pub fn period(&self, kind: ActionKind) -> u64 {
        match kind {
            ActionKind::Propose => self.propose_secs,
            ActionKind::Vote => self.vote_secs,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CooldownTracker {
    periods: CooldownPeriods,
    last: HashMap<(Address, ActionKind), Timestamp>,
}

impl CooldownTracker {
    pub fn new(periods: CooldownPeriods) -> Self {
        Self {
            periods,
            last: HashMap::new(),
        }
    }

    /// Stamp `now` as the latest action of `kind` by `account`.
    pub fn record_action(&mut self, account: &Address, kind: ActionKind, now: Timestamp) {
        self.last.insert((account.clone(), kind), now);
    }

    pub fn check_cooldown(
        &self,
        account: &Address,
        kind: ActionKind,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        let Some(last) = self.last_action(account, kind) else {
            return Ok(());
        };
        let period = self.periods.period(kind);
        if last.is_past_window(period, now) {
            return Ok(());
        }
        Err(GovernanceError::ActionOnCooldown {
            account: account.clone(),
            kind,
            available_after: last.saturating_add_secs(period),
        })
    }

    pub fn last_action(&self, account: &Address, kind: ActionKind) -> Option<Timestamp> {
        self.last.get(&(account.clone(), kind)).copied()
    }
}
