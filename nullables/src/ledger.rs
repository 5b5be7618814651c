//! Nullable token ledger — balances, delegation and timestamped vote checkpoints.

use quest_interfaces::{LedgerError, TokenLedger, VotesView};
use quest_types::{Address, Credits, Timestamp};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug)]
struct Checkpoint {
    at: Timestamp,
    value: Credits,
}

/// Value of the last checkpoint at or before `at`.
fn lookup(checkpoints: &[Checkpoint], at: Timestamp) -> Credits {
    let idx = checkpoints.partition_point(|c| c.at <= at);
    if idx == 0 {
        Credits::ZERO
    } else {
        checkpoints[idx - 1].value
    }
}

/// Append a checkpoint, folding writes that land on the same second. Callers
/// reject `at` earlier than the last checkpoint.
fn write(checkpoints: &mut Vec<Checkpoint>, at: Timestamp, value: Credits) {
    match checkpoints.last_mut() {
        Some(last) if last.at == at => last.value = value,
        _ => checkpoints.push(Checkpoint { at, value }),
    }
}

/// An in-memory credit ledger with delegation-aware voting weight.
///
/// Accounts that never delegated count their own balance as voting weight.
/// Only `owner` may mint or burn.
pub struct NullTokenLedger {
    owner: Address,
    balances: HashMap<Address, Credits>,
    delegates: HashMap<Address, Address>,
    vote_checkpoints: HashMap<Address, Vec<Checkpoint>>,
    supply_checkpoints: Vec<Checkpoint>,
    /// Timestamp of the most recent write.
    latest: Timestamp,
}

impl NullTokenLedger {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            balances: HashMap::new(),
            delegates: HashMap::new(),
            vote_checkpoints: HashMap::new(),
            supply_checkpoints: Vec::new(),
            latest: Timestamp::EPOCH,
        }
    }

    /// Seed a genesis balance (checkpointed at the epoch).
    pub fn with_balance(mut self, account: &Address, amount: u128) -> Self {
        let owner = self.owner.clone();
        self.mint(&owner, account, Credits::new(amount), Timestamp::EPOCH)
            .expect("genesis balances overflow the credit supply");
        self
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// The account currently receiving `account`'s voting weight.
    pub fn delegatee_of(&self, account: &Address) -> Address {
        self.delegates
            .get(account)
            .cloned()
            .unwrap_or_else(|| account.clone())
    }

    /// Latest voting weight of `account`.
    pub fn current_votes(&self, account: &Address) -> Credits {
        self.vote_checkpoints
            .get(account)
            .and_then(|c| c.last())
            .map(|c| c.value)
            .unwrap_or(Credits::ZERO)
    }

    pub fn total_supply(&self) -> Credits {
        self.supply_checkpoints
            .last()
            .map(|c| c.value)
            .unwrap_or(Credits::ZERO)
    }

    fn add_votes(&mut self, delegatee: &Address, amount: Credits, now: Timestamp) {
        let current = self.current_votes(delegatee);
        let checkpoints = self.vote_checkpoints.entry(delegatee.clone()).or_default();
        write(checkpoints, now, current.checked_add(amount).unwrap_or(current));
    }

    fn sub_votes(&mut self, delegatee: &Address, amount: Credits, now: Timestamp) {
        let current = self.current_votes(delegatee);
        let checkpoints = self.vote_checkpoints.entry(delegatee.clone()).or_default();
        write(checkpoints, now, current.saturating_sub(amount));
    }

    /// History is append-only: a write may not land before the latest one.
    fn check_clock(&self, now: Timestamp) -> Result<(), LedgerError> {
        if now < self.latest {
            return Err(LedgerError::StaleTimestamp {
                latest: self.latest,
                now,
            });
        }
        Ok(())
    }

    fn check_owner(&self, caller: &Address) -> Result<(), LedgerError> {
        if caller != &self.owner {
            return Err(LedgerError::Unauthorized {
                caller: caller.clone(),
            });
        }
        Ok(())
    }
}

impl VotesView for NullTokenLedger {
    fn balance_at(&self, account: &Address, at: Timestamp) -> Credits {
        self.vote_checkpoints
            .get(account)
            .map(|c| lookup(c, at))
            .unwrap_or(Credits::ZERO)
    }

    fn total_supply_at(&self, at: Timestamp) -> Credits {
        lookup(&self.supply_checkpoints, at)
    }
}

impl TokenLedger for NullTokenLedger {
    fn balance_of(&self, account: &Address) -> Credits {
        self.balances.get(account).copied().unwrap_or(Credits::ZERO)
    }

    fn delegate(
        &mut self,
        account: &Address,
        delegatee: &Address,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.check_clock(now)?;
        let previous = self.delegatee_of(account);
        let weight = self.balance_of(account);
        if previous != *delegatee && !weight.is_zero() {
            self.sub_votes(&previous, weight, now);
            self.add_votes(delegatee, weight, now);
        }
        self.delegates.insert(account.clone(), delegatee.clone());
        self.latest = now;
        tracing::trace!(%account, %delegatee, "delegated voting weight");
        Ok(())
    }

    fn mint(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: Credits,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.check_owner(caller)?;
        self.check_clock(now)?;
        let supply = self
            .total_supply()
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.balances.insert(to.clone(), balance);
        write(&mut self.supply_checkpoints, now, supply);
        let delegatee = self.delegatee_of(to);
        self.add_votes(&delegatee, amount, now);
        self.latest = now;
        Ok(())
    }

    fn burn(
        &mut self,
        caller: &Address,
        from: &Address,
        amount: Credits,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.check_owner(caller)?;
        self.check_clock(now)?;
        let available = self.balance_of(from);
        let remaining =
            available
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::InsufficientBalance {
                    account: from.clone(),
                    needed: amount,
                    available,
                })?;

        self.balances.insert(from.clone(), remaining);
        let supply = self.total_supply().saturating_sub(amount);
        write(&mut self.supply_checkpoints, now, supply);
        let delegatee = self.delegatee_of(from);
        self.sub_votes(&delegatee, amount, now);
        self.latest = now;
        Ok(())
    }
}
