//! Token ledger trait: balances, delegation and point-in-time voting weight.

use quest_types::{Address, Credits, Timestamp};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("caller {caller} may not mint or burn credits")]
    Unauthorized { caller: Address },

    #[error("insufficient credits for {account}: need {needed}, have {available}")]
    InsufficientBalance {
        account: Address,
        needed: Credits,
        available: Credits,
    },

    #[error("credit supply overflow")]
    Overflow,

    #[error("write at {now} precedes the latest checkpoint at {latest}")]
    StaleTimestamp { latest: Timestamp, now: Timestamp },
}

/// Read-only view of historical voting weight.
///
/// Handed to the delay queue so it can weigh votes and compute quorum without
/// owning the ledger.
pub trait VotesView {
    /// Voting weight delegated to `account` as of the last checkpoint `<= at`.
    fn balance_at(&self, account: &Address, at: Timestamp) -> Credits;

    /// Total credit supply as of the last checkpoint `<= at`.
    fn total_supply_at(&self, at: Timestamp) -> Credits;
}

/// The fungible reward-credit ledger.
///
/// `mint` and `burn` are restricted to the ledger's owner, which is the
/// governor's own identity.
pub trait TokenLedger: VotesView {
    /// Current spendable balance of `account`.
    fn balance_of(&self, account: &Address) -> Credits;

    /// Move `account`'s voting weight to `delegatee`.
    fn delegate(
        &mut self,
        account: &Address,
        delegatee: &Address,
        now: Timestamp,
    ) -> Result<(), LedgerError>;

    fn mint(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: Credits,
        now: Timestamp,
    ) -> Result<(), LedgerError>;

    fn burn(
        &mut self,
        caller: &Address,
        from: &Address,
        amount: Credits,
        now: Timestamp,
    ) -> Result<(), LedgerError>;
}
