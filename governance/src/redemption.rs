//! Credit-for-item exchange.
//!
//! Burn first, then move one unit out of the governor's custody. If the
//! transfer fails the burned credits are minted back before the error is
//! returned, so the caller's balance is exactly what it was.

use crate::error::GovernanceError;
use quest_interfaces::{ItemRegistry, TokenLedger};
use quest_types::{Address, Credits, ItemId, Timestamp};

pub struct RedemptionEngine;

impl RedemptionEngine {
    /// Exchange `price_of(item)` credits from `account` for one unit of `item`
    /// held by `custodian`. Returns the price paid.
    pub fn redeem<L, R>(
        &self,
        ledger: &mut L,
        items: &mut R,
        custodian: &Address,
        account: &Address,
        item: ItemId,
        now: Timestamp,
    ) -> Result<Credits, GovernanceError>
    where
        L: TokenLedger,
        R: ItemRegistry,
    {
        let price = items.price_of(item)?;
        ledger.burn(custodian, account, price, now)?;

        if let Err(e) = items.transfer_one(custodian, item, account) {
            tracing::warn!(
                %account,
                %item,
                %price,
                error = %e,
                "item transfer failed, restoring burned credits"
            );
            if let Err(rollback) = ledger.mint(custodian, account, price, now) {
                tracing::error!(%account, %price, error = %rollback, "credit restore failed");
                return Err(rollback.into());
            }
            return Err(e.into());
        }

        tracing::debug!(%account, %item, %price, "item redeemed");
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_interfaces::{ItemError, LedgerError};
    use quest_nullables::{NullItemRegistry, NullTokenLedger};

    fn setup(stock: u64) -> (NullTokenLedger, NullItemRegistry, Address, Address) {
        let gov = Address::new("gov");
        let alice = Address::new("alice");
        let ledger = NullTokenLedger::new(gov.clone()).with_balance(&alice, 20);
        let mut items = NullItemRegistry::new();
        items.mint_batch(&gov, &[ItemId::new(1)], &[stock]).unwrap();
        items.set_price(ItemId::new(1), Credits::new(15)).unwrap();
        (ledger, items, gov, alice)
    }

    #[test]
    fn redeem_burns_price_and_moves_one_unit() {
        let (mut ledger, mut items, gov, alice) = setup(3);
        let paid = RedemptionEngine
            .redeem(&mut ledger, &mut items, &gov, &alice, ItemId::new(1), Timestamp::new(5))
            .unwrap();

        assert_eq!(paid, Credits::new(15));
        assert_eq!(ledger.balance_of(&alice), Credits::new(5));
        assert_eq!(items.supply_of(&alice, ItemId::new(1)), 1);
        assert_eq!(items.supply_of(&gov, ItemId::new(1)), 2);
    }

    #[test]
    fn sold_out_item_restores_the_burn() {
        let (mut ledger, mut items, gov, alice) = setup(0);
        let err = RedemptionEngine
            .redeem(&mut ledger, &mut items, &gov, &alice, ItemId::new(1), Timestamp::new(5))
            .unwrap_err();

        assert!(matches!(err, GovernanceError::Item(ItemError::OutOfStock { .. })));
        assert_eq!(ledger.balance_of(&alice), Credits::new(20));
        assert_eq!(ledger.total_supply(), Credits::new(20));
        assert_eq!(items.supply_of(&alice, ItemId::new(1)), 0);
    }

    #[test]
    fn insufficient_credits_leave_stock_untouched() {
        let (mut ledger, mut items, gov, alice) = setup(1);
        ledger
            .burn(&gov, &alice, Credits::new(10), Timestamp::new(1))
            .unwrap();

        let err = RedemptionEngine
            .redeem(&mut ledger, &mut items, &gov, &alice, ItemId::new(1), Timestamp::new(5))
            .unwrap_err();
        assert!(matches!(
            err,
            GovernanceError::Ledger(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(items.supply_of(&gov, ItemId::new(1)), 1);
    }

    #[test]
    fn unknown_item_fails_before_any_burn() {
        let (mut ledger, mut items, gov, alice) = setup(1);
        let err = RedemptionEngine
            .redeem(&mut ledger, &mut items, &gov, &alice, ItemId::new(99), Timestamp::new(5))
            .unwrap_err();
        assert_eq!(err, GovernanceError::Item(ItemError::UnknownItem(ItemId::new(99))));
        assert_eq!(ledger.balance_of(&alice), Credits::new(20));
    }
}
