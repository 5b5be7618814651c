//! Nullable item registry — multi-token balances with per-item price and URI.

use quest_interfaces::{ItemError, ItemRegistry};
use quest_types::{Address, Credits, ItemId};
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
struct ItemRecord {
    price: Credits,
    uri: Option<String>,
    minted: u64,
}

#[derive(Default)]
pub struct NullItemRegistry {
    items: HashMap<ItemId, ItemRecord>,
    holdings: HashMap<(Address, ItemId), u64>,
}

impl NullItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total units ever minted for `id`.
    pub fn minted(&self, id: ItemId) -> u64 {
        self.items.get(&id).map(|r| r.minted).unwrap_or(0)
    }

    pub fn is_registered(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    fn record_mut(&mut self, id: ItemId) -> Result<&mut ItemRecord, ItemError> {
        self.items.get_mut(&id).ok_or(ItemError::UnknownItem(id))
    }
}

impl ItemRegistry for NullItemRegistry {
    fn mint_batch(
        &mut self,
        to: &Address,
        ids: &[ItemId],
        amounts: &[u64],
    ) -> Result<(), ItemError> {
        if ids.len() != amounts.len() {
            return Err(ItemError::LengthMismatch {
                ids: ids.len(),
                amounts: amounts.len(),
            });
        }

        // Validate the whole batch before touching any balance.
        let mut pending: HashMap<ItemId, u64> = HashMap::new();
        for (id, amount) in ids.iter().zip(amounts) {
            let entry = pending.entry(*id).or_insert(0);
            *entry = entry.checked_add(*amount).ok_or(ItemError::Overflow(*id))?;
            self.minted(*id)
                .checked_add(*entry)
                .ok_or(ItemError::Overflow(*id))?;
            self.supply_of(to, *id)
                .checked_add(*entry)
                .ok_or(ItemError::Overflow(*id))?;
        }

        for (id, amount) in pending {
            let record = self.items.entry(id).or_default();
            record.minted += amount;
            *self.holdings.entry((to.clone(), id)).or_insert(0) += amount;
        }
        Ok(())
    }

    fn burn_batch(
        &mut self,
        from: &Address,
        ids: &[ItemId],
        amounts: &[u64],
    ) -> Result<(), ItemError> {
        if ids.len() != amounts.len() {
            return Err(ItemError::LengthMismatch {
                ids: ids.len(),
                amounts: amounts.len(),
            });
        }

        let mut pending: HashMap<ItemId, u64> = HashMap::new();
        for (id, amount) in ids.iter().zip(amounts) {
            if !self.items.contains_key(id) {
                return Err(ItemError::UnknownItem(*id));
            }
            let entry = pending.entry(*id).or_insert(0);
            *entry = entry.checked_add(*amount).ok_or(ItemError::Overflow(*id))?;
            if self.supply_of(from, *id) < *entry {
                return Err(ItemError::OutOfStock {
                    item: *id,
                    holder: from.clone(),
                });
            }
        }

        for (id, amount) in pending {
            if let Some(record) = self.items.get_mut(&id) {
                record.minted = record.minted.saturating_sub(amount);
            }
            if let Some(held) = self.holdings.get_mut(&(from.clone(), id)) {
                *held -= amount;
            }
        }
        Ok(())
    }

    fn delist(&mut self, id: ItemId) -> Result<(), ItemError> {
        self.items.remove(&id).ok_or(ItemError::UnknownItem(id))?;
        self.holdings.retain(|(_, held), _| *held != id);
        Ok(())
    }

    fn set_price(&mut self, id: ItemId, price: Credits) -> Result<(), ItemError> {
        self.record_mut(id)?.price = price;
        Ok(())
    }

    fn set_metadata_uri(&mut self, id: ItemId, uri: &str) -> Result<(), ItemError> {
        self.record_mut(id)?.uri = Some(uri.to_string());
        Ok(())
    }

    fn clear_metadata_uri(&mut self, id: ItemId) -> Result<(), ItemError> {
        self.record_mut(id)?.uri = None;
        Ok(())
    }

    fn metadata_uri(&self, id: ItemId) -> Option<String> {
        self.items.get(&id).and_then(|r| r.uri.clone())
    }

    fn price_of(&self, id: ItemId) -> Result<Credits, ItemError> {
        self.items
            .get(&id)
            .map(|r| r.price)
            .ok_or(ItemError::UnknownItem(id))
    }

    fn supply_of(&self, holder: &Address, id: ItemId) -> u64 {
        self.holdings
            .get(&(holder.clone(), id))
            .copied()
            .unwrap_or(0)
    }

    fn transfer_one(&mut self, from: &Address, id: ItemId, to: &Address) -> Result<(), ItemError> {
        if !self.items.contains_key(&id) {
            return Err(ItemError::UnknownItem(id));
        }
        let held = self.supply_of(from, id);
        if held == 0 {
            return Err(ItemError::OutOfStock {
                item: id,
                holder: from.clone(),
            });
        }
        self.holdings.insert((from.clone(), id), held - 1);
        *self.holdings.entry((to.clone(), id)).or_insert(0) += 1;
        Ok(())
    }
}
