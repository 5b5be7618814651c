//! Item registry trait: priced, limited-supply collectibles.

use quest_types::{Address, Credits, ItemId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("{0} is not registered")]
    UnknownItem(ItemId),

    #[error("{holder} holds no units of {item}")]
    OutOfStock { item: ItemId, holder: Address },

    #[error("batch length mismatch: {ids} ids, {amounts} amounts")]
    LengthMismatch { ids: usize, amounts: usize },

    #[error("supply overflow for {0}")]
    Overflow(ItemId),
}

pub trait ItemRegistry {
    /// Mint `amounts[i]` units of `ids[i]` to `to`.
    fn mint_batch(&mut self, to: &Address, ids: &[ItemId], amounts: &[u64])
        -> Result<(), ItemError>;

    /// Inverse of `mint_batch`: remove `amounts[i]` units of `ids[i]` held by
    /// `from`. Nothing changes unless every unit is present.
    fn burn_batch(&mut self, from: &Address, ids: &[ItemId], amounts: &[u64])
        -> Result<(), ItemError>;

    /// Forget `id` entirely: price, URI and every holding.
    fn delist(&mut self, id: ItemId) -> Result<(), ItemError>;

    fn set_price(&mut self, id: ItemId, price: Credits) -> Result<(), ItemError>;

    fn set_metadata_uri(&mut self, id: ItemId, uri: &str) -> Result<(), ItemError>;
    fn clear_metadata_uri(&mut self, id: ItemId) -> Result<(), ItemError>;

    fn metadata_uri(&self, id: ItemId) -> Option<String>;

    fn price_of(&self, id: ItemId) -> Result<Credits, ItemError>;

    /// Units of `id` held by `holder`.
    fn supply_of(&self, holder: &Address, id: ItemId) -> u64;

    /// Move exactly one unit of `id` from `from` to `to`.
    fn transfer_one(&mut self, from: &Address, id: ItemId, to: &Address)
        -> Result<(), ItemError>;
}
