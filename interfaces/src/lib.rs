//! Abstract collaborator traits for the quest governance core.
//!
//! The voting ledger, the delay queue and the item registry live outside the
//! core. Every implementation (an on-chain adapter, an RPC client, the
//! in-memory nullables used in tests) implements these traits, and the rest of
//! the codebase depends only on the traits.

pub mod items;
pub mod ledger;
pub mod queue;

pub use items::{ItemError, ItemRegistry};
pub use ledger::{LedgerError, TokenLedger, VotesView};
pub use queue::{DelayQueue, QueueError};
