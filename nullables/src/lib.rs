//! Nullable infrastructure for deterministic testing.
//!
//! The governance core consumes its voting ledger, delay queue and item
//! registry through the traits in `quest-interfaces`. This crate provides
//! in-memory implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (time only moves when told to)
//! - Never touch the filesystem or network
//!
//! Usage: hand these to the orchestrator in tests and in the CLI simulator.

pub mod clock;
pub mod items;
pub mod ledger;
pub mod queue;

pub use clock::NullClock;
pub use items::NullItemRegistry;
pub use ledger::NullTokenLedger;
pub use queue::{NullDelayQueue, QueueSettings, VoteReceipt};
