//! Fundamental types for the quest governance ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account addresses, credit amounts, timestamps, proposal and item identifiers,
//! governance calls, and the state/role enums the orchestrator gates on.

pub mod address;
pub mod amount;
pub mod call;
pub mod hash;
pub mod item;
pub mod state;
pub mod time;

pub use address::Address;
pub use amount::Credits;
pub use call::Call;
pub use hash::ProposalId;
pub use item::ItemId;
pub use state::{ActionKind, ProposalState, Role, VoteSupport};
pub use time::Timestamp;
