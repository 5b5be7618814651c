//! Quest governance core.
//!
//! Accounts propose and vote on quests, executed proposals pay fixed credit
//! rewards to their proposer (by self-governance call), voters and
//! participants who submit proof, and credits are redeemed for priced items.
//!
//! Voting mechanics, the timelock, credit balances and item custody are
//! external collaborators consumed through the traits in `quest-interfaces`.

pub mod calls;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod events;
pub mod guard;
pub mod orchestrator;
pub mod redemption;
pub mod registry;
pub mod rewards;

pub use calls::SelfCall;
pub use config::{ConfigError, GovernanceConfig};
pub use cooldown::{CooldownPeriods, CooldownTracker};
pub use error::{ErrorClass, GovernanceError};
pub use events::GovernanceEvent;
pub use guard::{Entered, ReentrancyGuard};
pub use orchestrator::GovernanceOrchestrator;
pub use redemption::RedemptionEngine;
pub use registry::{ProposalRecord, ProposalRegistry};
pub use rewards::{CallOrigin, RewardIssuer, RewardSchedule, Treasury};
