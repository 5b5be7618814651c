//! Shared utilities for the quest ledger.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingError};
