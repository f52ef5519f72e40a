//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (open_engine, open_config, week parsing, output)
//! - `reports` - Weeks, comparison, insight, root-cause, trend and tree reports
//! - `simulate` - What-if order load scenarios
//! - `regenerate` - Insight regeneration cycle

pub mod core;
pub mod regenerate;
pub mod reports;
pub mod simulate;

// Re-export command functions for main.rs
pub use self::core::*;
pub use regenerate::*;
pub use reports::*;
pub use simulate::*;
