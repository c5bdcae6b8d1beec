//! AMM trade bot
//!
//! A long-lived process that wakes on a schedule and performs one action against a
//! decentralized-exchange router:
//! - a small volume swap (sell-only, or buy/sell alternating on a persisted counter)
//! - or a farm compound pass (claim rewards, add liquidity, stake LP)
//!
//! Each cycle retries its action a bounded number of times, emails (or logs) a report,
//! and persists when the next cycle is due so restarts resume the schedule.

pub mod bot;
pub mod chain;
pub mod config;
pub mod logging;
pub mod random;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod state;
pub mod strategy;
pub mod swap;
pub mod wallet;

mod error;

pub use bot::{Bot, CycleOutcome};
pub use config::{Config, Settings};
pub use error::{Error, Result};
pub use state::{StateStore, TradeRecord};
