//! Configuration for the AMM trade bot
//!
//! Two layers:
//! - [`Config`]: strategy and scheduling behaviour, loaded from an optional JSON file
//! - [`Settings`]: credentials and endpoints, read from the environment (`.env` supported)

pub mod env;

use crate::{Error, Result};
use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use env::{EmailSettings, Settings};

/// BSC mainnet addresses used by the default volume setup
pub mod defaults {
    use super::*;

    /// PancakeSwap v2 router
    pub const ROUTER: Address = address!("10ed43c718714eb63d5aa57b78b54704e256024e");
    /// Token whose market is kept active
    pub const KTP: Address = address!("c6c0c0f54a394931a5b224c8b53406633e35eee7");
    /// BSC-USD
    pub const USDT: Address = address!("55d398326f99059ff775485246999027b3197955");
    /// Wrapped BNB
    pub const WBNB: Address = address!("bb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c");

    pub const EXPLORER_TX_URL: &str = "https://bscscan.com/tx/";
}

/// How the volume strategy picks its action each cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VolumeMode {
    /// Sell on every cycle
    #[default]
    SellOnly,
    /// Buy on even cycle counts, sell on odd ones
    Alternate,
}

/// How much token to sell in one trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SellAmount {
    /// A fixed decimal token amount (18 decimals)
    Fixed { amount: String },
    /// Smallest whole-token amount whose quote clears `gas_multiple` times the gas cost
    MinValue {
        /// Gas units assumed for one swap
        gas_limit: u64,
        /// Quote must exceed this many times the estimated gas cost
        gas_multiple: u64,
        /// Highest whole-token amount probed
        max_probe: u32,
        /// Decimal amount used when no probe clears the threshold
        fallback: String,
    },
}

/// Volume strategy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeConfig {
    #[serde(default)]
    pub mode: VolumeMode,
    /// Token → ... → wrapped native
    pub sell_path: Vec<Address>,
    /// Wrapped native → ... → token. Defaults to the reversed sell path.
    #[serde(default)]
    pub buy_path: Option<Vec<Address>>,
    pub sell_amount: SellAmount,
    /// Native amount spent on a buy (decimal, 18 decimals)
    pub buy_amount: String,
    /// Slippage tolerance in basis points (100 = 1%)
    pub slippage_bps: u32,
}

impl VolumeConfig {
    /// Path used when buying the token with the native coin
    pub fn buy_path(&self) -> Vec<Address> {
        self.buy_path
            .clone()
            .unwrap_or_else(|| self.sell_path.iter().rev().copied().collect())
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            mode: VolumeMode::SellOnly,
            sell_path: vec![defaults::KTP, defaults::USDT, defaults::WBNB],
            buy_path: None,
            sell_amount: SellAmount::Fixed {
                amount: "1.0".to_string(),
            },
            buy_amount: "0.001".to_string(),
            slippage_bps: 100,
        }
    }
}

/// Farm reward compounding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundConfig {
    /// Staking contract paying rewards in the native coin
    pub farm: Address,
    /// LP token staked in the farm
    pub lp_token: Address,
    /// Wrapped native token of the pool
    pub wrapped_native: Address,
    /// Other side of the pool
    pub paired_token: Address,
    /// Native balance kept aside for gas (decimal)
    pub gas_reserve: String,
    /// Slippage tolerance in basis points (1000 = 10%)
    pub slippage_bps: u32,
}

/// Which action the bot performs on each cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    Volume(VolumeConfig),
    Compound(CompoundConfig),
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::Volume(VolumeConfig::default())
    }
}

/// Next-run scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Fixed offset between cycles
    pub interval_hours: u32,
    /// Lower bound of the random jitter added to each schedule
    pub jitter_min_ms: u64,
    /// Upper bound (inclusive) of the random jitter
    pub jitter_max_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: 12,
            jitter_min_ms: 2971,
            jitter_max_ms: 4723,
        }
    }
}

/// Main configuration; omitted fields take their defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Router contract address
    pub router: Address,
    pub strategy: StrategyConfig,
    pub schedule: ScheduleConfig,
    /// Attempts per action before the cycle reports failure
    pub max_attempts: u32,
    /// How long to wait for a transaction receipt
    pub confirmation_timeout_secs: u64,
    /// Swap deadline, relative to submission
    pub deadline_secs: u64,
    /// Persisted trade record
    pub state_file: String,
    /// UTC offset used for report subjects
    pub report_utc_offset_hours: i32,
    /// Block explorer prefix for transaction links
    pub explorer_tx_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            router: defaults::ROUTER,
            strategy: StrategyConfig::default(),
            schedule: ScheduleConfig::default(),
            max_attempts: 3,
            confirmation_timeout_secs: 8 * 60,
            deadline_secs: 8 * 60,
            state_file: "next.json".to_string(),
            report_utc_offset_hours: 8, // Asia/Singapore
            explorer_tx_url: defaults::EXPLORER_TX_URL.to_string(),
        }
    }
}

impl Config {
    /// Load from a JSON file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?
            }
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the trade cycle cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::Config("max_attempts must be at least 1".into()));
        }
        if self.schedule.interval_hours == 0 {
            return Err(Error::Config("interval_hours must be at least 1".into()));
        }
        if self.schedule.jitter_min_ms > self.schedule.jitter_max_ms {
            return Err(Error::Config(format!(
                "jitter_min_ms ({}) exceeds jitter_max_ms ({})",
                self.schedule.jitter_min_ms, self.schedule.jitter_max_ms
            )));
        }

        match &self.strategy {
            StrategyConfig::Volume(volume) => {
                check_slippage(volume.slippage_bps)?;
                if volume.sell_path.len() < 2 {
                    return Err(Error::Config("sell_path needs at least 2 tokens".into()));
                }
                if volume.buy_path().len() < 2 {
                    return Err(Error::Config("buy_path needs at least 2 tokens".into()));
                }
                if let SellAmount::MinValue { max_probe, .. } = volume.sell_amount {
                    if max_probe == 0 {
                        return Err(Error::Config("max_probe must be at least 1".into()));
                    }
                }
            }
            StrategyConfig::Compound(compound) => check_slippage(compound.slippage_bps)?,
        }

        Ok(())
    }
}

fn check_slippage(bps: u32) -> Result<()> {
    if bps >= 10_000 {
        return Err(Error::Config(format!(
            "slippage_bps must be below 10000, got {}",
            bps
        )));
    }
    Ok(())
}
