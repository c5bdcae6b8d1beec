//! Farm reward compounding
//!
//! claim rewards → swap half of the spendable native balance into the paired token →
//! add native/paired liquidity → stake the LP balance.
//!
//! Every amount is read from balances at the time of use, so running it again after a
//! partial failure picks up where the last attempt stopped.

use crate::chain::{Farm, LiquidityOrder, Router};
use crate::config::CompoundConfig;
use crate::swap::{min_output, parse_amount, SwapExecutor, TradeResult, TradeSide};
use crate::Result;
use alloy::primitives::utils::format_ether;
use alloy::primitives::{TxHash, U256};
use serde::Serialize;

/// What one compound pass did
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundSummary {
    pub claim_rewards: Option<String>,
    pub swap: Option<TradeResult>,
    pub add_liquidity: Option<TxHash>,
    pub staked_lp: Option<String>,
    pub total_staked: String,
}

pub struct CompoundStrategy {
    config: CompoundConfig,
    executor: SwapExecutor,
}

impl CompoundStrategy {
    pub fn new(config: CompoundConfig, deadline_secs: u64, explorer_tx_url: &str) -> Self {
        let executor = SwapExecutor::new(config.slippage_bps, deadline_secs, explorer_tx_url);
        Self { config, executor }
    }

    pub async fn compound_once<S>(&self, session: &S) -> Result<CompoundSummary>
    where
        S: Router + Farm + ?Sized,
    {
        let cfg = &self.config;
        let reserve = parse_amount(&cfg.gas_reserve)?;

        // 1. claim
        let pending = session.pending_rewards(cfg.farm).await?;
        let claim_rewards = if pending.is_zero() {
            tracing::info!("No pending rewards");
            None
        } else {
            let confirmation = session.claim_rewards(cfg.farm).await?;
            tracing::info!(
                rewards = %format_ether(pending),
                tx = %confirmation.tx_hash,
                "Rewards claimed"
            );
            Some(format_ether(pending))
        };

        // 2. swap half of the spendable native balance
        let spendable = session.native_balance().await?.saturating_sub(reserve);
        let half = spendable / U256::from(2);
        let swap = if half.is_zero() {
            None
        } else {
            let path = [cfg.wrapped_native, cfg.paired_token];
            Some(self.executor.swap(session, TradeSide::Buy, half, &path).await?)
        };

        // 3. add liquidity with whatever is now on hand
        let token_amount = session.token_balance(cfg.paired_token).await?;
        let native_amount = session.native_balance().await?.saturating_sub(reserve);
        let add_liquidity = if token_amount.is_zero() || native_amount.is_zero() {
            tracing::info!("Nothing to add as liquidity");
            None
        } else {
            let order = LiquidityOrder {
                token: cfg.paired_token,
                amount_token_desired: token_amount,
                amount_token_min: min_output(token_amount, self.executor.slippage_bps()),
                amount_native: native_amount,
                amount_native_min: min_output(native_amount, self.executor.slippage_bps()),
                to: session.wallet_address(),
                deadline: self.executor.deadline(),
            };
            let confirmation = session.add_liquidity_native(&order).await?;
            tracing::info!(tx = %confirmation.tx_hash, "Liquidity added");
            Some(confirmation.tx_hash)
        };

        // 4. stake LP
        let lp_balance = session.token_balance(cfg.lp_token).await?;
        let staked_lp = if lp_balance.is_zero() {
            None
        } else {
            let confirmation = session.stake(cfg.farm, lp_balance).await?;
            tracing::info!(
                lp = %format_ether(lp_balance),
                tx = %confirmation.tx_hash,
                "LP staked into farm"
            );
            Some(format_ether(lp_balance))
        };

        let total_staked = format_ether(session.staked_amount(cfg.farm).await?);

        Ok(CompoundSummary {
            claim_rewards,
            swap,
            add_liquidity,
            staked_lp,
            total_staked,
        })
    }
}
