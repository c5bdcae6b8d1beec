//! Volume trading
//!
//! One small swap per cycle so the pair always has recent trades. Either sells every
//! time, or alternates buy/sell on the parity of the cycle count.

use crate::chain::Router;
use crate::config::{SellAmount, VolumeConfig, VolumeMode};
use crate::swap::{
    find_min_sell_amount, gas_value_threshold, parse_amount, SwapExecutor, TradeResult, TradeSide,
};
use crate::Result;
use alloy::primitives::utils::format_ether;
use serde::Serialize;

/// Result of a volume trade plus the wallet's native balance afterwards
#[derive(Debug, Clone, Serialize)]
pub struct VolumeTrade {
    pub success: bool,
    pub balance: Option<String>,
    pub trade: TradeResult,
}

pub struct VolumeStrategy {
    config: VolumeConfig,
    executor: SwapExecutor,
}

impl VolumeStrategy {
    pub fn new(config: VolumeConfig, deadline_secs: u64, explorer_tx_url: &str) -> Self {
        let executor = SwapExecutor::new(config.slippage_bps, deadline_secs, explorer_tx_url);
        Self { config, executor }
    }

    /// Even counts buy, odd counts sell (alternate mode); sell-only always sells
    pub fn side_for(&self, count: u64) -> TradeSide {
        match self.config.mode {
            VolumeMode::SellOnly => TradeSide::Sell,
            VolumeMode::Alternate if count % 2 == 0 => TradeSide::Buy,
            VolumeMode::Alternate => TradeSide::Sell,
        }
    }

    /// Decimal amount to sell this attempt
    async fn sell_amount<R: Router + ?Sized>(&self, router: &R) -> Result<String> {
        match &self.config.sell_amount {
            SellAmount::Fixed { amount } => Ok(amount.clone()),
            SellAmount::MinValue {
                gas_limit,
                gas_multiple,
                max_probe,
                fallback,
            } => {
                let threshold = gas_value_threshold(router, *gas_limit, *gas_multiple).await?;
                find_min_sell_amount(
                    router,
                    &self.config.sell_path,
                    threshold,
                    *max_probe,
                    fallback,
                )
                .await
            }
        }
    }

    /// Size and execute one trade
    pub async fn trade_once<R: Router + ?Sized>(
        &self,
        router: &R,
        side: TradeSide,
    ) -> Result<VolumeTrade> {
        let trade = match side {
            TradeSide::Sell => {
                let amount_in = parse_amount(&self.sell_amount(router).await?)?;
                self.executor
                    .swap(router, side, amount_in, &self.config.sell_path)
                    .await?
            }
            TradeSide::Buy => {
                let amount_in = parse_amount(&self.config.buy_amount)?;
                self.executor
                    .swap(router, side, amount_in, &self.config.buy_path())
                    .await?
            }
        };

        // The trade is final at this point; a failed balance read must not trigger a retry
        let balance = match router.native_balance().await {
            Ok(balance) => {
                let balance = format_ether(balance);
                tracing::info!(%balance, "Balance after trade");
                Some(balance)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read balance after trade");
                None
            }
        };

        Ok(VolumeTrade {
            success: true,
            balance,
            trade,
        })
    }
}
