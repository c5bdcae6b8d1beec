//! Swap executor and sell-amount discovery
//!
//! All amounts are 18-decimal fixed-point integers; decimal strings only appear at the
//! edges (configuration and reports). Slippage is applied with integer arithmetic.

use crate::chain::{Router, SwapOrder};
use crate::random::fraction_digits;
use crate::{Error, Result};
use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;

const BPS_DENOMINATOR: u64 = 10_000;

/// One whole 18-decimal token
const ONE_TOKEN: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Direction of a volume trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    /// Native coin → token
    Buy,
    /// Token → native coin
    Sell,
}

/// A confirmed swap
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeResult {
    pub success: bool,
    #[serde(rename = "type")]
    pub side: TradeSide,
    /// Decimal input amount
    pub amount_in: String,
    /// Decimal minimum output
    pub amount_out_min: String,
    #[serde(skip)]
    pub amount_in_raw: U256,
    #[serde(skip)]
    pub amount_out_min_raw: U256,
    pub path: Vec<Address>,
    pub wallet: Address,
    pub tx_hash: TxHash,
    pub explorer_url: String,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// `expected - floor(expected * bps / 10000)`, without intermediate overflow
pub fn min_output(expected: U256, slippage_bps: u32) -> U256 {
    let denom = U256::from(BPS_DENOMINATOR);
    let bps = U256::from(slippage_bps);
    let discount = (expected / denom) * bps + (expected % denom) * bps / denom;
    expected - discount
}

/// Parse an 18-decimal amount such as `"1.0"`
pub fn parse_amount(amount: &str) -> Result<U256> {
    parse_ether(amount.trim())
        .map_err(|e| Error::InvalidAmount(format!("{:?}: {}", amount, e)))
}

/// Quotes, sizes and submits swaps through a [`Router`]
#[derive(Debug, Clone)]
pub struct SwapExecutor {
    slippage_bps: u32,
    deadline_secs: u64,
    explorer_tx_url: String,
}

impl SwapExecutor {
    pub fn new(slippage_bps: u32, deadline_secs: u64, explorer_tx_url: impl Into<String>) -> Self {
        Self {
            slippage_bps,
            deadline_secs,
            explorer_tx_url: explorer_tx_url.into(),
        }
    }

    pub fn slippage_bps(&self) -> u32 {
        self.slippage_bps
    }

    /// Deadline for a transaction submitted now, in unix seconds
    pub fn deadline(&self) -> U256 {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
        U256::from(now + self.deadline_secs)
    }

    /// Quote `amount_in` along `path`, apply slippage, submit and await confirmation.
    ///
    /// Any failure along the way (quote, submission, revert, confirmation timeout) is
    /// returned as an error; nothing partial is ever returned.
    pub async fn swap<R: Router + ?Sized>(
        &self,
        router: &R,
        side: TradeSide,
        amount_in: U256,
        path: &[Address],
    ) -> Result<TradeResult> {
        if path.len() < 2 {
            return Err(Error::InvalidAmount(format!(
                "swap path needs at least 2 tokens, got {}",
                path.len()
            )));
        }

        let expected = quote_last(router, amount_in, path).await?;
        let amount_out_min = min_output(expected, self.slippage_bps);
        let wallet = router.wallet_address();

        let order = SwapOrder {
            amount_in,
            amount_out_min,
            path: path.to_vec(),
            to: wallet,
            deadline: self.deadline(),
        };

        tracing::info!(
            side = ?side,
            amount_in = %format_ether(amount_in),
            amount_out_min = %format_ether(amount_out_min),
            "Swapping tokens"
        );

        let confirmation = match side {
            TradeSide::Sell => router.swap_exact_tokens_for_native(&order).await?,
            TradeSide::Buy => router.swap_exact_native_for_tokens(&order).await?,
        };

        tracing::info!(tx = %confirmation.tx_hash, "Token swap successful");

        Ok(TradeResult {
            success: true,
            side,
            amount_in: format_ether(amount_in),
            amount_out_min: format_ether(amount_out_min),
            amount_in_raw: amount_in,
            amount_out_min_raw: amount_out_min,
            path: order.path,
            wallet,
            tx_hash: confirmation.tx_hash,
            explorer_url: format!("{}{}", self.explorer_tx_url, confirmation.tx_hash),
            block_number: confirmation.block_number,
            gas_used: confirmation.gas_used,
        })
    }
}

/// Final output of a quote along `path`
pub async fn quote_last<R: Router + ?Sized>(
    router: &R,
    amount_in: U256,
    path: &[Address],
) -> Result<U256> {
    router
        .amounts_out(amount_in, path)
        .await?
        .last()
        .copied()
        .ok_or_else(|| Error::Contract("getAmountsOut returned no amounts".to_string()))
}

/// Minimum output worth trading for: `gas_multiple` times the cost of `gas_limit` gas
pub async fn gas_value_threshold<R: Router + ?Sized>(
    router: &R,
    gas_limit: u64,
    gas_multiple: u64,
) -> Result<U256> {
    let gas_price = router.gas_price().await?;
    Ok(U256::from(gas_price) * U256::from(gas_limit) * U256::from(gas_multiple))
}

/// Smallest whole-token amount in `1..=max_probe` whose quote strictly exceeds
/// `threshold`, with a random fractional tail. Falls back to `fallback` when no probe
/// qualifies.
pub async fn find_min_sell_amount<R: Router + ?Sized>(
    router: &R,
    path: &[Address],
    threshold: U256,
    max_probe: u32,
    fallback: &str,
) -> Result<String> {
    for whole in 1..=max_probe {
        let amount_in = U256::from(whole) * ONE_TOKEN;
        let out = quote_last(router, amount_in, path).await?;
        if out > threshold {
            let fraction = {
                let mut rng = rand::thread_rng();
                fraction_digits(&mut rng)
            };
            tracing::debug!(whole, out = %format_ether(out), "Sell amount found");
            return Ok(format!("{}.{}", whole, fraction));
        }
    }

    tracing::warn!(
        max_probe,
        threshold = %format_ether(threshold),
        fallback,
        "No probe cleared the threshold, using fallback"
    );
    Ok(fallback.to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory router used by unit tests across the crate

    use super::*;
    use crate::chain::{Confirmation, Farm, LiquidityOrder};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Quotes `amount_in * rate_num / rate_den`; swaps succeed unless `fail_swaps`
    pub struct StubRouter {
        pub wallet: Address,
        pub rate_num: U256,
        pub rate_den: U256,
        pub gas_price: u128,
        pub native: Mutex<U256>,
        pub tokens: Mutex<HashMap<Address, U256>>,
        pub fail_swaps: bool,
        pub fail_quotes: bool,
        pub quote_calls: AtomicU32,
        pub swap_calls: AtomicU32,
        pub orders: Mutex<Vec<SwapOrder>>,
        pub liquidity: Mutex<Vec<LiquidityOrder>>,
        pub pending_rewards: Mutex<U256>,
        pub staked: Mutex<U256>,
        pub lp_token: Address,
        pub lp_per_liquidity: U256,
    }

    impl Default for StubRouter {
        fn default() -> Self {
            Self {
                wallet: Address::repeat_byte(0x11),
                rate_num: U256::from(1),
                rate_den: U256::from(1),
                gas_price: 1_000_000_000,
                native: Mutex::new(U256::ZERO),
                tokens: Mutex::new(HashMap::new()),
                fail_swaps: false,
                fail_quotes: false,
                quote_calls: AtomicU32::new(0),
                swap_calls: AtomicU32::new(0),
                orders: Mutex::new(Vec::new()),
                liquidity: Mutex::new(Vec::new()),
                pending_rewards: Mutex::new(U256::ZERO),
                staked: Mutex::new(U256::ZERO),
                lp_token: Address::repeat_byte(0x77),
                lp_per_liquidity: U256::from(1),
            }
        }
    }

    impl StubRouter {
        pub fn confirmation(n: u32) -> Confirmation {
            Confirmation {
                tx_hash: TxHash::repeat_byte(n as u8),
                block_number: Some(100 + u64::from(n)),
                gas_used: 150_000,
            }
        }

        fn quote(&self, amount_in: U256) -> U256 {
            amount_in * self.rate_num / self.rate_den
        }

        fn credit(&self, token: Address, amount: U256) {
            let mut tokens = self.tokens.lock().unwrap();
            *tokens.entry(token).or_insert(U256::ZERO) += amount;
        }
    }

    #[async_trait]
    impl Router for StubRouter {
        fn wallet_address(&self) -> Address {
            self.wallet
        }

        async fn native_balance(&self) -> Result<U256> {
            Ok(*self.native.lock().unwrap())
        }

        async fn token_balance(&self, token: Address) -> Result<U256> {
            Ok(self
                .tokens
                .lock()
                .unwrap()
                .get(&token)
                .copied()
                .unwrap_or(U256::ZERO))
        }

        async fn gas_price(&self) -> Result<u128> {
            Ok(self.gas_price)
        }

        async fn amounts_out(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>> {
            self.quote_calls.fetch_add(1, Ordering::Relaxed);
            if self.fail_quotes {
                return Err(Error::Contract("quote reverted".into()));
            }
            let mut amounts = vec![amount_in];
            amounts.extend(path.iter().skip(1).map(|_| self.quote(amount_in)));
            Ok(amounts)
        }

        async fn swap_exact_tokens_for_native(&self, order: &SwapOrder) -> Result<Confirmation> {
            let n = self.swap_calls.fetch_add(1, Ordering::Relaxed) + 1;
            if self.fail_swaps {
                return Err(Error::Contract("INSUFFICIENT_OUTPUT_AMOUNT".into()));
            }
            self.orders.lock().unwrap().push(order.clone());
            *self.native.lock().unwrap() += self.quote(order.amount_in);
            Ok(Self::confirmation(n))
        }

        async fn swap_exact_native_for_tokens(&self, order: &SwapOrder) -> Result<Confirmation> {
            let n = self.swap_calls.fetch_add(1, Ordering::Relaxed) + 1;
            if self.fail_swaps {
                return Err(Error::Contract("INSUFFICIENT_OUTPUT_AMOUNT".into()));
            }
            self.orders.lock().unwrap().push(order.clone());
            {
                let mut native = self.native.lock().unwrap();
                *native = native.saturating_sub(order.amount_in);
            }
            if let Some(token) = order.path.last() {
                self.credit(*token, self.quote(order.amount_in));
            }
            Ok(Self::confirmation(n))
        }

        async fn add_liquidity_native(&self, order: &LiquidityOrder) -> Result<Confirmation> {
            {
                let mut native = self.native.lock().unwrap();
                *native = native.saturating_sub(order.amount_native);
            }
            {
                let mut tokens = self.tokens.lock().unwrap();
                let balance = tokens.entry(order.token).or_insert(U256::ZERO);
                *balance = balance.saturating_sub(order.amount_token_desired);
            }
            self.credit(self.lp_token, order.amount_native * self.lp_per_liquidity);
            self.liquidity.lock().unwrap().push(order.clone());
            Ok(Self::confirmation(50))
        }
    }

    #[async_trait]
    impl Farm for StubRouter {
        async fn pending_rewards(&self, _farm: Address) -> Result<U256> {
            Ok(*self.pending_rewards.lock().unwrap())
        }

        async fn claim_rewards(&self, _farm: Address) -> Result<Confirmation> {
            let claimed = std::mem::take(&mut *self.pending_rewards.lock().unwrap());
            *self.native.lock().unwrap() += claimed;
            Ok(Self::confirmation(60))
        }

        async fn stake(&self, _farm: Address, amount: U256) -> Result<Confirmation> {
            {
                let mut tokens = self.tokens.lock().unwrap();
                let balance = tokens.entry(self.lp_token).or_insert(U256::ZERO);
                *balance = balance.saturating_sub(amount);
            }
            *self.staked.lock().unwrap() += amount;
            Ok(Self::confirmation(70))
        }

        async fn staked_amount(&self, _farm: Address) -> Result<U256> {
            Ok(*self.staked.lock().unwrap())
        }
    }
}
