//! JSON-RPC chain client
//!
//! Each `connect()` builds a fresh HTTP transport whose requests carry the configured
//! User-Agent and randomized `X-Forwarded-For` / `X-Real-Ip` headers, a signing
//! provider for the trade wallet, and checks the native balance as a liveness probe.

use super::abi::{IFarm, IUniswapV2Router, IERC20};
use super::{Confirmation, Connector, Farm, LiquidityOrder, Router, SwapOrder};
use crate::config::Settings;
use crate::random::decoy_ip;
use crate::wallet::SecureWallet;
use crate::{Error, Result};
use alloy::network::{Ethereum, ReceiptResponse};
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::rpc::client::RpcClient;
use alloy::transports::http::reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT,
};
use alloy::transports::http::{reqwest, Http};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Connects to the configured RPC endpoint with the trade wallet
pub struct ChainConnector {
    rpc_url: Url,
    user_agent: String,
    wallet: SecureWallet,
    router: Address,
    confirmation_timeout: Duration,
}

impl ChainConnector {
    pub fn new(
        settings: &Settings,
        wallet: SecureWallet,
        router: Address,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            rpc_url: settings.rpc_url.clone(),
            user_agent: settings.user_agent.clone(),
            wallet,
            router,
            confirmation_timeout,
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let (forwarded_for, real_ip) = {
            let mut rng = rand::thread_rng();
            (decoy_ip(&mut rng), decoy_ip(&mut rng))
        };
        tracing::debug!(%forwarded_for, %real_ip, "Request headers");

        let value = |v: &str| {
            HeaderValue::from_str(v).map_err(|e| Error::Config(format!("Invalid header: {}", e)))
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, value(&self.user_agent)?);
        headers.insert(
            HeaderName::from_static("x-forwarded-for"),
            value(&forwarded_for)?,
        );
        headers.insert(HeaderName::from_static("x-real-ip"), value(&real_ip)?);
        Ok(headers)
    }
}

#[async_trait]
impl Connector for ChainConnector {
    type Session = ChainSession;

    async fn connect(&self) -> Result<ChainSession> {
        let http_client = reqwest::Client::builder()
            .default_headers(self.headers()?)
            .build()
            .map_err(|e| Error::Rpc(format!("Failed to build HTTP client: {}", e)))?;

        let transport = Http::with_client(http_client, self.rpc_url.clone());
        let rpc_client = RpcClient::new(transport, false);

        let provider = ProviderBuilder::new()
            .wallet(self.wallet.wallet().clone())
            .connect_client(rpc_client)
            .erased();

        let address = self.wallet.address();
        let balance = provider
            .get_balance(address)
            .await
            .map_err(|e| Error::Rpc(format!("Failed to get balance: {}", e)))?;

        tracing::info!(
            wallet = %address,
            balance = %format_ether(balance),
            "Connected"
        );

        Ok(ChainSession {
            provider,
            address,
            router: self.router,
            confirmation_timeout: self.confirmation_timeout,
        })
    }
}

/// Live connection for one trade cycle
pub struct ChainSession {
    provider: DynProvider,
    address: Address,
    router: Address,
    confirmation_timeout: Duration,
}

impl ChainSession {
    /// Wait for one confirmation, bounded by the configured timeout
    async fn confirm(&self, pending: PendingTransactionBuilder<Ethereum>) -> Result<Confirmation> {
        let hash = *pending.tx_hash();
        tracing::info!(tx = %hash, "Transaction submitted, awaiting confirmation");

        let receipt = within_timeout(
            hash,
            self.confirmation_timeout,
            pending.with_required_confirmations(1).get_receipt(),
        )
        .await?;

        confirmation_from(
            hash,
            ReceiptResponse::status(&receipt),
            ReceiptResponse::block_number(&receipt),
            ReceiptResponse::gas_used(&receipt),
        )
    }
}

/// Await a receipt for `hash`, giving up after `limit`
async fn within_timeout<F, T, E>(hash: TxHash, limit: Duration, receipt: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    tokio::time::timeout(limit, receipt)
        .await
        .map_err(|_| Error::ConfirmationTimeout {
            hash,
            secs: limit.as_secs(),
        })?
        .map_err(|e| Error::Rpc(format!("Failed to get receipt for {}: {}", hash, e)))
}

/// A mined receipt is only a confirmation when its status is success
fn confirmation_from(
    hash: TxHash,
    success: bool,
    block_number: Option<u64>,
    gas_used: u64,
) -> Result<Confirmation> {
    if !success {
        return Err(Error::Reverted(hash));
    }
    Ok(Confirmation {
        tx_hash: hash,
        block_number,
        gas_used,
    })
}

#[async_trait]
impl Router for ChainSession {
    fn wallet_address(&self) -> Address {
        self.address
    }

    async fn native_balance(&self) -> Result<U256> {
        self.provider
            .get_balance(self.address)
            .await
            .map_err(|e| Error::Rpc(format!("Failed to get balance: {}", e)))
    }

    async fn token_balance(&self, token: Address) -> Result<U256> {
        IERC20::new(token, self.provider.clone())
            .balanceOf(self.address)
            .call()
            .await
            .map_err(|e| Error::Contract(format!("balanceOf({}): {}", token, e)))
    }

    async fn gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| Error::Rpc(format!("Failed to get gas price: {}", e)))
    }

    async fn amounts_out(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>> {
        IUniswapV2Router::new(self.router, self.provider.clone())
            .getAmountsOut(amount_in, path.to_vec())
            .call()
            .await
            .map_err(|e| Error::Contract(format!("getAmountsOut: {}", e)))
    }

    async fn swap_exact_tokens_for_native(&self, order: &SwapOrder) -> Result<Confirmation> {
        let pending = IUniswapV2Router::new(self.router, self.provider.clone())
            .swapExactTokensForETH(
                order.amount_in,
                order.amount_out_min,
                order.path.clone(),
                order.to,
                order.deadline,
            )
            .send()
            .await
            .map_err(|e| Error::Contract(format!("swapExactTokensForETH: {}", e)))?;
        self.confirm(pending).await
    }

    async fn swap_exact_native_for_tokens(&self, order: &SwapOrder) -> Result<Confirmation> {
        let pending = IUniswapV2Router::new(self.router, self.provider.clone())
            .swapExactETHForTokens(
                order.amount_out_min,
                order.path.clone(),
                order.to,
                order.deadline,
            )
            .value(order.amount_in)
            .send()
            .await
            .map_err(|e| Error::Contract(format!("swapExactETHForTokens: {}", e)))?;
        self.confirm(pending).await
    }

    async fn add_liquidity_native(&self, order: &LiquidityOrder) -> Result<Confirmation> {
        let pending = IUniswapV2Router::new(self.router, self.provider.clone())
            .addLiquidityETH(
                order.token,
                order.amount_token_desired,
                order.amount_token_min,
                order.amount_native_min,
                order.to,
                order.deadline,
            )
            .value(order.amount_native)
            .send()
            .await
            .map_err(|e| Error::Contract(format!("addLiquidityETH: {}", e)))?;
        self.confirm(pending).await
    }
}

#[async_trait]
impl Farm for ChainSession {
    async fn pending_rewards(&self, farm: Address) -> Result<U256> {
        IFarm::new(farm, self.provider.clone())
            .getPendingRewards(self.address)
            .call()
            .await
            .map_err(|e| Error::Contract(format!("getPendingRewards: {}", e)))
    }

    async fn claim_rewards(&self, farm: Address) -> Result<Confirmation> {
        let pending = IFarm::new(farm, self.provider.clone())
            .claimPendingRewards()
            .send()
            .await
            .map_err(|e| Error::Contract(format!("claimPendingRewards: {}", e)))?;
        self.confirm(pending).await
    }

    async fn stake(&self, farm: Address, amount: U256) -> Result<Confirmation> {
        let pending = IFarm::new(farm, self.provider.clone())
            .stake(amount)
            .send()
            .await
            .map_err(|e| Error::Contract(format!("stake: {}", e)))?;
        self.confirm(pending).await
    }

    async fn staked_amount(&self, farm: Address) -> Result<U256> {
        IFarm::new(farm, self.provider.clone())
            .getStakingAmount(self.address)
            .call()
            .await
            .map_err(|e| Error::Contract(format!("getStakingAmount: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn connector(user_agent: &str) -> ChainConnector {
        ChainConnector {
            rpc_url: Url::parse("http://127.0.0.1:8545").unwrap(),
            user_agent: user_agent.to_string(),
            wallet: SecureWallet::from_hex(TEST_KEY).unwrap(),
            router: Address::ZERO,
            confirmation_timeout: Duration::from_secs(480),
        }
    }

    #[test]
    fn test_headers_carry_decoy_addresses() {
        let headers = connector("test-agent/1.0").headers().unwrap();

        assert_eq!(headers[USER_AGENT], "test-agent/1.0");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        for name in ["x-forwarded-for", "x-real-ip"] {
            let ip = headers[name].to_str().unwrap();
            assert!(ip.parse::<std::net::Ipv4Addr>().is_ok(), "{} = {}", name, ip);
        }
    }

    #[tokio::test]
    async fn test_receipt_wait_times_out() {
        let hash = TxHash::repeat_byte(0xab);
        let never = std::future::pending::<std::result::Result<(), String>>();

        let err = within_timeout(hash, Duration::from_millis(20), never)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::ConfirmationTimeout { hash: h, secs: 0 } if h == hash
        ));
    }

    #[tokio::test]
    async fn test_receipt_error_is_rpc_error() {
        let hash = TxHash::repeat_byte(0xab);
        let failed = async { Err::<(), _>("connection reset") };

        let err = within_timeout(hash, Duration::from_secs(5), failed)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Rpc(msg) if msg.contains("connection reset")));
    }

    #[test]
    fn test_reverted_receipt_is_error() {
        let hash = TxHash::repeat_byte(0xcd);
        assert!(matches!(
            confirmation_from(hash, false, Some(7), 21_000),
            Err(Error::Reverted(h)) if h == hash
        ));

        let confirmation = confirmation_from(hash, true, Some(7), 21_000).unwrap();
        assert_eq!(confirmation.tx_hash, hash);
        assert_eq!(confirmation.block_number, Some(7));
        assert_eq!(confirmation.gas_used, 21_000);
    }

    #[test]
    fn test_invalid_user_agent_rejected() {
        assert!(matches!(
            connector("bad\nagent").headers(),
            Err(Error::Config(_))
        ));
    }
}
