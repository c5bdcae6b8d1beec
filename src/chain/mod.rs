//! Chain access
//!
//! A [`Connector`] opens one session per trade cycle. The session is what the swap
//! executor and strategies talk to, through the [`Router`] and [`Farm`] traits, so the
//! cycle can be driven against in-memory stubs as well as a real JSON-RPC node.

mod abi;
mod client;

pub use client::{ChainConnector, ChainSession};

use crate::Result;
use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// A confirmed (mined, successful) transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Parameters shared by both swap directions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOrder {
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub to: Address,
    /// Unix seconds
    pub deadline: U256,
}

/// Parameters for adding token/native liquidity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityOrder {
    pub token: Address,
    pub amount_token_desired: U256,
    pub amount_token_min: U256,
    /// Native amount attached as transaction value
    pub amount_native: U256,
    pub amount_native_min: U256,
    pub to: Address,
    /// Unix seconds
    pub deadline: U256,
}

/// Exchange router plus the balance queries trading needs
#[async_trait]
pub trait Router: Send + Sync {
    /// Address trades are sent from and paid to
    fn wallet_address(&self) -> Address;

    async fn native_balance(&self) -> Result<U256>;

    async fn token_balance(&self, token: Address) -> Result<U256>;

    /// Current gas price in wei
    async fn gas_price(&self) -> Result<u128>;

    /// Quoted amounts along `path`; the last element is the final output
    async fn amounts_out(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>>;

    /// Sell a token for the native coin (no value attached)
    async fn swap_exact_tokens_for_native(&self, order: &SwapOrder) -> Result<Confirmation>;

    /// Buy a token with the native coin (`amount_in` attached as value)
    async fn swap_exact_native_for_tokens(&self, order: &SwapOrder) -> Result<Confirmation>;

    async fn add_liquidity_native(&self, order: &LiquidityOrder) -> Result<Confirmation>;
}

/// Reward farm accepting LP stakes
#[async_trait]
pub trait Farm: Send + Sync {
    async fn pending_rewards(&self, farm: Address) -> Result<U256>;

    async fn claim_rewards(&self, farm: Address) -> Result<Confirmation>;

    async fn stake(&self, farm: Address, amount: U256) -> Result<Confirmation>;

    async fn staked_amount(&self, farm: Address) -> Result<U256>;
}

#[async_trait]
impl<T: Router + ?Sized> Router for Arc<T> {
    fn wallet_address(&self) -> Address {
        (**self).wallet_address()
    }

    async fn native_balance(&self) -> Result<U256> {
        (**self).native_balance().await
    }

    async fn token_balance(&self, token: Address) -> Result<U256> {
        (**self).token_balance(token).await
    }

    async fn gas_price(&self) -> Result<u128> {
        (**self).gas_price().await
    }

    async fn amounts_out(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>> {
        (**self).amounts_out(amount_in, path).await
    }

    async fn swap_exact_tokens_for_native(&self, order: &SwapOrder) -> Result<Confirmation> {
        (**self).swap_exact_tokens_for_native(order).await
    }

    async fn swap_exact_native_for_tokens(&self, order: &SwapOrder) -> Result<Confirmation> {
        (**self).swap_exact_native_for_tokens(order).await
    }

    async fn add_liquidity_native(&self, order: &LiquidityOrder) -> Result<Confirmation> {
        (**self).add_liquidity_native(order).await
    }
}

#[async_trait]
impl<T: Farm + ?Sized> Farm for Arc<T> {
    async fn pending_rewards(&self, farm: Address) -> Result<U256> {
        (**self).pending_rewards(farm).await
    }

    async fn claim_rewards(&self, farm: Address) -> Result<Confirmation> {
        (**self).claim_rewards(farm).await
    }

    async fn stake(&self, farm: Address, amount: U256) -> Result<Confirmation> {
        (**self).stake(farm, amount).await
    }

    async fn staked_amount(&self, farm: Address) -> Result<U256> {
        (**self).staked_amount(farm).await
    }
}

/// Opens sessions against the chain
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: Router + Farm;

    /// Establish provider, signer and contract handles, checking liveness
    async fn connect(&self) -> Result<Self::Session>;

    /// Release everything the session holds
    fn disconnect(&self, session: Self::Session) {
        drop(session);
        tracing::info!("Disconnected");
    }
}
