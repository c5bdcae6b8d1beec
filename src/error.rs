//! Error types for the AMM trade bot

use alloy::primitives::TxHash;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract call failed: {0}")]
    Contract(String),

    #[error("Transaction {0} reverted")]
    Reverted(TxHash),

    #[error("Transaction {hash} not confirmed within {secs}s")]
    ConfirmationTimeout { hash: TxHash, secs: u64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("State file error: {0}")]
    State(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Report delivery failed: {0}")]
    Report(String),
}

pub type Result<T> = std::result::Result<T, Error>;
