//! Wallet management
//!
//! Holds the signing key used for swaps, liquidity and staking transactions.

mod signer;

pub use signer::SecureWallet;
