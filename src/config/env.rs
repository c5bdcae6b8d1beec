//! Environment-supplied settings
//!
//! Credentials and endpoints never live in the JSON config file. They are read from
//! the process environment, which `main` first populates from a `.env` file if present.
//!
//! ```bash
//! export USER_ADDRESS="0x..."
//! export USER_PRIVATE_KEY="0x..."
//! export RPC_URL="https://bsc-dataseed.binance.org"
//! export USER_AGENT="Mozilla/5.0 ..."          # optional
//!
//! # Optional: email reports (all three or none)
//! export EMAIL_ADDR="bot@example.com"
//! export EMAIL_PW="..."
//! export RECIPIENT="me@example.com"
//! export SMTP_HOST="smtp.office365.com"        # optional
//! export SMTP_PORT="587"                       # optional
//! ```

use crate::{Error, Result};
use alloy::primitives::Address;
use secrecy::SecretString;
use std::str::FromStr;
use url::Url;

/// Environment variable names
pub mod env_vars {
    pub const USER_ADDRESS: &str = "USER_ADDRESS";
    pub const USER_PRIVATE_KEY: &str = "USER_PRIVATE_KEY";
    pub const RPC_URL: &str = "RPC_URL";
    pub const USER_AGENT: &str = "USER_AGENT";

    pub const EMAIL_ADDR: &str = "EMAIL_ADDR";
    pub const EMAIL_PW: &str = "EMAIL_PW";
    pub const RECIPIENT: &str = "RECIPIENT";
    pub const SMTP_HOST: &str = "SMTP_HOST";
    pub const SMTP_PORT: &str = "SMTP_PORT";
}

const DEFAULT_SMTP_HOST: &str = "smtp.office365.com";
const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP credentials for cycle reports
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub sender: String,
    pub password: SecretString,
    pub recipient: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

/// Settings read from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    /// Wallet that trades (must match the private key)
    pub wallet_address: Address,
    /// Hex-encoded signing key
    pub private_key: SecretString,
    /// JSON-RPC endpoint
    pub rpc_url: Url,
    /// User-Agent header sent with every RPC request
    pub user_agent: String,
    /// Email reporting, if configured
    pub email: Option<EmailSettings>,
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("Environment variable {} not set", name)))
        };

        let wallet_address = Address::from_str(required(env_vars::USER_ADDRESS)?.trim())
            .map_err(|e| Error::Config(format!("Invalid {}: {}", env_vars::USER_ADDRESS, e)))?;

        let private_key = SecretString::from(required(env_vars::USER_PRIVATE_KEY)?);

        let rpc_url = Url::parse(required(env_vars::RPC_URL)?.trim())
            .map_err(|e| Error::Config(format!("Invalid {}: {}", env_vars::RPC_URL, e)))?;

        let user_agent = lookup(env_vars::USER_AGENT)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));

        let email = match (
            lookup(env_vars::EMAIL_ADDR),
            lookup(env_vars::EMAIL_PW),
            lookup(env_vars::RECIPIENT),
        ) {
            (Some(sender), Some(password), Some(recipient)) => {
                let smtp_port = match lookup(env_vars::SMTP_PORT) {
                    Some(port) => port.trim().parse().map_err(|e| {
                        Error::Config(format!("Invalid {}: {}", env_vars::SMTP_PORT, e))
                    })?,
                    None => DEFAULT_SMTP_PORT,
                };
                Some(EmailSettings {
                    sender,
                    password: SecretString::from(password),
                    recipient,
                    smtp_host: lookup(env_vars::SMTP_HOST)
                        .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                    smtp_port,
                })
            }
            (None, None, None) => {
                tracing::warn!("Email settings not configured, reports will only be logged");
                None
            }
            _ => {
                return Err(Error::Config(format!(
                    "{}, {} and {} must be set together",
                    env_vars::EMAIL_ADDR,
                    env_vars::EMAIL_PW,
                    env_vars::RECIPIENT
                )));
            }
        };

        Ok(Self {
            wallet_address,
            private_key,
            rpc_url,
            user_agent,
            email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        vars.insert(
            env_vars::USER_ADDRESS,
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
        );
        vars.insert(
            env_vars::USER_PRIVATE_KEY,
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
        );
        vars.insert(env_vars::RPC_URL, "https://bsc-dataseed.binance.org".to_string());
        vars
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Settings> {
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_reads_required_vars() {
        let settings = load(&base_vars()).unwrap();
        assert_eq!(settings.rpc_url.host_str(), Some("bsc-dataseed.binance.org"));
        assert!(settings.user_agent.starts_with("amm-trade-bot/"));
        assert!(settings.email.is_none());
        assert!(settings.private_key.expose_secret().starts_with("0xac09"));
    }

    #[test]
    fn test_missing_rpc_url_is_config_error() {
        let mut vars = base_vars();
        vars.remove(env_vars::RPC_URL);
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains(env_vars::RPC_URL));
    }

    #[test]
    fn test_email_settings_with_defaults() {
        let mut vars = base_vars();
        vars.insert(env_vars::EMAIL_ADDR, "bot@example.com".to_string());
        vars.insert(env_vars::EMAIL_PW, "hunter2".to_string());
        vars.insert(env_vars::RECIPIENT, "me@example.com".to_string());

        let email = load(&vars).unwrap().email.unwrap();
        assert_eq!(email.smtp_host, DEFAULT_SMTP_HOST);
        assert_eq!(email.smtp_port, DEFAULT_SMTP_PORT);
    }

    #[test]
    fn test_partial_email_settings_rejected() {
        let mut vars = base_vars();
        vars.insert(env_vars::EMAIL_ADDR, "bot@example.com".to_string());
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = load(&base_vars()).unwrap();
        let debug_str = format!("{:?}", settings);
        assert!(!debug_str.contains("ac0974bec"));
    }
}
