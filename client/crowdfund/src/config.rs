//! Operational settings loaded from environment variables.
//!
//! Network and contract identity are compile-time constants (see
//! [`crate::network`]); only local plumbing is configurable here.

use std::time::Duration;

use crate::errors::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// JSON-RPC endpoint of the wallet (e.g. a desktop wallet's local bridge)
    pub wallet_url: String,
    /// Per-request HTTP timeout
    pub http_timeout_secs: u64,
    /// How often to poll for a transaction receipt
    pub receipt_poll_ms: u64,
    /// How often to poll the wallet for account / chain changes
    pub wallet_poll_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Config {
            wallet_url: lookup("WALLET_URL")
                .unwrap_or_else(|| "http://127.0.0.1:1248".to_string()),
            http_timeout_secs: parse_var(&lookup, "HTTP_TIMEOUT_SECS", 30)?,
            receipt_poll_ms: parse_var(&lookup, "RECEIPT_POLL_MS", 2_000)?,
            wallet_poll_ms: parse_var(&lookup, "WALLET_POLL_MS", 1_000)?,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn receipt_poll(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms)
    }

    pub fn wallet_poll(&self) -> Duration {
        Duration::from_millis(self.wallet_poll_ms)
    }
}

/// Every numeric setting is a duration and must be non-zero.
fn parse_var(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse() {
        Ok(0) => Err(Error::Config(format!("{key} must be greater than zero"))),
        Ok(value) => Ok(value),
        Err(_) => Err(Error::Config(format!("Invalid {key}: {raw}"))),
    }
}
