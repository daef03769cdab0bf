//! Application-wide error types.
//!
//! [`RpcError`] covers the transport (JSON-RPC over HTTP, ABI decoding).
//! [`Error`] is the user-facing taxonomy every wallet and contract operation
//! reports. Its `Display` text is fixed per variant; the raw transport error
//! stays in the `source` chain and is only logged.

use alloy_primitives::B256;
use thiserror::Error;

/// Failures talking to a JSON-RPC endpoint (chain node or wallet).
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("ABI decode error: {0}")]
    Decode(String),
}

impl RpcError {
    /// JSON-RPC / EIP-1193 error code, when the endpoint returned one.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Rejected decimal currency input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("unexpected character '{0}' in amount")]
    InvalidCharacter(char),

    #[error("too many decimal places ({0}, at most 18)")]
    TooManyDecimals(usize),

    #[error("amount does not fit in 256 bits")]
    Overflow,
}

/// One rejected `createProject` candidate.
#[derive(Debug)]
pub struct SignatureFailure {
    pub signature: &'static str,
    pub source: RpcError,
}

#[derive(Debug, Error)]
pub enum Error {
    /// `source` is `None` when the wallet answered but exposed no account.
    #[error("Ethereum wallet not detected. Please install a wallet and unlock an account.")]
    WalletUnavailable {
        #[source]
        source: Option<RpcError>,
    },

    #[error("Failed to switch to the {network} network.")]
    NetworkSwitchFailed {
        network: &'static str,
        #[source]
        source: RpcError,
    },

    #[error("Signer not set. Please connect wallet first.")]
    NotAuthenticated,

    #[error("Failed to fetch {what}")]
    QueryFailed {
        what: String,
        #[source]
        source: RpcError,
    },

    #[error(
        "No compatible createProject signature found ({} candidates rejected)",
        .failures.len()
    )]
    AllSignaturesExhausted { failures: Vec<SignatureFailure> },

    #[error("Failed to contribute to project {project_id}")]
    ContributionFailed {
        project_id: u64,
        #[source]
        source: RpcError,
    },

    #[error("Failed to withdraw funds from project {project_id}")]
    WithdrawalFailed {
        project_id: u64,
        #[source]
        source: RpcError,
    },

    #[error("Transaction {hash} reverted")]
    Reverted { hash: B256 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
