//! Wallet connector.
//!
//! The wallet is an EIP-1193 style JSON-RPC endpoint (for example a desktop
//! wallet's local HTTP bridge). [`connect`] asks it for an account, makes sure
//! it is on the configured chain (switching or adding the chain if needed) and
//! hands back a signer bound to the selected account.
//!
//! Account and chain changes are delivered through a [`Subscription`], which
//! polls the wallet because plain HTTP cannot push notifications.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256, U64};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{Error, Result, RpcError};
use crate::network::NetworkConfig;
use crate::rpc::{
    ChainReader, JsonRpcClient, RpcProvider, TransactionRequest, TransactionSender,
};

/// EIP-1193 code returned by `wallet_switchEthereumChain` for an unknown chain.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

// ─────────────────────────────────────────────────────────
// Wallet boundary
// ─────────────────────────────────────────────────────────

/// `wallet_addEthereumChain` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl AddChainParams {
    pub fn for_network(network: &NetworkConfig) -> Self {
        Self {
            chain_id: network.chain_id_hex(),
            chain_name: network.name.to_string(),
            native_currency: NativeCurrency {
                name: network.symbol.to_string(),
                symbol: network.symbol.to_string(),
                decimals: 18,
            },
            rpc_urls: vec![network.rpc_url.to_string()],
            block_explorer_urls: vec![network.explorer.to_string()],
        }
    }
}

/// Requests the application makes of the external wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_requestAccounts`; may prompt the user for approval.
    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, RpcError>;
    /// `eth_accounts`; never prompts.
    async fn accounts(&self) -> std::result::Result<Vec<Address>, RpcError>;
    async fn chain_id(&self) -> std::result::Result<u64, RpcError>;
    async fn switch_chain(&self, chain_id_hex: &str) -> std::result::Result<(), RpcError>;
    async fn add_chain(&self, params: &AddChainParams) -> std::result::Result<(), RpcError>;
    /// `eth_sendTransaction`; the wallet signs for `tx.from`.
    async fn send_transaction(&self, tx: TransactionRequest)
        -> std::result::Result<B256, RpcError>;
    /// Chain reads routed through the wallet's own node connection.
    fn provider(&self) -> Arc<dyn ChainReader>;
}

/// [`WalletProvider`] reached over JSON-RPC.
#[derive(Debug, Clone)]
pub struct RpcWallet {
    rpc: JsonRpcClient,
}

impl RpcWallet {
    pub fn new(rpc: JsonRpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, RpcError> {
        self.rpc.request("eth_requestAccounts", json!([])).await
    }

    async fn accounts(&self) -> std::result::Result<Vec<Address>, RpcError> {
        self.rpc.request("eth_accounts", json!([])).await
    }

    async fn chain_id(&self) -> std::result::Result<u64, RpcError> {
        let id: U64 = self.rpc.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn switch_chain(&self, chain_id_hex: &str) -> std::result::Result<(), RpcError> {
        let _: serde_json::Value = self
            .rpc
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": chain_id_hex }]),
            )
            .await?;
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> std::result::Result<(), RpcError> {
        let _: serde_json::Value = self
            .rpc
            .request("wallet_addEthereumChain", json!([params]))
            .await?;
        Ok(())
    }

    async fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> std::result::Result<B256, RpcError> {
        self.rpc.request("eth_sendTransaction", json!([tx])).await
    }

    fn provider(&self) -> Arc<dyn ChainReader> {
        Arc::new(RpcProvider::new(self.rpc.clone()))
    }
}

/// Signer that submits through the wallet on behalf of one account.
pub struct WalletSigner {
    wallet: Arc<dyn WalletProvider>,
    address: Address,
}

impl WalletSigner {
    pub fn new(wallet: Arc<dyn WalletProvider>, address: Address) -> Self {
        Self { wallet, address }
    }
}

#[async_trait]
impl TransactionSender for WalletSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(
        &self,
        mut tx: TransactionRequest,
    ) -> std::result::Result<B256, RpcError> {
        tx.from = self.address;
        self.wallet.send_transaction(tx).await
    }
}

// ─────────────────────────────────────────────────────────
// Connect
// ─────────────────────────────────────────────────────────

/// Result of a successful [`connect`].
pub struct Connection {
    pub account: Address,
    pub provider: Arc<dyn ChainReader>,
    pub signer: Arc<dyn TransactionSender>,
}

/// Obtain an account from the wallet and ensure it is on `network`.
pub async fn connect(wallet: Arc<dyn WalletProvider>, network: &NetworkConfig) -> Result<Connection> {
    let accounts = wallet.request_accounts().await.map_err(|e| {
        error!("Wallet account request failed: {e}");
        Error::WalletUnavailable { source: Some(e) }
    })?;
    let account = *accounts.first().ok_or_else(|| {
        error!("Wallet exposed no accounts");
        Error::WalletUnavailable { source: None }
    })?;

    let active = wallet.chain_id().await.map_err(|e| {
        error!("Wallet chain id lookup failed: {e}");
        Error::WalletUnavailable { source: Some(e) }
    })?;
    if active != network.chain_id {
        ensure_network(wallet.as_ref(), network, active).await?;
    }

    info!("Connected {account} on {}", network.name);
    Ok(Connection {
        account,
        provider: wallet.provider(),
        signer: Arc::new(WalletSigner::new(wallet, account)),
    })
}

async fn ensure_network(
    wallet: &dyn WalletProvider,
    network: &NetworkConfig,
    active: u64,
) -> Result<()> {
    info!(
        "Wallet is on chain {active}, switching to {} ({})",
        network.name, network.chain_id
    );
    let switch_err = match wallet.switch_chain(&network.chain_id_hex()).await {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    if switch_err.code() != Some(UNRECOGNIZED_CHAIN) {
        warn!("Chain switch rejected: {switch_err}");
        return Err(Error::NetworkSwitchFailed {
            network: network.name,
            source: switch_err,
        });
    }

    wallet
        .add_chain(&AddChainParams::for_network(network))
        .await
        .map_err(|e| {
            warn!("Adding {} to the wallet failed: {e}", network.name);
            Error::NetworkSwitchFailed {
                network: network.name,
                source: e,
            }
        })
}

/// `0x1234...abcd` form used in the wallet badge.
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

// ─────────────────────────────────────────────────────────
// Change notifications
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// Live wallet notifications. Dropping the handle unsubscribes.
pub struct Subscription {
    events: mpsc::Receiver<WalletEvent>,
    cancel: CancellationToken,
}

impl Subscription {
    /// Next notification, or `None` once unsubscribed.
    pub async fn next(&mut self) -> Option<WalletEvent> {
        self.events.recv().await
    }

    pub fn unsubscribe(self) {
        // Drop cancels the poller.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Watch `wallet` for account and chain changes every `interval`.
///
/// The first successful poll of each value is the baseline; only later
/// differences are reported.
pub fn subscribe(wallet: Arc<dyn WalletProvider>, interval: Duration) -> Subscription {
    let (tx, events) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    tokio::spawn(poll_wallet(wallet, interval, tx, cancel.clone()));
    Subscription { events, cancel }
}

async fn poll_wallet(
    wallet: Arc<dyn WalletProvider>,
    interval: Duration,
    tx: mpsc::Sender<WalletEvent>,
    cancel: CancellationToken,
) {
    let mut last_accounts: Option<Vec<Address>> = None;
    let mut last_chain: Option<u64> = None;

    loop {
        match wallet.accounts().await {
            Ok(accounts) => {
                let changed = last_accounts.as_ref().is_some_and(|prev| *prev != accounts);
                last_accounts = Some(accounts.clone());
                if changed && tx.send(WalletEvent::AccountsChanged(accounts)).await.is_err() {
                    break;
                }
            }
            Err(e) => debug!("eth_accounts poll failed: {e}"),
        }

        match wallet.chain_id().await {
            Ok(chain) => {
                let changed = last_chain.is_some_and(|prev| prev != chain);
                last_chain = Some(chain);
                if changed && tx.send(WalletEvent::ChainChanged(chain)).await.is_err() {
                    break;
                }
            }
            Err(e) => debug!("eth_chainId poll failed: {e}"),
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    debug!("Wallet subscription closed");
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
