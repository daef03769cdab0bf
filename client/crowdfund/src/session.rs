//! Session state: who is connected, with which signer and adapter.
//!
//! A session exists only between a successful connect and the next
//! disconnect. A chain change throws the whole session away; the caller
//! restarts from the unconnected state rather than rebinding in place.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use tracing::info;

use crate::contract::ContractService;
use crate::errors::Result;
use crate::network::NetworkConfig;
use crate::wallet::{self, WalletEvent, WalletProvider, WalletSigner};

pub struct Session {
    pub account: Address,
    pub service: ContractService,
}

/// What a wallet notification did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Unchanged,
    AccountSwitched(Address),
    Disconnected,
    /// The chain changed; all state was discarded.
    Reload,
}

pub struct App {
    wallet: Arc<dyn WalletProvider>,
    network: NetworkConfig,
    receipt_poll: Duration,
    session: Option<Session>,
}

impl App {
    pub fn new(wallet: Arc<dyn WalletProvider>, network: NetworkConfig, receipt_poll: Duration) -> Self {
        Self {
            wallet,
            network,
            receipt_poll,
            session: None,
        }
    }

    pub fn wallet(&self) -> Arc<dyn WalletProvider> {
        self.wallet.clone()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Connect the wallet and build a fresh adapter for the account.
    pub async fn connect(&mut self) -> Result<&Session> {
        let conn = wallet::connect(self.wallet.clone(), &self.network).await?;
        let service = ContractService::new(conn.provider, Some(conn.signer))
            .with_receipt_poll(self.receipt_poll);
        let session = self.session.insert(Session {
            account: conn.account,
            service,
        });
        Ok(&*session)
    }

    pub fn handle(&mut self, event: WalletEvent) -> SessionUpdate {
        match event {
            WalletEvent::ChainChanged(chain) => {
                info!("Wallet switched to chain {chain}; discarding session");
                self.session = None;
                SessionUpdate::Reload
            }
            WalletEvent::AccountsChanged(accounts) => {
                let Some(session) = self.session.as_mut() else {
                    return SessionUpdate::Unchanged;
                };
                match accounts.first() {
                    None => {
                        info!("Wallet disconnected");
                        self.session = None;
                        SessionUpdate::Disconnected
                    }
                    Some(&account) if account == session.account => SessionUpdate::Unchanged,
                    Some(&account) => {
                        info!("Active account changed to {account}");
                        session.account = account;
                        session
                            .service
                            .set_signer(Arc::new(WalletSigner::new(self.wallet.clone(), account)));
                        SessionUpdate::AccountSwitched(account)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NETWORK;
    use crate::testing::FakeWallet;

    fn app(wallet: Arc<FakeWallet>) -> App {
        App::new(wallet, NETWORK, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn connect_creates_session() {
        let account = Address::repeat_byte(0xaa);
        let mut app = app(Arc::new(FakeWallet::new(vec![account], NETWORK.chain_id)));

        assert!(app.session().is_none());
        let session = app.connect().await.unwrap();
        assert_eq!(session.account, account);
        assert_eq!(session.service.signer_address(), Some(account));
    }

    #[tokio::test]
    async fn failed_connect_leaves_app_unconnected() {
        let mut app = app(Arc::new(FakeWallet::unreachable()));
        assert!(app.connect().await.is_err());
        assert!(app.session().is_none());
    }

    #[tokio::test]
    async fn empty_accounts_clear_session() {
        let mut app = app(Arc::new(FakeWallet::new(
            vec![Address::repeat_byte(0xaa)],
            NETWORK.chain_id,
        )));
        app.connect().await.unwrap();

        assert_eq!(
            app.handle(WalletEvent::AccountsChanged(vec![])),
            SessionUpdate::Disconnected
        );
        assert!(app.session().is_none());
    }

    #[tokio::test]
    async fn account_switch_repoints_signer() {
        let wallet = Arc::new(FakeWallet::new(
            vec![Address::repeat_byte(0xaa)],
            NETWORK.chain_id,
        ));
        let mut app = app(wallet.clone());
        app.connect().await.unwrap();

        let next = Address::repeat_byte(0xbb);
        assert_eq!(
            app.handle(WalletEvent::AccountsChanged(vec![next])),
            SessionUpdate::AccountSwitched(next)
        );
        let session = app.session().unwrap();
        assert_eq!(session.account, next);
        assert_eq!(session.service.signer_address(), Some(next));

        session.service.withdraw_funds(1).await.unwrap();
        assert_eq!(wallet.sent()[0].from, next);
    }

    #[tokio::test]
    async fn same_account_is_unchanged() {
        let account = Address::repeat_byte(0xaa);
        let mut app = app(Arc::new(FakeWallet::new(vec![account], NETWORK.chain_id)));
        app.connect().await.unwrap();

        assert_eq!(
            app.handle(WalletEvent::AccountsChanged(vec![account])),
            SessionUpdate::Unchanged
        );
    }

    #[tokio::test]
    async fn chain_change_discards_everything() {
        let mut app = app(Arc::new(FakeWallet::new(
            vec![Address::repeat_byte(0xaa)],
            NETWORK.chain_id,
        )));
        app.connect().await.unwrap();

        assert_eq!(app.handle(WalletEvent::ChainChanged(1)), SessionUpdate::Reload);
        assert!(app.session().is_none());
    }

    #[test]
    fn events_without_session_are_ignored() {
        let mut app = app(Arc::new(FakeWallet::new(vec![], NETWORK.chain_id)));
        assert_eq!(
            app.handle(WalletEvent::AccountsChanged(vec![Address::repeat_byte(1)])),
            SessionUpdate::Unchanged
        );
    }
}
