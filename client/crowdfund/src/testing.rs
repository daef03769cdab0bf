//! In-memory chain, signer and wallet used by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;

use crate::errors::RpcError;
use crate::network::abi;
use crate::project::Project;
use crate::rpc::{ChainReader, TransactionReceipt, TransactionRequest, TransactionSender};
use crate::units::parse_currency;
use crate::wallet::{AddChainParams, WalletProvider};

pub fn sample_project(id: u64) -> Project {
    Project {
        id,
        title: format!("Project {id}"),
        description: "Community garden beds".to_string(),
        funding_goal: parse_currency("10").unwrap(),
        current_funding: parse_currency("4").unwrap(),
        deadline: 1_900_000_000,
        creator: Address::repeat_byte(0xc1),
        is_completed: false,
    }
}

fn reverted() -> RpcError {
    RpcError::Rpc {
        code: -32000,
        message: "execution reverted".to_string(),
    }
}

fn decode_err(e: alloy_sol_types::Error) -> RpcError {
    RpcError::Decode(e.to_string())
}

// ─────────────────────────────────────────────────────────
// Chain
// ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeChain {
    projects: Mutex<Vec<Project>>,
    failing: Mutex<Vec<u64>>,
    calls: AtomicUsize,
    /// hash → (pending polls left, success)
    receipts: Mutex<HashMap<B256, (usize, bool)>>,
    code: Bytes,
    balance: U256,
    tx_count: u64,
    chain_id: u64,
}

impl FakeChain {
    pub fn with_projects(projects: Vec<Project>) -> Self {
        Self {
            projects: Mutex::new(projects),
            ..Self::default()
        }
    }

    /// Account state of a contract deployed at every address.
    pub fn deployed(code: Bytes, balance: U256, tx_count: u64, chain_id: u64) -> Self {
        Self {
            code,
            balance,
            tx_count,
            chain_id,
            ..Self::default()
        }
    }

    /// Reads of `id` revert.
    pub fn failing(self, id: u64) -> Self {
        self.failing.lock().unwrap().push(id);
        self
    }

    pub fn set_failing(&self, id: u64) {
        self.failing.lock().unwrap().push(id);
    }

    pub fn update(&self, id: u64, f: impl FnOnce(&mut Project)) {
        let mut projects = self.projects.lock().unwrap();
        if let Some(p) = projects.iter_mut().find(|p| p.id == id) {
            f(p);
        }
    }

    pub fn mine_after(&self, hash: B256, pending_polls: usize, success: bool) {
        self.receipts
            .lock()
            .unwrap()
            .insert(hash, (pending_polls, success));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn project(&self, id: U256) -> Result<Project, RpcError> {
        let id = id.to::<u64>();
        if self.failing.lock().unwrap().contains(&id) {
            return Err(reverted());
        }
        self.projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(reverted)
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| RpcError::Decode("short calldata".to_string()))?;

        let encoded = if selector == abi::nameCall::SELECTOR {
            ("Crowdfunding".to_string(),).abi_encode_params()
        } else if selector == abi::ownerCall::SELECTOR {
            (Address::repeat_byte(0x0e),).abi_encode_params()
        } else if selector == abi::getProjectsCall::SELECTOR {
            let ids: Vec<U256> = self
                .projects
                .lock()
                .unwrap()
                .iter()
                .map(|p| U256::from(p.id))
                .collect();
            (ids,).abi_encode_params()
        } else if selector == abi::getProjectDetailsCall::SELECTOR {
            let call = abi::getProjectDetailsCall::abi_decode(&data, true).map_err(decode_err)?;
            let p = self.project(call.projectId)?;
            (
                p.title,
                p.description,
                p.funding_goal,
                U256::from(p.deadline),
                p.creator,
                p.is_completed,
            )
                .abi_encode_params()
        } else if selector == abi::getContributionsForProjectCall::SELECTOR {
            let call = abi::getContributionsForProjectCall::abi_decode(&data, true)
                .map_err(decode_err)?;
            (self.project(call.projectId)?.current_funding,).abi_encode_params()
        } else if selector == abi::getContributorCountCall::SELECTOR {
            let call =
                abi::getContributorCountCall::abi_decode(&data, true).map_err(decode_err)?;
            self.project(call.projectId)?;
            (U256::from(3u64),).abi_encode_params()
        } else {
            return Err(reverted());
        };
        Ok(Bytes::from(encoded))
    }

    async fn code_at(&self, _address: Address) -> Result<Bytes, RpcError> {
        Ok(self.code.clone())
    }

    async fn balance_of(&self, _address: Address) -> Result<U256, RpcError> {
        Ok(self.balance)
    }

    async fn transaction_count(&self, _address: Address) -> Result<u64, RpcError> {
        Ok(self.tx_count)
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(self.chain_id)
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        let mut receipts = self.receipts.lock().unwrap();
        let entry = receipts.entry(hash).or_insert((0, true));
        if entry.0 > 0 {
            entry.0 -= 1;
            return Ok(None);
        }
        Ok(Some(TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(U64::from(1u64)),
            status: Some(U64::from(u64::from(entry.1))),
            gas_used: None,
        }))
    }
}

// ─────────────────────────────────────────────────────────
// Signer
// ─────────────────────────────────────────────────────────

pub struct FakeSigner {
    address: Address,
    reject_first: usize,
    sent: Mutex<Vec<TransactionRequest>>,
}

impl FakeSigner {
    pub fn accepting() -> Self {
        Self::rejecting_first(0)
    }

    /// The first `n` submissions fail.
    pub fn rejecting_first(n: usize) -> Self {
        Self {
            address: Address::repeat_byte(0xc1),
            reject_first: n,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSender for FakeSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, RpcError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(tx);
        if sent.len() <= self.reject_first {
            return Err(reverted());
        }
        Ok(B256::with_last_byte(sent.len() as u8))
    }
}

// ─────────────────────────────────────────────────────────
// Wallet
// ─────────────────────────────────────────────────────────

pub struct FakeWallet {
    reachable: bool,
    accounts: Mutex<Vec<Address>>,
    chain_id: Mutex<u64>,
    switch_error: Option<i64>,
    add_fails: bool,
    requests: Mutex<Vec<String>>,
    switched: Mutex<Vec<String>>,
    added: Mutex<Vec<AddChainParams>>,
    sent: Mutex<Vec<TransactionRequest>>,
    chain: Arc<FakeChain>,
}

impl FakeWallet {
    pub fn new(accounts: Vec<Address>, chain_id: u64) -> Self {
        Self {
            reachable: true,
            accounts: Mutex::new(accounts),
            chain_id: Mutex::new(chain_id),
            switch_error: None,
            add_fails: false,
            requests: Mutex::new(Vec::new()),
            switched: Mutex::new(Vec::new()),
            added: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            chain: Arc::new(FakeChain::default()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new(Vec::new(), 0)
        }
    }

    pub fn with_switch_error(mut self, code: i64) -> Self {
        self.switch_error = Some(code);
        self
    }

    pub fn with_add_error(mut self) -> Self {
        self.add_fails = true;
        self
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    pub fn set_chain_id(&self, id: u64) {
        *self.chain_id.lock().unwrap() = id;
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn switched_to(&self) -> Vec<String> {
        self.switched.lock().unwrap().clone()
    }

    pub fn added(&self) -> Vec<AddChainParams> {
        self.added.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, method: &str) -> Result<(), RpcError> {
        self.requests.lock().unwrap().push(method.to_string());
        if self.reachable {
            Ok(())
        } else {
            Err(RpcError::Rpc {
                code: -32603,
                message: "wallet endpoint unreachable".to_string(),
            })
        }
    }

    fn adopt_chain(&self, hex: &str) {
        if let Ok(id) = u64::from_str_radix(hex.trim_start_matches("0x"), 16) {
            self.set_chain_id(id);
        }
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, RpcError> {
        self.record("eth_requestAccounts")?;
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>, RpcError> {
        self.record("eth_accounts")?;
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        self.record("eth_chainId")?;
        Ok(*self.chain_id.lock().unwrap())
    }

    async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), RpcError> {
        self.record("wallet_switchEthereumChain")?;
        if let Some(code) = self.switch_error {
            return Err(RpcError::Rpc {
                code,
                message: "switch rejected".to_string(),
            });
        }
        self.switched.lock().unwrap().push(chain_id_hex.to_string());
        self.adopt_chain(chain_id_hex);
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), RpcError> {
        self.record("wallet_addEthereumChain")?;
        if self.add_fails {
            return Err(RpcError::Rpc {
                code: 4001,
                message: "User rejected the request.".to_string(),
            });
        }
        self.added.lock().unwrap().push(params.clone());
        self.adopt_chain(&params.chain_id);
        Ok(())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, RpcError> {
        self.record("eth_sendTransaction")?;
        self.sent.lock().unwrap().push(tx);
        Ok(B256::repeat_byte(0x99))
    }

    fn provider(&self) -> Arc<dyn ChainReader> {
        self.chain.clone()
    }
}
