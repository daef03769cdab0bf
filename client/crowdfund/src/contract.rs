//! Contract access adapter.
//!
//! Translates domain calls into ABI calls against the crowdfunding contract
//! and normalises the results. Reads need only a [`ChainReader`]; writes also
//! need a signer and fail with [`Error::NotAuthenticated`] before touching the
//! network when none is set.
//!
//! ## `createProject` probing
//!
//! The deployed contract's exact `createProject` interface is not known, so
//! [`ContractService::create_project`] walks [`CREATE_PROJECT_CANDIDATES`] in
//! order and returns the first submission the wallet accepts. Nothing else in
//! the adapter retries.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use tracing::{debug, error, info, warn};

use crate::errors::{Error, Result, RpcError, SignatureFailure};
use crate::network::{abi, CONTRACT};
use crate::project::Project;
use crate::rpc::{ChainReader, TransactionReceipt, TransactionRequest, TransactionSender};
use crate::units::{format_currency, parse_currency};

const DEFAULT_RECEIPT_POLL: Duration = Duration::from_secs(2);

// ─────────────────────────────────────────────────────────
// createProject candidates
// ─────────────────────────────────────────────────────────

/// Arguments shared by every `createProject` candidate.
#[derive(Debug, Clone)]
pub struct CreateProjectArgs {
    pub title: String,
    pub description: String,
    pub funding_goal: U256,
    pub deadline: U256,
    /// The submitting account, used by the beneficiary variant.
    pub sender: Address,
}

/// One call shape to try.
#[derive(Debug, Clone, Copy)]
pub struct CreateCandidate {
    pub signature: &'static str,
    pub encode: fn(&CreateProjectArgs) -> Vec<u8>,
}

/// Priority order of the `createProject` probe.
pub const CREATE_PROJECT_CANDIDATES: [CreateCandidate; 5] = [
    CreateCandidate {
        signature: <abi::createProjectCall as SolCall>::SIGNATURE,
        encode: encode_canonical,
    },
    CreateCandidate {
        signature: <abi::featured::createProjectCall as SolCall>::SIGNATURE,
        encode: encode_featured,
    },
    CreateCandidate {
        signature: <abi::beneficiary::createProjectCall as SolCall>::SIGNATURE,
        encode: encode_beneficiary,
    },
    CreateCandidate {
        signature: <abi::addProjectCall as SolCall>::SIGNATURE,
        encode: encode_add_project,
    },
    CreateCandidate {
        signature: <abi::startProjectCall as SolCall>::SIGNATURE,
        encode: encode_start_project,
    },
];

fn encode_canonical(a: &CreateProjectArgs) -> Vec<u8> {
    abi::createProjectCall {
        title: a.title.clone(),
        description: a.description.clone(),
        fundingGoal: a.funding_goal,
        deadline: a.deadline,
    }
    .abi_encode()
}

fn encode_featured(a: &CreateProjectArgs) -> Vec<u8> {
    abi::featured::createProjectCall {
        title: a.title.clone(),
        description: a.description.clone(),
        fundingGoal: a.funding_goal,
        deadline: a.deadline,
        featured: true,
    }
    .abi_encode()
}

fn encode_beneficiary(a: &CreateProjectArgs) -> Vec<u8> {
    abi::beneficiary::createProjectCall {
        title: a.title.clone(),
        description: a.description.clone(),
        fundingGoal: a.funding_goal,
        deadline: a.deadline,
        beneficiary: a.sender,
    }
    .abi_encode()
}

fn encode_add_project(a: &CreateProjectArgs) -> Vec<u8> {
    abi::addProjectCall {
        title: a.title.clone(),
        description: a.description.clone(),
        fundingGoal: a.funding_goal,
        deadline: a.deadline,
    }
    .abi_encode()
}

fn encode_start_project(a: &CreateProjectArgs) -> Vec<u8> {
    abi::startProjectCall {
        title: a.title.clone(),
        description: a.description.clone(),
        fundingGoal: a.funding_goal,
        deadline: a.deadline,
    }
    .abi_encode()
}

// ─────────────────────────────────────────────────────────
// Transaction handles
// ─────────────────────────────────────────────────────────

/// A submitted, not yet confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: B256,
}

/// Outcome of a successful `createProject` probe.
#[derive(Debug, Clone)]
pub struct CreatedProject {
    pub tx: PendingTransaction,
    /// Signature of the candidate that was accepted.
    pub signature: &'static str,
    /// 1-based position in [`CREATE_PROJECT_CANDIDATES`].
    pub attempt: usize,
}

// ─────────────────────────────────────────────────────────
// Adapter
// ─────────────────────────────────────────────────────────

pub struct ContractService {
    reader: Arc<dyn ChainReader>,
    signer: Option<Arc<dyn TransactionSender>>,
    address: Address,
    receipt_poll: Duration,
}

impl ContractService {
    pub fn new(reader: Arc<dyn ChainReader>, signer: Option<Arc<dyn TransactionSender>>) -> Self {
        Self {
            reader,
            signer,
            address: CONTRACT.address,
            receipt_poll: DEFAULT_RECEIPT_POLL,
        }
    }

    pub fn with_receipt_poll(mut self, interval: Duration) -> Self {
        self.receipt_poll = interval;
        self
    }

    /// Replace the signer used for writes.
    pub fn set_signer(&mut self, signer: Arc<dyn TransactionSender>) {
        self.signer = Some(signer);
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn reader(&self) -> &dyn ChainReader {
        self.reader.as_ref()
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    fn signer(&self) -> Result<&Arc<dyn TransactionSender>> {
        self.signer.as_ref().ok_or(Error::NotAuthenticated)
    }

    async fn call<C: SolCall>(&self, call: C, what: String) -> Result<C::Return> {
        let data = match self.reader.call(self.address, call.abi_encode().into()).await {
            Ok(data) => data,
            Err(source) => {
                error!("Error fetching {what}: {source}");
                return Err(Error::QueryFailed { what, source });
            }
        };
        C::abi_decode_returns(&data, true).map_err(|e| {
            error!("Error decoding {what}: {e}");
            Error::QueryFailed {
                what,
                source: RpcError::Decode(e.to_string()),
            }
        })
    }

    // ─── Reads ───────────────────────────────────────────

    pub async fn contract_name(&self) -> Result<String> {
        let ret = self
            .call(abi::nameCall {}, "contract name".to_string())
            .await?;
        Ok(ret.contractName)
    }

    pub async fn owner(&self) -> Result<Address> {
        let ret = self
            .call(abi::ownerCall {}, "contract owner".to_string())
            .await?;
        Ok(ret.contractOwner)
    }

    pub async fn list_project_ids(&self) -> Result<Vec<u64>> {
        let what = "projects".to_string();
        let ret = self.call(abi::getProjectsCall {}, what.clone()).await?;
        ret.projectIds
            .into_iter()
            .map(|id| to_u64(id, &what))
            .collect()
    }

    pub async fn get_project_details(&self, project_id: u64) -> Result<Project> {
        let what = format!("project details for ID {project_id}");
        let id = U256::from(project_id);
        let details = self
            .call(abi::getProjectDetailsCall { projectId: id }, what.clone())
            .await?;
        let funding = self
            .call(
                abi::getContributionsForProjectCall { projectId: id },
                what.clone(),
            )
            .await?;

        Ok(Project {
            id: project_id,
            title: details.title,
            description: details.description,
            funding_goal: details.fundingGoal,
            current_funding: funding.total,
            deadline: to_u64(details.deadline, &what)?,
            creator: details.creator,
            is_completed: details.isCompleted,
        })
    }

    pub async fn get_contributor_count(&self, project_id: u64) -> Result<u64> {
        let what = format!("contributor count for project ID {project_id}");
        let ret = self
            .call(
                abi::getContributorCountCall {
                    projectId: U256::from(project_id),
                },
                what.clone(),
            )
            .await?;
        to_u64(ret.count, &what)
    }

    /// Every project, details fetched concurrently; any failure fails the whole list.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let ids = self.list_project_ids().await?;
        debug!("Fetching details for {} projects", ids.len());
        try_join_all(ids.into_iter().map(|id| self.get_project_details(id))).await
    }

    /// Case-insensitive creator check. A failed read reports `false`.
    pub async fn is_project_creator(&self, project_id: u64, address: &str) -> bool {
        let what = format!("creator of project ID {project_id}");
        match self
            .call(
                abi::getProjectDetailsCall {
                    projectId: U256::from(project_id),
                },
                what,
            )
            .await
        {
            Ok(details) => details
                .creator
                .to_string()
                .eq_ignore_ascii_case(address.trim()),
            Err(e) => {
                warn!("Error checking if user is project creator: {e}");
                false
            }
        }
    }

    // ─── Writes ──────────────────────────────────────────

    /// Probe the `createProject` candidates in order, paying `value_to_send`.
    pub async fn create_project(
        &self,
        title: &str,
        description: &str,
        funding_goal: &str,
        deadline: DateTime<Utc>,
        value_to_send: &str,
    ) -> Result<CreatedProject> {
        let signer = self.signer()?;
        let args = CreateProjectArgs {
            title: title.to_string(),
            description: description.to_string(),
            funding_goal: parse_currency(funding_goal)?,
            deadline: U256::from(u64::try_from(deadline.timestamp()).unwrap_or(0)),
            sender: signer.address(),
        };
        let value = parse_currency(value_to_send)?;

        let mut failures = Vec::with_capacity(CREATE_PROJECT_CANDIDATES.len());
        for (index, candidate) in CREATE_PROJECT_CANDIDATES.iter().enumerate() {
            let tx = TransactionRequest {
                from: args.sender,
                to: self.address,
                data: Bytes::from((candidate.encode)(&args)),
                value: Some(value),
            };
            match signer.send_transaction(tx).await {
                Ok(hash) => {
                    info!(
                        "createProject submitted via {} (attempt {}): {hash}",
                        candidate.signature,
                        index + 1
                    );
                    return Ok(CreatedProject {
                        tx: PendingTransaction { hash },
                        signature: candidate.signature,
                        attempt: index + 1,
                    });
                }
                Err(source) => {
                    warn!("createProject via {} rejected: {source}", candidate.signature);
                    failures.push(SignatureFailure {
                        signature: candidate.signature,
                        source,
                    });
                }
            }
        }

        error!("All createProject signatures failed");
        Err(Error::AllSignaturesExhausted { failures })
    }

    pub async fn contribute(&self, project_id: u64, amount: &str) -> Result<PendingTransaction> {
        let signer = self.signer()?;
        let value = parse_currency(amount)?;
        let tx = TransactionRequest {
            from: signer.address(),
            to: self.address,
            data: abi::contributeCall {
                projectId: U256::from(project_id),
            }
            .abi_encode()
            .into(),
            value: Some(value),
        };
        let hash = signer.send_transaction(tx).await.map_err(|source| {
            error!("Error contributing to project ID {project_id}: {source}");
            Error::ContributionFailed { project_id, source }
        })?;
        info!(
            "Contribution of {} to project {project_id} submitted: {hash}",
            format_currency(value)
        );
        Ok(PendingTransaction { hash })
    }

    pub async fn withdraw_funds(&self, project_id: u64) -> Result<PendingTransaction> {
        let signer = self.signer()?;
        let tx = TransactionRequest {
            from: signer.address(),
            to: self.address,
            data: abi::withdrawFundsCall {
                projectId: U256::from(project_id),
            }
            .abi_encode()
            .into(),
            value: None,
        };
        let hash = signer.send_transaction(tx).await.map_err(|source| {
            error!("Error withdrawing funds from project ID {project_id}: {source}");
            Error::WithdrawalFailed { project_id, source }
        })?;
        info!("Withdrawal from project {project_id} submitted: {hash}");
        Ok(PendingTransaction { hash })
    }

    /// Poll until `tx` is mined. No timeout.
    pub async fn wait(&self, tx: &PendingTransaction) -> Result<TransactionReceipt> {
        loop {
            match self.reader.transaction_receipt(tx.hash).await {
                Ok(Some(receipt)) if receipt.succeeded() => return Ok(receipt),
                Ok(Some(_)) => {
                    error!("Transaction {} reverted", tx.hash);
                    return Err(Error::Reverted { hash: tx.hash });
                }
                Ok(None) => tokio::time::sleep(self.receipt_poll).await,
                Err(source) => {
                    error!("Error fetching receipt for {}: {source}", tx.hash);
                    return Err(Error::QueryFailed {
                        what: format!("receipt for {}", tx.hash),
                        source,
                    });
                }
            }
        }
    }

    /// Minimal units to a decimal string.
    pub fn format_currency(minimal_units: U256) -> String {
        format_currency(minimal_units)
    }
}

fn to_u64(value: U256, what: &str) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(Error::QueryFailed {
            what: what.to_string(),
            source: RpcError::Decode(format!("{value} does not fit in u64")),
        });
    }
    Ok(value.to::<u64>())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
