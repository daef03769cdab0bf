//! Read-only health check of the deployed contract.

use std::fmt::Write as _;

use alloy_primitives::{Address, U256};
use tracing::{error, info};

use crate::contract::ContractService;
use crate::errors::{Error, Result, RpcError};
use crate::network::NetworkConfig;
use crate::units::format_currency;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractReport {
    pub address: Address,
    /// Bytes of deployed code; zero means nothing lives at the address.
    pub code_size: usize,
    pub details: Option<DeployedDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedDetails {
    /// `None` when the metadata getter could not be read.
    pub name: Option<String>,
    pub owner: Option<Address>,
    pub transaction_count: u64,
    pub balance: U256,
    pub chain_id: u64,
}

fn query_failed(what: &str) -> impl FnOnce(RpcError) -> Error + '_ {
    move |source| {
        error!("Error fetching {what}: {source}");
        Error::QueryFailed {
            what: what.to_string(),
            source,
        }
    }
}

/// Inspect the contract the adapter is bound to.
pub async fn analyze(service: &ContractService) -> Result<ContractReport> {
    let reader = service.reader();
    let address = service.address();
    let code = reader
        .code_at(address)
        .await
        .map_err(query_failed("contract code"))?;
    if code.is_empty() {
        info!("No contract found at {address}");
        return Ok(ContractReport {
            address,
            code_size: 0,
            details: None,
        });
    }

    let transaction_count = reader
        .transaction_count(address)
        .await
        .map_err(query_failed("transaction count"))?;
    let balance = reader
        .balance_of(address)
        .await
        .map_err(query_failed("contract balance"))?;
    let chain_id = reader
        .chain_id()
        .await
        .map_err(query_failed("network identity"))?;
    let name = service.contract_name().await.ok();
    let owner = service.owner().await.ok();

    Ok(ContractReport {
        address,
        code_size: code.len(),
        details: Some(DeployedDetails {
            name,
            owner,
            transaction_count,
            balance,
            chain_id,
        }),
    })
}

impl ContractReport {
    pub fn render(&self, network: &NetworkConfig) -> String {
        let Some(details) = &self.details else {
            return format!("No contract found at {}", self.address);
        };
        let mut out = String::new();
        let _ = writeln!(out, "Contract exists at {} ({} bytes)", self.address, self.code_size);
        let _ = writeln!(
            out,
            "Name: {}",
            details.name.as_deref().unwrap_or("unavailable")
        );
        let _ = writeln!(
            out,
            "Owner: {}",
            details
                .owner
                .map(|owner| owner.to_string())
                .unwrap_or_else(|| "unavailable".to_string())
        );
        let _ = writeln!(out, "Transaction count: {}", details.transaction_count);
        let _ = writeln!(
            out,
            "Balance: {} {}",
            format_currency(details.balance),
            network.symbol
        );
        let _ = write!(
            out,
            "Connected to network: {} (Chain ID: {})",
            network.name, details.chain_id
        );
        if details.chain_id != network.chain_id {
            let _ = write!(out, " (expected {})", network.chain_id);
        }
        out
    }
}
