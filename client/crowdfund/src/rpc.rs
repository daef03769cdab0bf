//! JSON-RPC 2.0 client for the chain node and the wallet endpoint.
//!
//! Reads go through [`ChainReader`]; state-changing submissions go through
//! [`TransactionSender`]. Both are traits so the contract adapter can run
//! against in-memory fakes in tests.
//!
//! No retry or back-off happens here: every failure is surfaced to the caller
//! on the first attempt.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::RpcError;

// ─────────────────────────────────────────────────────────
// JSON-RPC shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Parameters of `eth_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
}

/// The subset of `eth_getTransactionReceipt` this client inspects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[allow(dead_code)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    /// `0x1` on success, `0x0` on revert.
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub gas_used: Option<U256>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| !s.is_zero())
    }
}

// ─────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────

/// A JSON-RPC endpoint reached over HTTP POST.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    client: Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Issue a single request and decode its `result`.
    ///
    /// A `null` result decodes successfully into `Option<_>` targets.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("→ {method} (id={id}) {}", self.url);

        let body: RpcResponse = self
            .client
            .post(&self.url)
            .json(&request_body(id, method, params))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        decode_response(body)
    }
}

fn request_body(id: u64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

fn decode_response<T: DeserializeOwned>(body: RpcResponse) -> Result<T, RpcError> {
    if let Some(err) = body.error {
        return Err(RpcError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    Ok(serde_json::from_value(body.result.unwrap_or(Value::Null))?)
}

// ─────────────────────────────────────────────────────────
// Chain access seams
// ─────────────────────────────────────────────────────────

/// Read-only chain queries.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError>;
    async fn code_at(&self, address: Address) -> Result<Bytes, RpcError>;
    async fn balance_of(&self, address: Address) -> Result<U256, RpcError>;
    async fn transaction_count(&self, address: Address) -> Result<u64, RpcError>;
    async fn chain_id(&self) -> Result<u64, RpcError>;
    /// `None` while the transaction is still pending.
    async fn transaction_receipt(&self, hash: B256)
        -> Result<Option<TransactionReceipt>, RpcError>;
}

/// An authenticated identity able to submit transactions.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    fn address(&self) -> Address;
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, RpcError>;
}

/// [`ChainReader`] backed by a JSON-RPC node.
#[derive(Debug, Clone)]
pub struct RpcProvider {
    rpc: JsonRpcClient,
}

impl RpcProvider {
    pub fn new(rpc: JsonRpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl ChainReader for RpcProvider {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        self.rpc
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, RpcError> {
        self.rpc
            .request("eth_getCode", json!([address, "latest"]))
            .await
    }

    async fn balance_of(&self, address: Address) -> Result<U256, RpcError> {
        self.rpc
            .request("eth_getBalance", json!([address, "latest"]))
            .await
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, RpcError> {
        let count: U64 = self
            .rpc
            .request("eth_getTransactionCount", json!([address, "latest"]))
            .await?;
        Ok(count.to::<u64>())
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        let id: U64 = self.rpc.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        self.rpc
            .request("eth_getTransactionReceipt", json!([hash]))
            .await
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn response(raw: &str) -> RpcResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn request_body_shape() {
        let body = request_body(7, "eth_chainId", json!([]));
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], 7);
        assert_eq!(body["method"], "eth_chainId");
        assert_eq!(body["params"], json!([]));
    }

    #[test]
    fn decodes_hex_quantity_result() {
        let id: U64 = decode_response(response(r#"{"jsonrpc":"2.0","id":1,"result":"0x27ea"}"#))
            .unwrap();
        assert_eq!(id.to::<u64>(), 10218);
    }

    #[test]
    fn error_object_takes_precedence() {
        let err = decode_response::<U64>(response(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":4902,"message":"Unrecognized chain ID"}}"#,
        ))
        .unwrap_err();
        assert_eq!(err.code(), Some(4902));
        assert!(err.to_string().contains("Unrecognized chain ID"));
    }

    #[test]
    fn null_result_decodes_as_pending_receipt() {
        let receipt: Option<TransactionReceipt> =
            decode_response(response(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)).unwrap();
        assert!(receipt.is_none());
    }

    #[test]
    fn receipt_status_drives_success() {
        let hash = B256::repeat_byte(0x11);
        let raw = json!({
            "transactionHash": hash,
            "blockNumber": "0x10",
            "status": "0x0",
            "gasUsed": "0x5208",
        });
        let receipt: TransactionReceipt = serde_json::from_value(raw).unwrap();
        assert_eq!(receipt.transaction_hash, hash);
        assert!(!receipt.succeeded());

        let ok: TransactionReceipt =
            serde_json::from_value(json!({ "transactionHash": hash, "status": "0x1" })).unwrap();
        assert!(ok.succeeded());
    }

    #[test]
    fn transaction_request_omits_missing_value() {
        let tx = TransactionRequest {
            from: Address::repeat_byte(0x01),
            to: Address::repeat_byte(0x02),
            data: Bytes::from(vec![0xde, 0xad]),
            value: None,
        };
        let v = serde_json::to_value(&tx).unwrap();
        assert!(v.get("value").is_none());
        assert_eq!(v["data"], "0xdead");

        let paid = TransactionRequest {
            value: Some(U256::from(1u64)),
            ..tx
        };
        let v = serde_json::to_value(&paid).unwrap();
        assert_eq!(v["value"], "0x1");
    }
}
