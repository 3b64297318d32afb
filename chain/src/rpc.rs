//! Ethereum JSON-RPC 2.0 transport over `reqwest`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use symposium_types::{decode_hex_prefixed, Address, TxHash, Wei};

use crate::error::ChainError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// User rejected the request (EIP-1193).
pub const USER_REJECTED: i64 = 4001;

/// HTTP client for one Ethereum node endpoint.
#[derive(Clone)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

/// `eth_getTransactionReceipt` result, fields as the node sends them.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<String>,
    /// `0x1` success, `0x0` reverted. Absent on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<String>,
}

/// One entry of `eth_getFilterChanges` for a log filter.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

/// Map a JSON-RPC error object onto the client's taxonomy.
pub fn map_rpc_error(method: &str, code: i64, message: String) -> ChainError {
    if code == USER_REJECTED || method == "eth_sendTransaction" {
        ChainError::TransactionRejected(message)
    } else {
        ChainError::Rpc { code, message }
    }
}

/// Parse a hex quantity (`"0x1a"`).
pub fn parse_quantity(s: &str) -> Result<u128, ChainError> {
    let body = s
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::InvalidResponse(format!("quantity without 0x: {s}")))?;
    if body.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(body, 16)
        .map_err(|_| ChainError::InvalidResponse(format!("bad quantity: {s}")))
}

pub fn parse_u64_quantity(s: &str) -> Result<u64, ChainError> {
    let v = parse_quantity(s)?;
    u64::try_from(v).map_err(|_| ChainError::InvalidResponse(format!("quantity too large: {s}")))
}

pub fn parse_data(s: &str) -> Result<Vec<u8>, ChainError> {
    decode_hex_prefixed(s).map_err(|e| ChainError::InvalidResponse(format!("bad hex data: {e}")))
}

fn quantity(v: u128) -> String {
    format!("0x{v:x}")
}

fn data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ChainError::Connection(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and deserialize its `result`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::trace!(method, id, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChainError::Connection(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    ChainError::Connection(format!("connection failed: {e}"))
                } else {
                    ChainError::Connection(format!("request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(ChainError::Connection(format!(
                "node returned HTTP {}",
                response.status()
            )));
        }

        let mut json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(format!("invalid JSON response: {e}")))?;

        if let Some(err) = json.get("error") {
            let err: RpcErrorObject = serde_json::from_value(err.clone())
                .map_err(|e| ChainError::InvalidResponse(format!("malformed error object: {e}")))?;
            tracing::debug!(method, code = err.code, message = %err.message, "rpc error");
            return Err(map_rpc_error(method, err.code, err.message));
        }

        let result = json
            .get_mut("result")
            .map(serde_json::Value::take)
            .ok_or_else(|| ChainError::InvalidResponse(format!("{method}: no result field")))?;
        serde_json::from_value(result)
            .map_err(|e| ChainError::InvalidResponse(format!("{method}: {e}")))
    }

    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        let raw: String = self.call("eth_chainId", serde_json::json!([])).await?;
        parse_u64_quantity(&raw)
    }

    pub async fn get_code(&self, address: &Address) -> Result<Vec<u8>, ChainError> {
        let raw: String = self
            .call("eth_getCode", serde_json::json!([address.to_string(), "latest"]))
            .await?;
        parse_data(&raw)
    }

    pub async fn eth_call(&self, to: &Address, input: &[u8]) -> Result<Vec<u8>, ChainError> {
        let raw: String = self
            .call(
                "eth_call",
                serde_json::json!([{ "to": to.to_string(), "data": data(input) }, "latest"]),
            )
            .await?;
        parse_data(&raw)
    }

    /// Submit a transaction signed by the node's unlocked `from` account.
    pub async fn send_transaction(
        &self,
        from: &Address,
        to: &Address,
        input: &[u8],
        value: Wei,
    ) -> Result<TxHash, ChainError> {
        let mut tx = serde_json::json!({
            "from": from.to_string(),
            "to": to.to_string(),
            "data": data(input),
        });
        if !value.is_zero() {
            tx["value"] = serde_json::json!(quantity(value.raw()));
        }
        let raw: String = self
            .call("eth_sendTransaction", serde_json::json!([tx]))
            .await?;
        raw.parse()
            .map_err(|_| ChainError::InvalidResponse(format!("bad transaction hash: {raw}")))
    }

    /// `None` while the transaction is not yet mined.
    pub async fn transaction_receipt(
        &self,
        hash: &TxHash,
    ) -> Result<Option<RawReceipt>, ChainError> {
        self.call(
            "eth_getTransactionReceipt",
            serde_json::json!([hash.to_string()]),
        )
        .await
    }

    /// Install a log filter on `address` starting at the latest block.
    pub async fn new_filter(&self, address: &Address) -> Result<String, ChainError> {
        self.call(
            "eth_newFilter",
            serde_json::json!([{ "address": address.to_string(), "fromBlock": "latest" }]),
        )
        .await
    }

    pub async fn filter_changes(&self, filter: &str) -> Result<Vec<RawLog>, ChainError> {
        self.call("eth_getFilterChanges", serde_json::json!([filter]))
            .await
    }

    pub async fn uninstall_filter(&self, filter: &str) -> Result<bool, ChainError> {
        self.call("eth_uninstallFilter", serde_json::json!([filter]))
            .await
    }
}
