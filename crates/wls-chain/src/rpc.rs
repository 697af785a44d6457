//! `ChainReader` over HTTP JSON-RPC.
//!
//! The endpoint URL usually embeds an API key. It is never logged and never
//! placed in an error: transport errors are stripped of their URL.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use wls_schemas::{Address, CallKey, SyncError};

use crate::abi::{self, to_hex};
use crate::{ChainReader, LogFilter, RawLog};

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    topics: Vec<String>,
    data: String,
    block_number: Option<String>,
    log_index: Option<String>,
    /// Set on logs dropped by a reorg.
    #[serde(default)]
    removed: bool,
}

pub struct JsonRpcReader {
    http: reqwest::Client,
    url: String,
    chain: String,
    next_id: AtomicU64,
}

impl std::fmt::Debug for JsonRpcReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcReader")
            .field("chain", &self.chain)
            .field("url", &"<REDACTED>")
            .finish()
    }
}

impl JsonRpcReader {
    /// Build a reader without contacting the node.
    pub fn new(url: impl Into<String>, chain: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            chain: chain.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Build a reader and check `eth_chainId` against the registry.
    pub async fn connect(
        url: impl Into<String>,
        chain: impl Into<String>,
        expected_chain_id: u64,
    ) -> Result<Self, SyncError> {
        let reader = Self::new(url, chain);
        let got = reader.chain_id().await?;
        if got != expected_chain_id {
            return Err(SyncError::ChainMismatch {
                chain: reader.chain.clone(),
                expected: expected_chain_id,
                got,
            });
        }
        info!(chain = %reader.chain, chain_id = got, "connected to rpc endpoint");
        Ok(reader)
    }

    pub async fn chain_id(&self) -> Result<u64, SyncError> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        parse_quantity("eth_chainId", &raw)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, SyncError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(chain = %self.chain, method, id, "rpc request");

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::rpc(method, e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::rpc(
                method,
                format!("http status {}", status.as_u16()),
            ));
        }

        let parsed: RpcResponse<T> = resp
            .json()
            .await
            .map_err(|e| SyncError::rpc(method, format!("response decode failed: {}", e.without_url())))?;

        if let Some(err) = parsed.error {
            return Err(SyncError::rpc(
                method,
                format!("code={} {}", err.code, err.message),
            ));
        }
        parsed
            .result
            .ok_or_else(|| SyncError::rpc(method, "response has neither result nor error"))
    }

    async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, SyncError> {
        let raw: String = self
            .request(
                "eth_call",
                json!([{ "to": to.to_string(), "data": to_hex(&data) }, "latest"]),
            )
            .await?;
        decode_hex_bytes("eth_call", &raw)
    }
}

#[async_trait::async_trait]
impl ChainReader for JsonRpcReader {
    async fn allowed_call_state(&self, guard: Address, key: CallKey) -> Result<u64, SyncError> {
        let ret = self.eth_call(guard, abi::encode_allowed_calls(key)).await?;
        abi::decode_state_word(&ret, || {
            format!("{} guard {guard} allowedCalls({key})", self.chain)
        })
    }

    async fn is_module_call_blocked(
        &self,
        module: Address,
        key: CallKey,
    ) -> Result<bool, SyncError> {
        let ret = self
            .eth_call(module, abi::encode_blocked_module_calls(key))
            .await?;
        abi::decode_bool(&ret)
    }

    async fn block_number(&self) -> Result<u64, SyncError> {
        let raw: String = self.request("eth_blockNumber", json!([])).await?;
        parse_quantity("eth_blockNumber", &raw)
    }

    async fn logs(&self, filter: LogFilter) -> Result<Vec<RawLog>, SyncError> {
        let raw: Vec<RpcLog> = self
            .request(
                "eth_getLogs",
                json!([{
                    "address": filter.address.to_string(),
                    "topics": [to_hex(&filter.topic0)],
                    "fromBlock": format!("0x{:x}", filter.from_block),
                    "toBlock": format!("0x{:x}", filter.to_block),
                }]),
            )
            .await?;
        let total = raw.len();
        let logs: Vec<RawLog> = raw
            .into_iter()
            .filter(|l| !l.removed)
            .map(convert_log)
            .collect::<Result<_, _>>()?;
        if logs.len() < total {
            debug!(
                chain = %self.chain,
                from = filter.from_block,
                to = filter.to_block,
                removed = total - logs.len(),
                "skipped reorged logs"
            );
        }
        Ok(logs)
    }
}

fn convert_log(log: RpcLog) -> Result<RawLog, SyncError> {
    let mut topics = Vec::with_capacity(log.topics.len());
    for t in &log.topics {
        let bytes = decode_hex_bytes("eth_getLogs", t)?;
        let word: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SyncError::Decode(format!("topic is not 32 bytes: {t}")))?;
        topics.push(word);
    }
    let block_number = log
        .block_number
        .as_deref()
        .ok_or_else(|| SyncError::Decode("log without blockNumber (pending?)".to_string()))
        .and_then(|s| parse_quantity("eth_getLogs", s))?;
    let log_index = log
        .log_index
        .as_deref()
        .ok_or_else(|| SyncError::Decode("log without logIndex (pending?)".to_string()))
        .and_then(|s| parse_quantity("eth_getLogs", s))?;

    Ok(RawLog {
        topics,
        data: decode_hex_bytes("eth_getLogs", &log.data)?,
        block_number,
        log_index,
    })
}

fn parse_quantity(method: &str, raw: &str) -> Result<u64, SyncError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| SyncError::Decode(format!("{method}: quantity without 0x prefix: {raw}")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| SyncError::Decode(format!("{method}: bad quantity {raw}: {e}")))
}

fn decode_hex_bytes(method: &str, raw: &str) -> Result<Vec<u8>, SyncError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|e| SyncError::Decode(format!("{method}: bad hex data: {e}")))
}
