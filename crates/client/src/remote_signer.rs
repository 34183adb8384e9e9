//! Wallet that keeps its key outside this process.
//!
//! Signing requests are sent as `eth_signTransaction` JSON-RPC calls to a
//! signer proxy (a hardware-backed signer, a browser-extension bridge, clef...).
//! The proxy may answer with geth's `{ raw, tx }` object or with the bare raw
//! transaction hex string.

use alloy_primitives::{Address, Bytes};
use alloy_rpc_types::eth::TransactionRequest;
use eyre::{bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Remote signer for a single account.
///
/// ```ignore
/// let signer = RemoteSigner::new("http://localhost:8550", address, 11155111);
/// let raw = signer.sign_transaction(tx_request).await?;
/// provider.send_raw_transaction(&raw).await?;
/// ```
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    client: reqwest::Client,
    proxy_url: String,
    address: Address,
    chain_id: u64,
    next_id: Arc<AtomicU64>,
}

impl RemoteSigner {
    /// Creates a new remote signer for `address` on `chain_id`.
    pub fn new(proxy_url: impl Into<String>, address: Address, chain_id: u64) -> Self {
        Self::with_client(reqwest::Client::new(), proxy_url, address, chain_id)
    }

    /// Creates a new remote signer with a custom HTTP client.
    pub fn with_client(
        client: reqwest::Client,
        proxy_url: impl Into<String>,
        address: Address,
        chain_id: u64,
    ) -> Self {
        Self {
            client,
            proxy_url: proxy_url.into(),
            address,
            chain_id,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Signs a fully filled transaction and returns the EIP-2718 encoded bytes.
    pub async fn sign_transaction(&self, tx: TransactionRequest) -> Result<Bytes> {
        if tx.from.is_some_and(|from| from != self.address) {
            bail!(
                "transaction sender does not match remote signer account {}",
                self.address
            );
        }

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: "eth_signTransaction",
            params: [tx],
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let response = self
            .client
            .post(&self.proxy_url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            bail!("signer proxy returned {status}: {body}");
        }

        let rpc_response: JsonRpcResponse = response.json().await?;
        rpc_response.into_raw_transaction()
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<SignedTransaction>,
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn into_raw_transaction(self) -> Result<Bytes> {
        match (self.result, self.error) {
            (_, Some(error)) => bail!("JSON-RPC error {}: {}", error.code, error.message),
            (Some(SignedTransaction::Raw(raw)), None)
            | (Some(SignedTransaction::Object { raw }), None) => Ok(raw.parse()?),
            (None, None) => bail!("signer proxy returned neither result nor error"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Signed transaction as returned by `eth_signTransaction`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignedTransaction {
    /// Bare hex string
    Raw(String),
    /// `{ "raw": "0x..", "tx": {..} }`
    Object { raw: String },
}
