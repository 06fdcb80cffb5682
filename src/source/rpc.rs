//! Bitcoin Core JSON-RPC client

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{DataSource, SourceError};

#[derive(serde::Deserialize)]
struct RpcResponse {
    result: Option<RawTransaction>,
    error: Option<RpcError>,
}

#[derive(serde::Deserialize)]
struct RawTransaction {
    // Absent while the transaction sits in the mempool
    confirmations: Option<u64>,
}

#[derive(serde::Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Reads confirmations via `getrawtransaction <txid> true`.
///
/// The node needs `-txindex` (or the transaction in its wallet/mempool) to
/// answer for arbitrary txids.
#[derive(Debug, Clone)]
pub struct BitcoinRpcSource {
    url: String,
    auth: Option<(String, String)>,
    client: Client,
}

impl BitcoinRpcSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), auth: None, client: Client::new() }
    }

    pub fn with_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((user.into(), password.into()));
        self
    }
}

#[async_trait]
impl DataSource for BitcoinRpcSource {
    async fn is_transaction_confirmed(&self, txid: &str) -> Result<bool, SourceError> {
        let body = serde_json::json!({
            "jsonrpc": "1.0",
            "id": "anchor-utxo",
            "method": "getrawtransaction",
            "params": [txid, true]
        });

        let mut req = self.client.post(&self.url).json(&body);
        if let Some((user, password)) = &self.auth {
            req = req.basic_auth(user, Some(password));
        }
        // Core answers RPC-level failures with a non-2xx status and a JSON error body
        let resp: RpcResponse = req.send().await?.json().await?;

        if let Some(err) = resp.error {
            return Err(SourceError::Rpc { code: err.code, message: err.message });
        }
        let tx = resp.result.ok_or(SourceError::EmptyResult)?;
        let confirmations = tx.confirmations.unwrap_or(0);
        debug!(txid, confirmations, "rpc tx confirmations");
        Ok(confirmations >= 1)
    }
}
