//! Confirmation oracles consulted while preparing inputs
//!
//! `prepare_utxo_inputs` only needs to know whether a funding transaction is
//! confirmed. Any backend can answer that by implementing [`DataSource`]; an
//! Esplora HTTP client and a Bitcoin Core JSON-RPC client are provided.

use async_trait::async_trait;

use crate::types::NetworkType;

pub mod esplora;
pub mod rpc;

pub use esplora::EsploraSource;
pub use rpc::BitcoinRpcSource;

/// Transport-level failures from a data source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("no result from rpc")]
    EmptyResult,

    /// For implementations backed by something other than the bundled clients.
    #[error("{0}")]
    Other(String),
}

/// Answers whether a transaction has at least one confirmation.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn is_transaction_confirmed(&self, txid: &str) -> Result<bool, SourceError>;
}

/// Public Esplora endpoint for `network`; regtest points at a local electrs.
pub fn default_esplora_url(network: NetworkType) -> &'static str {
    match network {
        NetworkType::Mainnet => "https://mempool.space/api",
        NetworkType::Testnet => "https://mempool.space/testnet/api",
        NetworkType::Regtest => "http://127.0.0.1:3002",
    }
}
