//! Esplora REST API client

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{DataSource, SourceError};

#[derive(serde::Deserialize)]
struct TxStatus {
    confirmed: bool,
}

/// Reads `GET {base}/tx/{txid}/status`.
#[derive(Debug, Clone)]
pub struct EsploraSource {
    base_url: String,
    client: Client,
}

impl EsploraSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DataSource for EsploraSource {
    async fn is_transaction_confirmed(&self, txid: &str) -> Result<bool, SourceError> {
        let url = format!("{}/tx/{txid}/status", self.base_url);
        let status: TxStatus = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(txid, confirmed = status.confirmed, "esplora tx status");
        Ok(status.confirmed)
    }
}
