use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::chain::Chain;
use crate::config::ExplorerConfig;

use super::ethereum::AlchemyClient;
use super::{ExplorerError, SourcedError, WalletHistory, WalletHistorySource};

const ETHERSCAN_BASE: &str = "https://api.etherscan.io";
const BSCSCAN_BASE: &str = "https://api.bscscan.com";
const BLOCKCHAIN_INFO_BASE: &str = "https://blockchain.info";
const HELIUS_BASE: &str = "https://api.helius.xyz";

const ADDRESS_INFO_FIELDS: [&str; 7] = [
    "hash160",
    "address",
    "n_tx",
    "n_unredeemed",
    "total_received",
    "total_sent",
    "final_balance",
];

/// Base URLs per explorer; overridable for tests.
#[derive(Debug, Clone)]
pub struct ExplorerEndpoints {
    pub etherscan: String,
    pub bscscan: String,
    pub blockchain_info: String,
    pub helius: String,
}

impl Default for ExplorerEndpoints {
    fn default() -> Self {
        Self {
            etherscan: ETHERSCAN_BASE.to_string(),
            bscscan: BSCSCAN_BASE.to_string(),
            blockchain_info: BLOCKCHAIN_INFO_BASE.to_string(),
            helius: HELIUS_BASE.to_string(),
        }
    }
}

/// Wallet history lookups against public explorers.
pub struct WalletExplorer {
    client: reqwest::Client,
    endpoints: ExplorerEndpoints,
    alchemy: AlchemyClient,
    etherscan_api_key: Option<String>,
    bscscan_api_key: Option<String>,
    helius_api_key: Option<String>,
}

impl WalletExplorer {
    pub fn new(config: &ExplorerConfig) -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| eyre::eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            endpoints: ExplorerEndpoints::default(),
            alchemy: AlchemyClient::new(config.ethereum_rpc_url.as_deref())?,
            etherscan_api_key: config.etherscan_api_key.clone(),
            bscscan_api_key: config.bscscan_api_key.clone(),
            helius_api_key: config.helius_api_key.clone(),
        })
    }

    pub fn with_endpoints(mut self, endpoints: ExplorerEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Alchemy asset transfers when an RPC URL is configured, Etherscan
    /// otherwise or when Alchemy fails.
    async fn ethereum_history(&self, address: &str) -> Result<WalletHistory, SourcedError> {
        let etherscan_key = self.etherscan_api_key.as_deref();
        if !self.alchemy.is_configured() && etherscan_key.is_none() {
            return Err(SourcedError::new(
                "Configuration Error",
                ExplorerError::NotConfigured("Alchemy or Etherscan"),
            ));
        }

        if self.alchemy.is_configured() {
            match self.alchemy.asset_transfers(address).await {
                Ok(history) => return Ok(history),
                Err(e) if etherscan_key.is_some() => {
                    tracing::warn!(error = %e, "Alchemy wallet history failed, falling back to Etherscan");
                }
                Err(e) => return Err(e),
            }
        }

        self.scan_txlist("Etherscan", &self.endpoints.etherscan, etherscan_key, address)
            .await
    }

    /// Etherscan-compatible `account/txlist` (Etherscan, BscScan).
    async fn scan_txlist(
        &self,
        source: &'static str,
        base: &str,
        api_key: Option<&str>,
        address: &str,
    ) -> Result<WalletHistory, SourcedError> {
        let Some(api_key) = api_key else {
            return Err(SourcedError::new(
                "Configuration Error",
                ExplorerError::NotConfigured(source),
            ));
        };

        let url = format!("{}/api", base.trim_end_matches('/'));
        let body: Value = self
            .client
            .get(url)
            .query(&[
                ("module", "account"),
                ("action", "txlist"),
                ("address", address),
                ("startblock", "0"),
                ("endblock", "99999999"),
                ("page", "1"),
                ("offset", "100"),
                ("sort", "desc"),
                ("apikey", api_key),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SourcedError::new(source, e.into()))?
            .json()
            .await
            .map_err(|e| SourcedError::new(source, e.into()))?;

        if body.get("status").and_then(Value::as_str) == Some("1") {
            return Ok(WalletHistory {
                data: body.get("result").cloned().unwrap_or(Value::Array(Vec::new())),
                address_info: None,
                source,
            });
        }

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Failed to fetch data or no transactions found.");
        let result = match body.get("result") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => ".".to_string(),
        };
        tracing::warn!(source, message, result = %result, "Explorer API error");
        Err(SourcedError::new(
            source,
            ExplorerError::Upstream(format!("{} ({} message: {})", message, source, result)),
        ))
    }

    async fn blockchain_info(&self, address: &str) -> Result<WalletHistory, SourcedError> {
        const SOURCE: &str = "Blockchain.info";

        let url = format!(
            "{}/rawaddr/{}",
            self.endpoints.blockchain_info.trim_end_matches('/'),
            address
        );
        let response = self
            .client
            .get(url)
            .query(&[("limit", "50")])
            .send()
            .await
            .map_err(|e| SourcedError::new(SOURCE, e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let error = if status == StatusCode::INTERNAL_SERVER_ERROR
                && text.contains("Unsupported Address Format")
            {
                ExplorerError::InvalidAddress("Bitcoin")
            } else if status == StatusCode::NOT_FOUND {
                ExplorerError::NotFound("Bitcoin address not found or no transactions.".to_string())
            } else {
                ExplorerError::Upstream(format!("HTTP error fetching Bitcoin data: {} - {}", status, text))
            };
            return Err(SourcedError::new(SOURCE, error));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourcedError::new(SOURCE, e.into()))?;

        let address_info: Map<String, Value> = ADDRESS_INFO_FIELDS
            .iter()
            .filter_map(|key| body.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect();

        Ok(WalletHistory {
            data: body.get("txs").cloned().unwrap_or(Value::Array(Vec::new())),
            address_info: Some(Value::Object(address_info)),
            source: SOURCE,
        })
    }

    async fn helius(&self, address: &str) -> Result<WalletHistory, SourcedError> {
        const SOURCE: &str = "Helius";

        let Some(api_key) = self.helius_api_key.as_deref() else {
            return Err(SourcedError::new(
                "Configuration Error",
                ExplorerError::NotConfigured("Helius"),
            ));
        };

        let url = format!(
            "{}/v0/addresses/{}/transactions",
            self.endpoints.helius.trim_end_matches('/'),
            address
        );
        let response = self
            .client
            .get(url)
            .query(&[("api-key", api_key), ("limit", "50")])
            .send()
            .await
            .map_err(|e| SourcedError::new(SOURCE, e.into()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourcedError::new(
                SOURCE,
                ExplorerError::NotFound("Solana address not found or no transactions.".to_string()),
            ));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").map(|e| e.to_string()))
                .unwrap_or(text);
            return Err(SourcedError::new(
                SOURCE,
                ExplorerError::Upstream(format!("HTTP error fetching Solana data: {} - {}", status, detail)),
            ));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| SourcedError::new(SOURCE, e.into()))?;

        Ok(WalletHistory {
            data,
            address_info: None,
            source: SOURCE,
        })
    }
}

#[async_trait]
impl WalletHistorySource for WalletExplorer {
    async fn wallet_history(&self, chain: Chain, address: &str) -> Result<WalletHistory, SourcedError> {
        tracing::debug!(chain = %chain, address, "Fetching wallet history");
        match chain {
            Chain::Ethereum => self.ethereum_history(address).await,
            Chain::Bsc => {
                self.scan_txlist(
                    "BscScan",
                    &self.endpoints.bscscan,
                    self.bscscan_api_key.as_deref(),
                    address,
                )
                .await
            }
            Chain::Bitcoin => self.blockchain_info(address).await,
            Chain::Solana => self.helius(address).await,
        }
    }
}
