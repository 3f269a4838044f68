//! Clients for third-party chain explorers.
//!
//! These only fetch and pass records through; all analysis happens in the
//! detection pipeline.

pub mod ethereum;
pub mod wallet;

use async_trait::async_trait;
use serde_json::Value;

use crate::chain::Chain;

pub use ethereum::AlchemyClient;
pub use wallet::WalletExplorer;

#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("{0} API key not configured")]
    NotConfigured(&'static str),
    #[error("Unsupported or invalid {0} address format")]
    InvalidAddress(&'static str),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Upstream(String),
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ExplorerError {
    /// True for failures caused by the request or local configuration
    /// rather than the upstream service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotConfigured(_) | Self::InvalidAddress(_))
    }
}

/// An explorer failure tagged with the service that produced it.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct SourcedError {
    pub source_name: &'static str,
    #[source]
    pub error: ExplorerError,
}

impl SourcedError {
    pub fn new(source_name: &'static str, error: ExplorerError) -> Self {
        Self { source_name, error }
    }
}

/// The latest block as returned by the node, transactions still in raw JSON.
#[derive(Debug, Clone)]
pub struct RawBlock {
    /// Hex block number, if the node reported one.
    pub number: Option<String>,
    pub transactions: Vec<Value>,
    pub source: &'static str,
}

/// Wallet transaction history from one explorer.
#[derive(Debug, Clone)]
pub struct WalletHistory {
    pub data: Value,
    pub address_info: Option<Value>,
    pub source: &'static str,
}

#[async_trait]
pub trait LatestBlockSource: Send + Sync {
    async fn latest_block(&self) -> Result<RawBlock, SourcedError>;
}

#[async_trait]
pub trait WalletHistorySource: Send + Sync {
    async fn wallet_history(&self, chain: Chain, address: &str) -> Result<WalletHistory, SourcedError>;
}
