use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::cmp::Reverse;
use std::collections::HashSet;

use super::{ExplorerError, LatestBlockSource, RawBlock, SourcedError, WalletHistory};

const SOURCE: &str = "Alchemy";

const TRANSFER_CATEGORIES: [&str; 5] = ["external", "internal", "erc20", "erc721", "erc1155"];

/// Transfers kept per wallet report.
pub const MAX_WALLET_TRANSFERS: usize = 100;

/// Ethereum JSON-RPC client: latest block with full transactions, and
/// Alchemy's `alchemy_getAssetTransfers` for wallet history.
#[derive(Clone)]
pub struct AlchemyClient {
    provider: Option<DynProvider>,
}

impl AlchemyClient {
    /// Without an RPC URL every fetch fails with a configuration error.
    pub fn new(rpc_url: Option<&str>) -> eyre::Result<Self> {
        let provider = match rpc_url {
            Some(url) => {
                let url = url
                    .parse()
                    .map_err(|e| eyre::eyre!("Invalid RPC URL: {}", e))?;
                Some(ProviderBuilder::new().connect_http(url).erased())
            }
            None => None,
        };
        Ok(Self { provider })
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Transfers sent from and received by `address`, newest first.
    pub async fn asset_transfers(&self, address: &str) -> Result<WalletHistory, SourcedError> {
        let Some(provider) = &self.provider else {
            return Err(SourcedError::new(
                "Configuration Error",
                ExplorerError::NotConfigured("Alchemy"),
            ));
        };

        let outgoing = fetch_transfers(provider, "fromAddress", address).await?;
        let incoming = fetch_transfers(provider, "toAddress", address).await?;
        let transfers = merge_asset_transfers(outgoing, incoming);

        tracing::debug!(address, transfers = transfers.len(), "Fetched Alchemy asset transfers");

        Ok(WalletHistory {
            data: Value::Array(transfers),
            address_info: None,
            source: SOURCE,
        })
    }
}

async fn fetch_transfers(
    provider: &DynProvider,
    direction: &str,
    address: &str,
) -> Result<Vec<Value>, SourcedError> {
    let mut filter = json!({
        "fromBlock": "0x0",
        "toBlock": "latest",
        "category": TRANSFER_CATEGORIES,
        "withMetadata": true,
        "excludeZeroValue": true,
        "maxCount": format!("{:#x}", MAX_WALLET_TRANSFERS),
    });
    filter[direction] = json!(address);

    let result: Value = provider
        .raw_request("alchemy_getAssetTransfers".into(), [filter])
        .await
        .map_err(|e| SourcedError::new(SOURCE, ExplorerError::Upstream(e.to_string())))?;

    Ok(match result.get("transfers") {
        Some(Value::Array(transfers)) => transfers.clone(),
        _ => Vec::new(),
    })
}

/// Combine outgoing and incoming transfers: drop repeats of the same
/// transfer, order by block, transaction index and log index descending,
/// and keep the newest `MAX_WALLET_TRANSFERS`.
pub fn merge_asset_transfers(outgoing: Vec<Value>, incoming: Vec<Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut transfers: Vec<Value> = outgoing
        .into_iter()
        .chain(incoming)
        .filter(|transfer| match transfer_id(transfer) {
            Some(id) => seen.insert(id),
            None => true,
        })
        .collect();

    // Stable, so equal keys keep fetch order.
    transfers.sort_by_key(|transfer| {
        Reverse((
            quantity(transfer.get("blockNum")),
            quantity(transfer.get("transactionIndex")),
            quantity(transfer.get("logIndex")),
        ))
    });
    transfers.truncate(MAX_WALLET_TRANSFERS);
    transfers
}

/// `hash-logIndex` when a log index is present, otherwise Alchemy's `uniqueId`.
fn transfer_id(transfer: &Value) -> Option<String> {
    match transfer.get("logIndex").filter(|v| !v.is_null()) {
        Some(log_index) => {
            let hash = transfer.get("hash").and_then(Value::as_str).unwrap_or("");
            let log_index = match log_index {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(format!("{}-{}", hash, log_index))
        }
        None => transfer
            .get("uniqueId")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// A hex string or plain number; anything else sorts as zero.
fn quantity(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::String(s)) => parse_block_number(s).unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

#[async_trait]
impl LatestBlockSource for AlchemyClient {
    async fn latest_block(&self) -> Result<RawBlock, SourcedError> {
        let Some(provider) = &self.provider else {
            return Err(SourcedError::new(
                "Configuration Error",
                ExplorerError::NotConfigured("Alchemy"),
            ));
        };

        let block: Option<Value> = provider
            .raw_request("eth_getBlockByNumber".into(), ("latest", true))
            .await
            .map_err(|e| SourcedError::new(SOURCE, ExplorerError::Upstream(e.to_string())))?;

        let block = block.ok_or_else(|| {
            SourcedError::new(
                SOURCE,
                ExplorerError::Upstream("Node returned no latest block".to_string()),
            )
        })?;

        parse_block(block).map_err(|e| SourcedError::new(SOURCE, e))
    }
}

/// Split an `eth_getBlockByNumber` result into its number and transactions.
pub fn parse_block(block: Value) -> Result<RawBlock, ExplorerError> {
    let number = block.get("number").and_then(Value::as_str).map(str::to_string);

    let transactions = match block.get("transactions") {
        Some(Value::Array(txs)) => txs.clone(),
        _ => {
            return Err(ExplorerError::Upstream(
                "No transactions found in the latest block or unexpected response.".to_string(),
            ))
        }
    };

    tracing::debug!(
        block = number.as_deref().unwrap_or("<unknown>"),
        transactions = transactions.len(),
        "Fetched latest Ethereum block"
    );

    Ok(RawBlock {
        number,
        transactions,
        source: SOURCE,
    })
}

/// Parse a hex block number such as `"0x12a05f2"`.
pub fn parse_block_number(hex: &str) -> Option<u64> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    u64::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_block() {
        let block = parse_block(json!({
            "number": "0x10",
            "transactions": [{"hash": "0x1"}, {"hash": "0x2"}],
        }))
        .unwrap();
        assert_eq!(block.number.as_deref(), Some("0x10"));
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.source, "Alchemy");
    }

    #[test]
    fn test_parse_block_without_transactions() {
        assert!(parse_block(json!({"number": "0x10"})).is_err());
    }

    #[test]
    fn test_parse_block_number() {
        assert_eq!(parse_block_number("0x12a05f2"), Some(19_531_250));
        assert_eq!(parse_block_number("ff"), Some(255));
        assert_eq!(parse_block_number("0xzz"), None);
    }

    fn transfer(hash: &str, block: &str, unique_id: &str) -> Value {
        json!({"hash": hash, "blockNum": block, "uniqueId": unique_id, "category": "external"})
    }

    #[test]
    fn test_merge_transfers_dedupes_and_sorts() {
        let outgoing = vec![
            transfer("0xa", "0x10", "0xa:external"),
            transfer("0xb", "0x12", "0xb:external"),
        ];
        let incoming = vec![
            transfer("0xb", "0x12", "0xb:external"),
            transfer("0xc", "0x11", "0xc:external"),
        ];

        let merged = merge_asset_transfers(outgoing, incoming);
        let hashes: Vec<&str> = merged.iter().map(|t| t["hash"].as_str().unwrap()).collect();
        assert_eq!(hashes, vec!["0xb", "0xc", "0xa"]);
    }

    #[test]
    fn test_merge_transfers_keys_on_log_index() {
        let same_tx = vec![
            json!({"hash": "0xa", "blockNum": "0x10", "logIndex": 1, "uniqueId": "x"}),
            json!({"hash": "0xa", "blockNum": "0x10", "logIndex": 2, "uniqueId": "x"}),
        ];
        let repeat = vec![json!({"hash": "0xa", "blockNum": "0x10", "logIndex": 2})];

        let merged = merge_asset_transfers(same_tx, repeat);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0]["logIndex"], 2);
        assert_eq!(merged[1]["logIndex"], 1);
    }

    #[test]
    fn test_merge_transfers_caps_length() {
        let outgoing = (0..150)
            .map(|i| transfer(&format!("0x{:x}", i), &format!("0x{:x}", i), &i.to_string()))
            .collect();

        let merged = merge_asset_transfers(outgoing, Vec::new());
        assert_eq!(merged.len(), MAX_WALLET_TRANSFERS);
        assert_eq!(merged[0]["blockNum"], "0x95");
    }

    #[tokio::test]
    async fn test_unconfigured_source_fails() {
        let source = AlchemyClient::new(None).unwrap();
        let err = source.latest_block().await.unwrap_err();
        assert!(err.error.is_client_error());
        assert_eq!(err.source_name, "Configuration Error");
    }
}
