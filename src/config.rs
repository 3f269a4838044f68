use serde::Deserialize;

use crate::detection::rules::ETH_LARGE_TRANSFER_THRESHOLD;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub scam_db: ScamDbConfig,
    #[serde(default)]
    pub explorers: ExplorerConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

// ============================================================
// Detection Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionConfig {
    #[serde(default = "default_large_transfer_threshold")]
    pub large_transfer_threshold_eth: f64,
    #[serde(default = "default_true")]
    pub scam_address_rule: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            large_transfer_threshold_eth: ETH_LARGE_TRANSFER_THRESHOLD,
            scam_address_rule: true,
        }
    }
}

fn default_large_transfer_threshold() -> f64 {
    ETH_LARGE_TRANSFER_THRESHOLD
}

fn default_true() -> bool {
    true
}

// ============================================================
// Scam Database Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ScamDbConfig {
    #[serde(default = "default_scam_db_path")]
    pub path: String,
    #[serde(default = "default_scam_db_ttl")]
    pub ttl_secs: u64,
}

impl Default for ScamDbConfig {
    fn default() -> Self {
        Self {
            path: default_scam_db_path(),
            ttl_secs: default_scam_db_ttl(),
        }
    }
}

fn default_scam_db_path() -> String {
    "data/scam_database.csv".to_string()
}

fn default_scam_db_ttl() -> u64 {
    3600
}

// ============================================================
// Explorer Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ExplorerConfig {
    pub ethereum_rpc_url: Option<String>,
    pub etherscan_api_key: Option<String>,
    pub bscscan_api_key: Option<String>,
    pub helius_api_key: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            ethereum_rpc_url: None,
            etherscan_api_key: None,
            bscscan_api_key: None,
            helius_api_key: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    15
}

// ============================================================
// Alert Config
// ============================================================

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AlertConfig {
    #[serde(default)]
    pub enabled: bool,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub discord_webhook_url: Option<String>,
}

// ============================================================
// API Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

fn default_api_port() -> u16 {
    8080
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Fill credentials the file leaves unset from the environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let explorers = &mut self.explorers;
        if explorers.ethereum_rpc_url.is_none() {
            explorers.ethereum_rpc_url = get("ALCHEMY_ETH_MAINNET_API_KEY")
                .map(|key| format!("https://eth-mainnet.g.alchemy.com/v2/{}", key));
        }
        explorers.etherscan_api_key = explorers.etherscan_api_key.take().or_else(|| get("ETHERSCAN_API_KEY"));
        explorers.bscscan_api_key = explorers.bscscan_api_key.take().or_else(|| get("BSCSCAN_API_KEY"));
        explorers.helius_api_key = explorers.helius_api_key.take().or_else(|| get("HELIUS_API_KEY"));

        let alerts = &mut self.alerts;
        alerts.telegram_bot_token = alerts.telegram_bot_token.take().or_else(|| get("TELEGRAM_BOT_TOKEN"));
        alerts.telegram_chat_id = alerts.telegram_chat_id.take().or_else(|| get("TELEGRAM_CHAT_ID"));
        alerts.discord_webhook_url = alerts.discord_webhook_url.take().or_else(|| get("DISCORD_WEBHOOK_URL"));

        if let Some(port) = get("PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }
    }

    fn validate(&self) -> eyre::Result<()> {
        let threshold = self.detection.large_transfer_threshold_eth;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(eyre::eyre!(
                "detection.large_transfer_threshold_eth must be a positive number, got {}",
                threshold
            ));
        }
        if self.scam_db.path.trim().is_empty() {
            return Err(eyre::eyre!("scam_db.path must not be empty"));
        }
        if let Some(url) = &self.explorers.ethereum_rpc_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(eyre::eyre!("Invalid Ethereum RPC URL '{}'", url));
            }
        }
        Ok(())
    }
}
