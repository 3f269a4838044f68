use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use chainwatch_risk::alert::AlertDispatcher;
use chainwatch_risk::api::{self, AppState};
use chainwatch_risk::config::Config;
use chainwatch_risk::entity::scam_db::ScamDatabase;
use chainwatch_risk::explorer::{AlchemyClient, WalletExplorer};
use chainwatch_risk::pipeline::{AnalysisPipeline, BlockCursor};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Initialize structured logging (set RUST_LOG=debug for rule-level output)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    tracing::info!("ChainWatch risk service starting");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)?;
    tracing::info!(
        threshold_eth = config.detection.large_transfer_threshold_eth,
        alerts = config.alerts.enabled,
        "Configuration loaded from {}",
        config_path
    );

    let mut scam_db = ScamDatabase::new(
        &config.scam_db.path,
        Duration::from_secs(config.scam_db.ttl_secs),
    );
    scam_db.reload_if_stale();
    tracing::info!(entries = scam_db.len(), "Scam database ready");

    let block_source = AlchemyClient::new(config.explorers.ethereum_rpc_url.as_deref())?;
    if config.explorers.ethereum_rpc_url.is_none() {
        tracing::warn!("No Ethereum RPC URL configured, block checks will fail");
    }
    let wallet_source = WalletExplorer::new(&config.explorers)?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.explorers.request_timeout_secs))
        .build()
        .map_err(|e| eyre::eyre!("Failed to build HTTP client: {}", e))?;
    let alerts = AlertDispatcher::from_config(&config.alerts, http);

    let state = Arc::new(AppState {
        pipeline: AnalysisPipeline::new(config.detection.clone()),
        scam_db: RwLock::new(scam_db),
        block_source: Box::new(block_source),
        wallet_source: Box::new(wallet_source),
        alerts,
        alerts_enabled: config.alerts.enabled,
        cursor: Mutex::new(BlockCursor::new()),
    });

    let shutdown = CancellationToken::new();

    let server = {
        let shutdown = shutdown.clone();
        let host = config.api.host.clone();
        let port = config.api.port;
        tokio::spawn(async move {
            if let Err(e) = api::serve(state, &host, port, shutdown).await {
                tracing::error!(error = %e, "API server failed");
            }
        })
    };

    tracing::info!("Service started. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, draining requests...");
    shutdown.cancel();

    let _ = server.await;

    tracing::info!("ChainWatch risk service stopped gracefully");
    Ok(())
}
