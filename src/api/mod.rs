pub mod handlers;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::alert::AlertDispatcher;
use crate::entity::scam_db::ScamDatabase;
use crate::explorer::{LatestBlockSource, WalletHistorySource};
use crate::pipeline::{AnalysisPipeline, BlockCursor};

/// Shared service state. Everything mutable sits behind its own lock.
pub struct AppState {
    pub pipeline: AnalysisPipeline,
    pub scam_db: RwLock<ScamDatabase>,
    pub block_source: Box<dyn LatestBlockSource>,
    pub wallet_source: Box<dyn WalletHistorySource>,
    pub alerts: AlertDispatcher,
    pub alerts_enabled: bool,
    pub cursor: Mutex<BlockCursor>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/monitoring/check-ethereum-now",
            post(handlers::check_ethereum_now),
        )
        .route("/api/analysis/batch", post(handlers::analyze_batch))
        .route("/api/reports/on-demand", post(handlers::on_demand_report))
        .route("/api/scam-addresses", post(handlers::add_scam_address))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(
    state: Arc<AppState>,
    host: &str,
    port: u16,
    shutdown: CancellationToken,
) -> eyre::Result<()> {
    let app = router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}
