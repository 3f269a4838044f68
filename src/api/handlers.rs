use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use std::time::Instant;

use crate::chain::{Chain, Transaction};
use crate::explorer::ethereum::parse_block_number;
use crate::pipeline::AnalysisReport;

use super::types::*;
use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(
    status: StatusCode,
    msg: impl Into<String>,
    source: Option<&str>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            status: "error",
            message: msg.into(),
            source: source.map(str::to_string),
        }),
    )
}

/// Reload the scam list from disk if stale. File IO runs on the blocking pool.
async fn refresh_scam_db(state: &Arc<AppState>) {
    if !state.scam_db.read().await.is_stale(Instant::now()) {
        return;
    }
    let state = Arc::clone(state);
    let reload = tokio::task::spawn_blocking(move || {
        state.scam_db.blocking_write().reload_if_stale();
    });
    if let Err(e) = reload.await {
        tracing::error!(error = %e, "Scam database reload task failed");
    }
}

/// Refresh the scam list if stale, then analyze the batch against it.
async fn analyze(state: &Arc<AppState>, transactions: &[Transaction], chain: Chain) -> AnalysisReport {
    refresh_scam_db(state).await;
    let scams = state.scam_db.read().await;
    state.pipeline.analyze(transactions, chain, &*scams)
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "ChainWatch risk API is running",
    })
}

// ============================================================
// Monitoring
// ============================================================

pub async fn check_ethereum_now(State(state): State<Arc<AppState>>) -> ApiResult<CheckBlockResponse> {
    let block = state
        .block_source
        .latest_block()
        .await
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e.to_string(), Some(e.source_name)))?;

    let number_hex = block.number.as_deref().ok_or_else(|| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Could not retrieve block number from {} response.", block.source),
            Some(block.source),
        )
    })?;
    let block_number = parse_block_number(number_hex).ok_or_else(|| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Invalid block number format received: {}", number_hex),
            Some(block.source),
        )
    })?;

    let already_processed = {
        let mut cursor = state.cursor.lock().await;
        let seen = cursor.is_processed(block_number);
        cursor.mark_processed(block_number);
        seen
    };
    if already_processed {
        return Ok(Json(CheckBlockResponse {
            status: "success",
            message: format!(
                "Block {} already processed. No new transactions to analyze.",
                block_number
            ),
            block_number,
            findings: Vec::new(),
            report: None,
            risk_score: None,
            source: Some(block.source),
            alerts: Vec::new(),
        }));
    }

    let transactions: Vec<Transaction> = block
        .transactions
        .into_iter()
        .map(Transaction::from_value)
        .collect();
    let analysis = analyze(&state, &transactions, Chain::Ethereum).await;

    let alerts = if state.alerts_enabled {
        state.pipeline.dispatch_alerts(&state.alerts, &analysis.findings).await
    } else {
        Vec::new()
    };

    let outcome = if analysis.findings.is_empty() {
        "No suspicious activity detected by current rules."
    } else {
        "Suspicious activities found."
    };

    Ok(Json(CheckBlockResponse {
        status: "success",
        message: format!(
            "Analyzed {} transactions in Ethereum block {}. {}",
            analysis.transactions_analyzed, block_number, outcome
        ),
        block_number,
        findings: analysis.findings,
        report: Some(analysis.report),
        risk_score: Some(analysis.risk_score),
        source: Some(block.source),
        alerts,
    }))
}

// ============================================================
// Batch analysis
// ============================================================

pub async fn analyze_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeBatchRequest>,
) -> ApiResult<AnalyzeBatchResponse> {
    let chain: Chain = request
        .chain
        .parse()
        .map_err(|e: String| api_error(StatusCode::BAD_REQUEST, e, None))?;

    let transactions: Vec<Transaction> = request
        .transactions
        .into_iter()
        .map(Transaction::from_value)
        .collect();
    let analysis = analyze(&state, &transactions, chain).await;

    let alerts = if request.dispatch_alerts && state.alerts_enabled {
        state.pipeline.dispatch_alerts(&state.alerts, &analysis.findings).await
    } else {
        Vec::new()
    };

    Ok(Json(AnalyzeBatchResponse {
        chain: chain.to_string(),
        analysis,
        alerts,
    }))
}

// ============================================================
// Reports
// ============================================================

pub async fn on_demand_report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OnDemandReportRequest>,
) -> (StatusCode, Json<OnDemandReportResponse>) {
    let chain_name = request.chain.as_deref().map(|c| c.trim().to_lowercase());
    let mut report = OnDemandReportResponse::new(
        request.identifier.clone(),
        chain_name.clone(),
        request.report_type.clone(),
    );

    let (Some(identifier), Some(chain_name)) = (request.identifier.as_deref(), chain_name) else {
        report.error = Some("Missing identifier (wallet/tx hash) or chain".to_string());
        return (StatusCode::BAD_REQUEST, Json(report));
    };

    match request.report_type.as_str() {
        "wallet" => {}
        "transaction" => {
            report.error = Some(format!(
                "Transaction-specific reports are not yet implemented for {}.",
                chain_name
            ));
            return (StatusCode::NOT_IMPLEMENTED, Json(report));
        }
        other => {
            report.error = Some(format!("Invalid report type: {}", other));
            return (StatusCode::BAD_REQUEST, Json(report));
        }
    }

    let Ok(chain) = chain_name.parse::<Chain>() else {
        report.error = Some(format!("Unsupported blockchain for wallet report: {}", chain_name));
        return (StatusCode::BAD_REQUEST, Json(report));
    };

    match state.wallet_source.wallet_history(chain, identifier).await {
        Ok(history) => {
            report.details = Some(history.data);
            report.address_info = history.address_info;
            report.source = Some(history.source.to_string());
            (StatusCode::OK, Json(report))
        }
        Err(e) => {
            tracing::warn!(chain = %chain, source = e.source_name, error = %e, "Wallet report failed");
            let status = if e.error.is_client_error() || e.source_name == "Configuration Error" {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::BAD_GATEWAY
            };
            report.error = Some(e.to_string());
            report.source = Some(e.source_name.to_string());
            (status, Json(report))
        }
    }
}

// ============================================================
// Scam list management
// ============================================================

pub async fn add_scam_address(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddScamAddressRequest>,
) -> ApiResult<AddScamAddressResponse> {
    if request.address.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing address", None));
    }

    let address = request.address.clone();
    let (added, entries) = tokio::task::spawn_blocking(move || {
        let mut scams = state.scam_db.blocking_write();
        let added = scams.add_entry(
            &request.address,
            &request.chain,
            &request.category,
            &request.source_url,
        );
        (added, scams.len())
    })
    .await
    .map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Scam entry task failed: {}", e),
            None,
        )
    })?;

    if !added {
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to add scam entry {}", address),
            None,
        ));
    }

    Ok(Json(AddScamAddressResponse { added, entries }))
}
