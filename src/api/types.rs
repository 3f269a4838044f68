use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::alert::DispatchOutcome;
use crate::detection::types::Finding;
use crate::pipeline::AnalysisReport;

// ============================================================
// Requests
// ============================================================

#[derive(Debug, Deserialize)]
pub struct AnalyzeBatchRequest {
    pub chain: String,
    #[serde(default)]
    pub transactions: Vec<Value>,
    #[serde(default)]
    pub dispatch_alerts: bool,
}

#[derive(Debug, Deserialize)]
pub struct OnDemandReportRequest {
    pub identifier: Option<String>,
    pub chain: Option<String>,
    #[serde(rename = "type", default = "default_report_type")]
    pub report_type: String,
}

fn default_report_type() -> String {
    "wallet".to_string()
}

#[derive(Debug, Deserialize)]
pub struct AddScamAddressRequest {
    pub address: String,
    #[serde(default)]
    pub chain: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub source_url: String,
}

// ============================================================
// Responses
// ============================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CheckBlockResponse {
    pub status: &'static str,
    pub message: String,
    pub block_number: u64,
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    #[serde(rename = "score", skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<DispatchOutcome>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeBatchResponse {
    pub chain: String,
    #[serde(flatten)]
    pub analysis: AnalysisReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<DispatchOutcome>,
}

#[derive(Debug, Serialize)]
pub struct OnDemandReportResponse {
    pub identifier: Option<String>,
    pub chain: Option<String>,
    pub report_type: String,
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_info: Option<Value>,
    pub error: Option<String>,
    pub source: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl OnDemandReportResponse {
    pub fn new(identifier: Option<String>, chain: Option<String>, report_type: String) -> Self {
        Self {
            identifier,
            chain,
            report_type,
            details: None,
            address_info: None,
            error: None,
            source: None,
            generated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddScamAddressResponse {
    pub added: bool,
    pub entries: usize,
}
