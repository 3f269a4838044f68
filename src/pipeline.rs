use serde::Serialize;

use crate::alert::{AlertDispatcher, DispatchOutcome};
use crate::chain::{Chain, Transaction};
use crate::config::DetectionConfig;
use crate::detection::engine::Detector;
use crate::detection::types::Finding;
use crate::entity::scam_db::ScamLookup;
use crate::risk::summary::generate_overall_summary_and_risk;

/// Result of running the analysis pipeline on one batch.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub findings: Vec<Finding>,
    pub report: String,
    #[serde(rename = "score")]
    pub risk_score: u32,
    pub transactions_analyzed: usize,
}

/// Orchestrates the per-batch analysis steps:
/// 1. Deduplication by transaction hash
/// 2. Rule-based detection
/// 3. Risk scoring
/// 4. Report rendering
///
/// Holds no per-batch state, so one instance can serve concurrent batches.
pub struct AnalysisPipeline {
    detector: Detector,
}

impl AnalysisPipeline {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            detector: Detector::new(config),
        }
    }

    pub fn analyze(
        &self,
        batch: &[Transaction],
        chain: Chain,
        scam_lookup: &dyn ScamLookup,
    ) -> AnalysisReport {
        let findings = self.detector.analyze_batch(batch, chain, scam_lookup);
        let (report, risk_score) = generate_overall_summary_and_risk(&findings);

        for finding in &findings {
            tracing::warn!(
                chain = %chain,
                finding_type = finding.finding_type.as_str(),
                message = %finding.message,
                "SUSPICIOUS ACTIVITY DETECTED"
            );
        }
        tracing::info!(
            chain = %chain,
            transactions = batch.len(),
            findings = findings.len(),
            risk_score,
            "Batch analyzed"
        );

        AnalysisReport {
            findings,
            report,
            risk_score,
            transactions_analyzed: batch.len(),
        }
    }

    /// Send one alert per finding. Delivery failures are reported, never raised.
    pub async fn dispatch_alerts(
        &self,
        dispatcher: &AlertDispatcher,
        findings: &[Finding],
    ) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::with_capacity(findings.len());
        for finding in findings {
            outcomes.push(
                dispatcher
                    .dispatch(finding.finding_type.as_str(), &finding.details)
                    .await,
            );
        }
        outcomes
    }
}

/// Remembers the last processed block so a repeated check of the same tip is skipped.
#[derive(Debug, Default)]
pub struct BlockCursor {
    last_processed: Option<u64>,
}

impl BlockCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_processed(&self) -> Option<u64> {
        self.last_processed
    }

    pub fn is_processed(&self, block_number: u64) -> bool {
        self.last_processed == Some(block_number)
    }

    pub fn mark_processed(&mut self, block_number: u64) {
        self.last_processed = Some(block_number);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::FindingType;
    use crate::entity::scam_db::ScamDatabase;
    use serde_json::json;

    fn block() -> Vec<Transaction> {
        [
            ("0xaaa", "0x821ab0d4414980000"), // 150 ETH
            ("0xbbb", "0xde0b6b3a7640000"),   // 1 ETH
            ("0xccc", "0x0"),
        ]
        .into_iter()
        .map(|(hash, value)| {
            Transaction::from_value(json!({
                "hash": hash,
                "from": "0xfrom",
                "to": "0xto",
                "value": value,
            }))
        })
        .collect()
    }

    #[test]
    fn test_block_with_one_large_transfer() {
        let pipeline = AnalysisPipeline::new(DetectionConfig::default());
        let scams = ScamDatabase::from_addresses(Vec::<String>::new());

        let result = pipeline.analyze(&block(), Chain::Ethereum, &scams);
        assert_eq!(result.transactions_analyzed, 3);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].finding_type, FindingType::LargeTransfer);
        assert_eq!(result.risk_score, 20);
        assert!(result.report.starts_with("**Overall Risk Score: 20/100**"));
        assert!(result.report.contains("large transfer of 150.00 ETH"));
    }

    #[test]
    fn test_empty_batch() {
        let pipeline = AnalysisPipeline::new(DetectionConfig::default());
        let scams = ScamDatabase::from_addresses(Vec::<String>::new());

        let result = pipeline.analyze(&[], Chain::Ethereum, &scams);
        assert!(result.findings.is_empty());
        assert_eq!(result.risk_score, 0);
        assert_eq!(result.report, "No suspicious activities detected by current rules.");
    }

    #[test]
    fn test_scam_interaction_raises_score() {
        let pipeline = AnalysisPipeline::new(DetectionConfig::default());
        let scams = ScamDatabase::from_addresses(["0xFROM"]);

        let result = pipeline.analyze(&block(), Chain::Ethereum, &scams);
        // 20 for the large transfer plus 70 for each of three scam interactions, capped
        assert_eq!(result.findings.len(), 4);
        assert_eq!(result.risk_score, 100);
    }

    #[tokio::test]
    async fn test_dispatch_alerts_one_per_finding() {
        let pipeline = AnalysisPipeline::new(DetectionConfig::default());
        let scams = ScamDatabase::from_addresses(Vec::<String>::new());
        let result = pipeline.analyze(&block(), Chain::Ethereum, &scams);

        let dispatcher = AlertDispatcher::default();
        let outcomes = pipeline.dispatch_alerts(&dispatcher, &result.findings).await;
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].any_delivered());
    }

    #[test]
    fn test_block_cursor() {
        let mut cursor = BlockCursor::new();
        assert!(!cursor.is_processed(10));
        cursor.mark_processed(10);
        assert!(cursor.is_processed(10));
        assert!(!cursor.is_processed(11));
        assert_eq!(cursor.last_processed(), Some(10));
    }
}
