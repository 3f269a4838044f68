use crate::chain::{Chain, Transaction};
use crate::config::DetectionConfig;
use crate::entity::scam_db::ScamLookup;

use super::dedup;
use super::rules::{self, Rule, RuleContext};
use super::types::Finding;

const ETHEREUM_RULES: &[Rule] = &[
    rules::check_large_transfer,
    rules::check_known_scam_interaction,
];

// Bitcoin, BSC and Solana have no rules yet and report nothing.
const NO_RULES: &[Rule] = &[];

/// Rules that apply to a chain, in the order they run.
pub fn rules_for(chain: Chain) -> &'static [Rule] {
    match chain {
        Chain::Ethereum => ETHEREUM_RULES,
        Chain::Bitcoin | Chain::Bsc | Chain::Solana => NO_RULES,
    }
}

/// Runs the per-chain rule set against transactions.
#[derive(Debug, Clone)]
pub struct Detector {
    config: DetectionConfig,
}

impl Detector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    fn context<'a>(&self, chain: Chain, scam_lookup: &'a dyn ScamLookup) -> RuleContext<'a> {
        RuleContext {
            chain,
            large_transfer_threshold_eth: self.config.large_transfer_threshold_eth,
            scam_lookup: self.config.scam_address_rule.then_some(scam_lookup),
        }
    }

    /// Findings for a single transaction: every rule's output, in rule order.
    pub fn detect(&self, tx: &Transaction, chain: Chain, scam_lookup: &dyn ScamLookup) -> Vec<Finding> {
        let ctx = self.context(chain, scam_lookup);
        run_rules(tx, &ctx)
    }

    /// Findings for a batch. Each distinct hash is analyzed once.
    pub fn analyze_batch(
        &self,
        batch: &[Transaction],
        chain: Chain,
        scam_lookup: &dyn ScamLookup,
    ) -> Vec<Finding> {
        let ctx = self.context(chain, scam_lookup);
        let unique = dedup::dedupe_by_hash(batch);

        if unique.len() < batch.len() {
            tracing::debug!(
                chain = %chain,
                duplicates = batch.len() - unique.len(),
                "Skipped duplicate transactions in batch"
            );
        }

        unique.into_iter().flat_map(|tx| run_rules(tx, &ctx)).collect()
    }
}

fn run_rules(tx: &Transaction, ctx: &RuleContext<'_>) -> Vec<Finding> {
    rules_for(ctx.chain)
        .iter()
        .filter_map(|rule| rule(tx, ctx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::FindingType;
    use crate::entity::scam_db::ScamDatabase;
    use serde_json::json;

    const ONE_FIFTY_ETH: &str = "0x821ab0d4414980000";

    fn tx(hash: &str, value: &str, to: &str) -> Transaction {
        Transaction::from_value(json!({
            "hash": hash,
            "from": "0xfrom",
            "to": to,
            "value": value,
        }))
    }

    fn no_scams() -> ScamDatabase {
        ScamDatabase::from_addresses(Vec::<String>::new())
    }

    #[test]
    fn test_reserved_chains_report_nothing() {
        let detector = Detector::new(DetectionConfig::default());
        let big = tx("0x1", ONE_FIFTY_ETH, "0xto");
        for chain in [Chain::Bitcoin, Chain::Bsc, Chain::Solana] {
            assert!(detector.detect(&big, chain, &no_scams()).is_empty());
        }
        assert_eq!(detector.detect(&big, Chain::Ethereum, &no_scams()).len(), 1);
    }

    #[test]
    fn test_rules_contribute_independently() {
        let detector = Detector::new(DetectionConfig::default());
        let scams = ScamDatabase::from_addresses(["0xbad"]);
        let findings = detector.detect(&tx("0x1", ONE_FIFTY_ETH, "0xBAD"), Chain::Ethereum, &scams);

        let types: Vec<_> = findings.iter().map(|f| f.finding_type.clone()).collect();
        assert_eq!(
            types,
            vec![FindingType::LargeTransfer, FindingType::InteractsWithKnownScamAddress]
        );
    }

    #[test]
    fn test_scam_rule_can_be_disabled() {
        let detector = Detector::new(DetectionConfig {
            scam_address_rule: false,
            ..DetectionConfig::default()
        });
        let scams = ScamDatabase::from_addresses(["0xbad"]);
        assert!(detector.detect(&tx("0x1", "0x0", "0xbad"), Chain::Ethereum, &scams).is_empty());
    }

    #[test]
    fn test_batch_analyzes_each_hash_once() {
        let detector = Detector::new(DetectionConfig::default());
        let batch = vec![
            tx("0x1", ONE_FIFTY_ETH, "0xto"),
            tx("0x1", ONE_FIFTY_ETH, "0xto"),
            tx("0x2", "0x1", "0xto"),
        ];
        let findings = detector.analyze_batch(&batch, Chain::Ethereum, &no_scams());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].details["hash"], "0x1");
    }

    #[test]
    fn test_malformed_transaction_does_not_abort_batch() {
        let detector = Detector::new(DetectionConfig::default());
        let batch = vec![
            tx("0x1", "garbage", "0xto"),
            Transaction::from_value(json!(42)),
            tx("0x2", ONE_FIFTY_ETH, "0xto"),
        ];
        let findings = detector.analyze_batch(&batch, Chain::Ethereum, &no_scams());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].details["hash"], "0x2");
    }

    #[test]
    fn test_configured_threshold() {
        let detector = Detector::new(DetectionConfig {
            large_transfer_threshold_eth: 200.0,
            ..DetectionConfig::default()
        });
        assert!(detector
            .detect(&tx("0x1", ONE_FIFTY_ETH, "0xto"), Chain::Ethereum, &no_scams())
            .is_empty());
    }
}
