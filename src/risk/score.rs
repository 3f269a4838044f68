use crate::detection::types::{Finding, FindingType};

/// Upper bound of the aggregate risk score.
pub const MAX_RISK_SCORE: u32 = 100;

/// Base score for finding types without an entry of their own.
pub const DEFAULT_BASE_SCORE: f64 = 10.0;

/// `(threshold_eth, multiplier)` pairs for large transfers, ascending by threshold.
pub const VALUE_MULTIPLIER_TIERS: [(f64, f64); 4] = [
    (100.0, 1.0),
    (500.0, 1.2),
    (1000.0, 1.5),
    (5000.0, 2.0),
];

/// Base score contributed by one finding of the given type.
pub fn base_score(finding_type: &FindingType) -> f64 {
    match finding_type {
        FindingType::LargeTransfer => 20.0,
        FindingType::InteractsWithKnownScamAddress => 70.0,
        FindingType::UsesMixerService => 60.0,
        FindingType::PotentialRugPullToken => 80.0,
        FindingType::HoneypotContract => 75.0,
        FindingType::DrainedWalletActivity => 50.0,
        FindingType::UnusualTransactionPattern => 30.0,
        FindingType::NewlyDeployedHighVolumeToken => 40.0,
        FindingType::Other(_) => DEFAULT_BASE_SCORE,
    }
}

/// Multiplier of the highest tier whose threshold is at or below `value_eth`.
/// Values below every tier get 1.0.
pub fn value_multiplier(value_eth: f64) -> f64 {
    VALUE_MULTIPLIER_TIERS
        .iter()
        .rev()
        .find(|(threshold, _)| value_eth >= *threshold)
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(1.0)
}

/// Unbounded contribution of a single finding.
pub fn finding_score(finding: &Finding) -> f64 {
    let base = base_score(&finding.finding_type);
    match finding.finding_type {
        FindingType::LargeTransfer => {
            let value_eth = finding
                .details
                .get("value_eth")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);
            base * value_multiplier(value_eth)
        }
        _ => base,
    }
}

/// Aggregate risk score in `[0, 100]`: the truncated sum of finding scores, capped.
pub fn calculate_risk_score(findings: &[Finding]) -> u32 {
    if findings.is_empty() {
        return 0;
    }

    let total: f64 = findings.iter().map(finding_score).sum();
    (total.max(0.0).floor() as u32).min(MAX_RISK_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::Details;
    use serde_json::json;

    fn large_transfer(value_eth: f64) -> Finding {
        let mut details = Details::new();
        details.insert("value_eth".into(), json!(value_eth));
        Finding::new(FindingType::LargeTransfer, "large", details)
    }

    fn finding(tag: &str) -> Finding {
        Finding::new(FindingType::from(tag), "x", Details::new())
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(calculate_risk_score(&[]), 0);
    }

    #[test]
    fn test_value_tiers() {
        assert_eq!(calculate_risk_score(&[large_transfer(99.99)]), 20);
        assert_eq!(calculate_risk_score(&[large_transfer(100.0)]), 20);
        assert_eq!(calculate_risk_score(&[large_transfer(500.0)]), 24);
        assert_eq!(calculate_risk_score(&[large_transfer(1000.0)]), 30);
        assert_eq!(calculate_risk_score(&[large_transfer(5000.0)]), 40);
        assert_eq!(calculate_risk_score(&[large_transfer(750.0)]), 24);
    }

    #[test]
    fn test_missing_value_uses_base() {
        let finding = Finding::new(FindingType::LargeTransfer, "large", Details::new());
        assert_eq!(calculate_risk_score(&[finding]), 20);
    }

    #[test]
    fn test_unknown_type_scores_default() {
        assert_eq!(calculate_risk_score(&[finding("flash_loan_attack")]), 10);
    }

    #[test]
    fn test_sum_is_capped() {
        // 80 + 70 = 150
        let findings = vec![
            finding("potential_rug_pull_token"),
            finding("interacts_with_known_scam_address"),
        ];
        assert_eq!(calculate_risk_score(&findings), 100);
    }

    #[test]
    fn test_fractional_total_truncates() {
        // 20 * 1.2 = 24, 24 * 3 = 72, plus 10 = 82
        let findings = vec![
            large_transfer(600.0),
            large_transfer(600.0),
            large_transfer(600.0),
            finding("something_new"),
        ];
        assert_eq!(calculate_risk_score(&findings), 82);
    }

    #[test]
    fn test_score_is_pure() {
        let findings = vec![large_transfer(1200.0), finding("uses_mixer_service")];
        let first = calculate_risk_score(&findings);
        assert_eq!(first, calculate_risk_score(&findings));
        assert_eq!(first, 90);
    }

    #[test]
    fn test_score_always_bounded() {
        let findings: Vec<_> = (0..50).map(|_| finding("honeypot_contract")).collect();
        for n in 0..findings.len() {
            let score = calculate_risk_score(&findings[..n]);
            assert!(score <= MAX_RISK_SCORE);
        }
    }
}
