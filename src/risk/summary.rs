use serde_json::Value;

use crate::detection::types::{Details, Finding, FindingType};

use super::score::{calculate_risk_score, MAX_RISK_SCORE};

pub const NO_FINDINGS_MESSAGE: &str = "No suspicious activities detected by current rules.";

const FINDING_SEPARATOR: &str = "\n\n---\n\n";
const UNKNOWN_CHAIN: &str = "UnknownChain";
const UNKNOWN_MIXER: &str = "Unknown Mixer";

// Fallback chains: the first key present wins.
const TX_HASH_KEYS: &[&str] = &["hash", "transaction_hash"];
const INVOLVED_ADDRESS_KEYS: &[&str] = &["address", "interacting_address"];

/// Render one finding as a sentence. Findings without a dedicated template,
/// or missing data the template needs, use the generic one.
pub fn summarize_finding(finding: &Finding) -> String {
    let details = &finding.details;
    let chain = chain_label(details);

    let specific = match &finding.finding_type {
        FindingType::LargeTransfer => large_transfer_summary(details, &chain),
        FindingType::InteractsWithKnownScamAddress => scam_interaction_summary(details, &chain),
        FindingType::UsesMixerService => mixer_summary(details, &chain),
        _ => return default_summary(finding, &chain),
    };

    specific.unwrap_or_else(|| {
        tracing::warn!(
            finding_type = finding.finding_type.as_str(),
            "Finding is missing template data, using default summary"
        );
        default_summary(finding, &chain)
    })
}

/// Combined report for a set of findings, headed by the overall risk score.
pub fn generate_overall_summary_and_risk(findings: &[Finding]) -> (String, u32) {
    if findings.is_empty() {
        return (NO_FINDINGS_MESSAGE.to_string(), 0);
    }

    let score = calculate_risk_score(findings);
    let body = findings
        .iter()
        .map(summarize_finding)
        .collect::<Vec<_>>()
        .join(FINDING_SEPARATOR);

    (
        format!("**Overall Risk Score: {}/{}**\n\n{}", score, MAX_RISK_SCORE, body),
        score,
    )
}

fn large_transfer_summary(details: &Details, chain: &str) -> Option<String> {
    let value_eth = details.get("value_eth").and_then(Value::as_f64)?;
    let from = text(details, "from")?;
    let to = text(details, "to")?;
    let tx_hash = first_text(details, TX_HASH_KEYS)?;

    Some(format!(
        "A significantly large transfer of {:.2} {} from {} to {} was detected on the {} blockchain. Transaction hash: {}.",
        value_eth,
        native_currency(chain),
        from,
        to,
        chain,
        tx_hash
    ))
}

fn scam_interaction_summary(details: &Details, chain: &str) -> Option<String> {
    let address = first_text(details, INVOLVED_ADDRESS_KEYS)?;
    let tx_hash = first_text(details, TX_HASH_KEYS)?;

    Some(format!(
        "A transaction involving address {} (which is on a known scam list) was detected on the {} blockchain. Transaction hash: {}. This is a high-risk activity.",
        address, chain, tx_hash
    ))
}

fn mixer_summary(details: &Details, chain: &str) -> Option<String> {
    let address = text(details, "address")?;
    let tx_hash = first_text(details, TX_HASH_KEYS)?;
    let mixer_name = text(details, "mixer_name").unwrap_or(UNKNOWN_MIXER);

    Some(format!(
        "Address {} appears to have interacted with a known mixer service ({}) on the {} blockchain. Transaction hash: {}. This could be an attempt to obscure transaction origins.",
        address, mixer_name, chain, tx_hash
    ))
}

fn default_summary(finding: &Finding, chain: &str) -> String {
    format!(
        "Suspicious activity of type '{}' was detected on the {} blockchain. Details: {}",
        finding.finding_type.as_str(),
        chain,
        Value::Object(finding.details.clone())
    )
}

fn chain_label(details: &Details) -> String {
    text(details, "chain").unwrap_or(UNKNOWN_CHAIN).to_uppercase()
}

fn native_currency(chain: &str) -> &'static str {
    if chain == "ETHEREUM" {
        "ETH"
    } else {
        "tokens/native currency"
    }
}

fn text<'a>(details: &'a Details, key: &str) -> Option<&'a str> {
    details.get(key).and_then(Value::as_str)
}

fn first_text<'a>(details: &'a Details, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| text(details, key))
}
