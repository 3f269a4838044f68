use alloy::primitives::U256;
use bigdecimal::{BigDecimal, ToPrimitive};
use serde_json::{json, Value};
use std::str::FromStr;

use crate::chain::{Chain, Transaction};
use crate::entity::scam_db::ScamLookup;

use super::types::{Details, Finding, FindingType};

/// Transfers at or above this many ETH are reported as large.
pub const ETH_LARGE_TRANSFER_THRESHOLD: f64 = 100.0;

const ETH_DECIMALS: u32 = 18;

/// Inputs shared by every rule for one batch.
pub struct RuleContext<'a> {
    pub chain: Chain,
    pub large_transfer_threshold_eth: f64,
    /// `None` disables the scam-interaction rule.
    pub scam_lookup: Option<&'a dyn ScamLookup>,
}

/// A detection rule. Rules never fail: a transaction they cannot read yields `None`.
pub type Rule = fn(&Transaction, &RuleContext<'_>) -> Option<Finding>;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValueDecodeError {
    #[error("value is not a string: {0}")]
    NotAString(Value),
    #[error("invalid hex quantity '{0}'")]
    InvalidHex(String),
}

/// Decode a hex Wei quantity (`"0x1bc16d674ec80000"`). A missing value is zero.
pub fn decode_wei_hex(raw: Option<&Value>) -> Result<U256, ValueDecodeError> {
    let text = match raw {
        None => return Ok(U256::ZERO),
        Some(Value::String(s)) => s.trim(),
        Some(other) => return Err(ValueDecodeError::NotAString(other.clone())),
    };

    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValueDecodeError::InvalidHex(text.to_string()));
    }

    U256::from_str_radix(digits, 16).map_err(|_| ValueDecodeError::InvalidHex(text.to_string()))
}

/// Convert Wei to ETH.
pub fn wei_to_eth(wei: U256) -> f64 {
    let divisor = BigDecimal::from(10u64.pow(ETH_DECIMALS));
    BigDecimal::from_str(&wei.to_string())
        .ok()
        .and_then(|amount| (amount / divisor).to_f64())
        .unwrap_or(0.0)
}

/// Flag Ethereum transfers of at least the large-transfer threshold.
pub fn check_large_transfer(tx: &Transaction, ctx: &RuleContext<'_>) -> Option<Finding> {
    let wei = match decode_wei_hex(tx.value()) {
        Ok(wei) => wei,
        Err(e) => {
            tracing::warn!(
                hash = tx.hash().unwrap_or("<none>"),
                error = %e,
                "Skipping transaction for large transfer detection"
            );
            return None;
        }
    };

    let value_eth = wei_to_eth(wei);
    if value_eth < ctx.large_transfer_threshold_eth {
        return None;
    }

    let mut details = Details::new();
    details.insert("hash".into(), field_or_null(tx, "hash"));
    details.insert("from".into(), field_or_null(tx, "from"));
    details.insert("to".into(), field_or_null(tx, "to"));
    details.insert("value_eth".into(), json!(value_eth));
    details.insert("chain".into(), json!(ctx.chain.as_str()));

    Some(Finding::new(
        FindingType::LargeTransfer,
        format!("Large ETH transfer detected: {:.2} ETH", value_eth),
        details,
    ))
}

/// Flag transactions whose sender or recipient is a known scam address.
pub fn check_known_scam_interaction(tx: &Transaction, ctx: &RuleContext<'_>) -> Option<Finding> {
    let lookup = ctx.scam_lookup?;

    let (side, address) = [("from", tx.from_address()), ("to", tx.to_address())]
        .into_iter()
        .find_map(|(side, addr)| addr.filter(|a| lookup.is_scam(a)).map(|a| (side, a)))?;

    let mut details = Details::new();
    details.insert("hash".into(), field_or_null(tx, "hash"));
    details.insert("interacting_address".into(), json!(address));
    details.insert("side".into(), json!(side));
    details.insert("chain".into(), json!(ctx.chain.as_str()));

    Some(Finding::new(
        FindingType::InteractsWithKnownScamAddress,
        format!("Interaction with known scam address: {}", address),
        details,
    ))
}

fn field_or_null(tx: &Transaction, key: &str) -> Value {
    tx.field(key).cloned().unwrap_or(Value::Null)
}
