use std::collections::HashSet;

use crate::chain::Transaction;

/// Keep the first occurrence of each transaction hash, preserving order.
///
/// Transactions without a string `hash` have nothing to compare on and are
/// always kept.
pub fn dedupe_by_hash(batch: &[Transaction]) -> Vec<&Transaction> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(batch.len());
    batch
        .iter()
        .filter(|tx| match tx.hash() {
            Some(hash) => seen.insert(hash),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tx(hash: Option<&str>, nonce: u64) -> Transaction {
        match hash {
            Some(h) => Transaction::from_value(json!({ "hash": h, "nonce": nonce })),
            None => Transaction::from_value(json!({ "nonce": nonce })),
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let batch = vec![
            tx(Some("0xa"), 1),
            tx(Some("0xb"), 2),
            tx(Some("0xa"), 3),
            tx(Some("0xc"), 4),
            tx(Some("0xb"), 5),
        ];
        let unique = dedupe_by_hash(&batch);
        let nonces: Vec<_> = unique.iter().map(|t| t.field("nonce").cloned().unwrap()).collect();
        assert_eq!(nonces, vec![json!(1), json!(2), json!(4)]);
    }

    #[test]
    fn test_missing_hash_never_deduplicated() {
        let batch = vec![tx(None, 1), tx(None, 2), tx(Some("0xa"), 3)];
        assert_eq!(dedupe_by_hash(&batch).len(), 3);
    }

    #[test]
    fn test_empty_batch() {
        assert!(dedupe_by_hash(&[]).is_empty());
    }
}
