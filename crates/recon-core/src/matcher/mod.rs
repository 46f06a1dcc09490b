//! Transaction-to-receipt matching.
//!
//! Matching is greedy and one-to-one: transactions are visited by date, each
//! takes its best unclaimed receipt of the same employee, and a taken receipt
//! is no longer offered to later transactions. Ties at the top are left for
//! manual review rather than broken arbitrarily.

mod duplicates;
mod scoring;
mod similarity;

pub use duplicates::{find_duplicates, DuplicatePair};
pub use scoring::{amount_score, date_score, score_pair, ScoreBreakdown};
pub use similarity::{levenshtein_distance, name_similarity, normalize_merchant};

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::models::config::MatchConfig;
use crate::models::employee::EmployeeKey;
use crate::models::matching::{MatchResult, ReasonCode};
use crate::models::record::{ClassifiedReceipt, ClassifiedTransaction};

/// Scores closer than this are treated as equal.
const TIE_EPSILON: f64 = 1e-9;

/// Weighted-heuristic matcher.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    /// Create a matcher, rejecting invalid weights or thresholds.
    pub fn new(config: MatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Score one pair with this matcher's weights.
    pub fn score(&self, transaction: &ClassifiedTransaction, receipt: &ClassifiedReceipt) -> ScoreBreakdown {
        score_pair(&self.config, transaction, receipt)
    }

    /// Match every transaction, returning one result per transaction in input order.
    pub fn match_all(
        &self,
        transactions: &[ClassifiedTransaction],
        receipts: &[ClassifiedReceipt],
    ) -> Vec<MatchResult> {
        let mut pools: HashMap<&EmployeeKey, Vec<usize>> = HashMap::new();
        for (index, receipt) in receipts.iter().enumerate() {
            if let Some(employee) = &receipt.employee {
                pools.entry(&employee.key).or_default().push(index);
            }
        }

        let mut order: Vec<usize> = (0..transactions.len()).collect();
        order.sort_by_key(|&i| {
            let date = transactions[i].date();
            (date.is_none(), date, i)
        });

        let mut claimed = vec![false; receipts.len()];
        let mut results: Vec<Option<MatchResult>> = vec![None; transactions.len()];

        for index in order {
            let transaction = &transactions[index];
            let result = match &transaction.employee {
                None => MatchResult::unmatched(index, ReasonCode::EmployeeUnresolved, 0),
                Some(employee) => {
                    let candidates: Vec<usize> = pools
                        .get(&employee.key)
                        .map(|pool| pool.iter().copied().filter(|&r| !claimed[r]).collect())
                        .unwrap_or_default();
                    self.decide(index, transaction, &candidates, receipts)
                }
            };

            if let Some(receipt) = result.receipt {
                claimed[receipt] = true;
            }
            trace!("Transaction {} -> {:?} ({})", index, result.receipt, result.reason);
            results[index] = Some(result);
        }

        let results: Vec<MatchResult> = results.into_iter().flatten().collect();
        debug!(
            "Matched {} of {} transactions against {} receipts",
            results.iter().filter(|r| r.is_matched()).count(),
            transactions.len(),
            receipts.len()
        );
        results
    }

    fn decide(
        &self,
        index: usize,
        transaction: &ClassifiedTransaction,
        candidates: &[usize],
        receipts: &[ClassifiedReceipt],
    ) -> MatchResult {
        let scored: Vec<(usize, ScoreBreakdown)> = candidates
            .iter()
            .map(|&r| (r, self.score(transaction, &receipts[r])))
            .collect();

        let best = scored
            .iter()
            .max_by(|a, b| a.1.total.partial_cmp(&b.1.total).unwrap_or(std::cmp::Ordering::Equal));

        let Some(&(receipt, score)) = best else {
            return MatchResult::unmatched(index, ReasonCode::NoCandidate, 0);
        };

        if score.total <= self.config.threshold {
            return MatchResult::unmatched(index, ReasonCode::NoCandidate, scored.len());
        }

        let tied = scored
            .iter()
            .filter(|(_, s)| (s.total - score.total).abs() < TIE_EPSILON)
            .count();
        if tied > 1 {
            debug!("Transaction {}: {} receipts tied at {:.3}", index, tied, score.total);
            return MatchResult::unmatched(index, ReasonCode::AmbiguousMultipleCandidates, scored.len());
        }

        let reason = if score.is_exact() {
            ReasonCode::ExactMatch
        } else {
            ReasonCode::FuzzyMatch
        };
        MatchResult::matched(index, receipt, score.total, reason, scored.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employee::EmployeeIdentity;
    use crate::models::record::{ParsedReceipt, ParsedTransaction};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn employee(key: Option<&str>) -> Option<EmployeeIdentity> {
        key.map(|k| EmployeeIdentity::new(k, k))
    }

    fn tx(key: Option<&str>, day: u32, merchant: &str, amount: &str) -> ClassifiedTransaction {
        ClassifiedTransaction {
            record: ParsedTransaction {
                date: NaiveDate::from_ymd_opt(2025, 4, day),
                amount: Some(Decimal::from_str(amount).unwrap()),
                description: Some(merchant.to_string()),
                ..Default::default()
            },
            employee: employee(key),
            incomplete: key.is_none(),
            is_credit: amount.starts_with('-'),
            issues: Vec::new(),
        }
    }

    fn receipt(key: Option<&str>, day: u32, vendor: &str, amount: &str) -> ClassifiedReceipt {
        ClassifiedReceipt {
            record: ParsedReceipt {
                date: NaiveDate::from_ymd_opt(2025, 4, day),
                amount: Some(Decimal::from_str(amount).unwrap()),
                description: Some(vendor.to_string()),
                ..Default::default()
            },
            employee: employee(key),
            incomplete: key.is_none(),
            is_credit: amount.starts_with('-'),
            issues: Vec::new(),
        }
    }

    #[test]
    fn test_exact_match() {
        let transactions = vec![tx(Some("E123"), 1, "CHEVRON #12345", "75.50")];
        let receipts = vec![receipt(Some("E123"), 1, "Chevron", "75.50")];

        let results = Matcher::default().match_all(&transactions, &receipts);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].receipt, Some(0));
        assert_eq!(results[0].reason, ReasonCode::ExactMatch);
        assert!((results[0].confidence.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fuzzy_match_within_window() {
        let transactions = vec![tx(Some("E1"), 1, "HILTON GARDEN INN", "312.40")];
        let receipts = vec![receipt(Some("E1"), 2, "Hilton Garden Inn", "312.40")];

        let results = Matcher::default().match_all(&transactions, &receipts);
        assert_eq!(results[0].receipt, Some(0));
        assert_eq!(results[0].reason, ReasonCode::FuzzyMatch);
        // 0.5 + 0.3 * 0.75 + 0.2
        assert!((results[0].confidence.unwrap() - 0.925).abs() < 1e-9);
    }

    #[test]
    fn test_no_candidate_for_employee() {
        let transactions = vec![tx(Some("E200"), 1, "TAXI", "20.00")];
        let receipts = vec![receipt(Some("E123"), 1, "Taxi", "20.00")];

        let results = Matcher::default().match_all(&transactions, &receipts);
        assert_eq!(results[0].receipt, None);
        assert_eq!(results[0].confidence, None);
        assert_eq!(results[0].reason, ReasonCode::NoCandidate);
        assert_eq!(results[0].candidates, 0);
    }

    #[test]
    fn test_below_threshold_is_no_candidate() {
        let transactions = vec![tx(Some("E1"), 1, "CHEVRON", "75.50")];
        let receipts = vec![receipt(Some("E1"), 20, "Marriott", "410.00")];

        let results = Matcher::default().match_all(&transactions, &receipts);
        assert_eq!(results[0].reason, ReasonCode::NoCandidate);
        assert_eq!(results[0].candidates, 1);
    }

    #[test]
    fn test_unresolved_short_circuits() {
        let transactions = vec![tx(None, 1, "CHEVRON", "75.50")];
        // A resolved receipt that would otherwise be an exact match.
        let receipts = vec![
            receipt(None, 1, "Chevron", "75.50"),
            receipt(Some("E123"), 1, "Chevron", "75.50"),
        ];

        let results = Matcher::default().match_all(&transactions, &receipts);
        assert_eq!(results[0].reason, ReasonCode::EmployeeUnresolved);
        assert_eq!(results[0].receipt, None);
        assert_eq!(results[0].confidence, None);
        assert_eq!(results[0].candidates, 0);
    }

    #[test]
    fn test_tie_is_ambiguous() {
        let transactions = vec![tx(Some("E1"), 1, "UBER TRIP", "18.20")];
        let receipts = vec![
            receipt(Some("E1"), 1, "Uber Trip", "18.20"),
            receipt(Some("E1"), 1, "Uber Trip", "18.20"),
        ];

        let results = Matcher::default().match_all(&transactions, &receipts);
        assert_eq!(results[0].reason, ReasonCode::AmbiguousMultipleCandidates);
        assert_eq!(results[0].receipt, None);
        assert_eq!(results[0].confidence, None);
        assert_eq!(results[0].candidates, 2);
    }

    #[test]
    fn test_receipt_used_at_most_once() {
        let transactions = vec![
            tx(Some("E1"), 3, "STARBUCKS", "5.00"),
            tx(Some("E1"), 1, "STARBUCKS", "5.00"),
        ];
        let receipts = vec![receipt(Some("E1"), 1, "Starbucks", "5.00")];

        let results = Matcher::default().match_all(&transactions, &receipts);
        // Results follow input order, but the earlier-dated transaction claims first.
        assert_eq!(results[0].transaction, 0);
        assert_eq!(results[0].reason, ReasonCode::NoCandidate);
        assert_eq!(results[1].receipt, Some(0));
        assert_eq!(results[1].reason, ReasonCode::ExactMatch);
    }

    #[test]
    fn test_results_are_total_and_exclusive() {
        let transactions = vec![
            tx(Some("E1"), 1, "CHEVRON", "75.50"),
            tx(None, 2, "DELTA AIR", "1204.10"),
            tx(Some("E1"), 2, "UBER", "18.20"),
            tx(Some("E2"), 4, "HILTON", "312.40"),
            tx(Some("E1"), 5, "CHEVRON", "75.50"),
        ];
        let receipts = vec![
            receipt(Some("E1"), 1, "Chevron", "75.50"),
            receipt(Some("E1"), 2, "Uber", "18.20"),
            receipt(Some("E2"), 4, "Hilton", "312.40"),
            receipt(Some("E1"), 5, "Chevron", "75.50"),
        ];

        let results = Matcher::default().match_all(&transactions, &receipts);
        assert_eq!(results.len(), transactions.len());
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.transaction, i);
            assert_eq!(result.receipt.is_some(), result.confidence.is_some());
            assert_eq!(result.receipt.is_some(), result.reason.is_matched());
        }

        let mut used: Vec<usize> = results.iter().filter_map(|r| r.receipt).collect();
        let count = used.len();
        used.sort_unstable();
        used.dedup();
        assert_eq!(used.len(), count);

        assert_eq!(results[0].receipt, Some(0));
        assert_eq!(results[4].receipt, Some(3));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MatchConfig {
            threshold: 1.5,
            ..MatchConfig::default()
        };
        assert!(Matcher::new(config).is_err());
    }
}
