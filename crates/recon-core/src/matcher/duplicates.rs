//! Likely double charges on a statement.

use serde::{Deserialize, Serialize};

use super::similarity::name_similarity;
use crate::models::record::ClassifiedTransaction;

/// Two transactions that look like the same charge posted twice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuplicatePair {
    /// Index of the earlier transaction in input order.
    pub first: usize,
    /// Index of the later transaction in input order.
    pub second: usize,
    /// Merchant similarity of the pair.
    pub similarity: f64,
}

/// Pairs of transactions of the same cardholder with equal amounts, dates
/// within `window_days`, and merchant similarity of at least `threshold`.
pub fn find_duplicates(
    transactions: &[ClassifiedTransaction],
    window_days: i64,
    threshold: f64,
) -> Vec<DuplicatePair> {
    let mut duplicates = Vec::new();

    for i in 0..transactions.len() {
        for j in (i + 1)..transactions.len() {
            let t1 = &transactions[i];
            let t2 = &transactions[j];

            if !same_cardholder(t1, t2) {
                continue;
            }
            match (t1.amount(), t2.amount()) {
                (Some(a), Some(b)) if a == b => {}
                _ => continue,
            }
            match (t1.date(), t2.date()) {
                (Some(a), Some(b)) if (a - b).num_days().abs() <= window_days => {}
                _ => continue,
            }
            let similarity = name_similarity(t1.description(), t2.description());
            if similarity >= threshold {
                duplicates.push(DuplicatePair {
                    first: i,
                    second: j,
                    similarity,
                });
            }
        }
    }

    duplicates
}

fn same_cardholder(t1: &ClassifiedTransaction, t2: &ClassifiedTransaction) -> bool {
    match (&t1.employee, &t2.employee) {
        (Some(a), Some(b)) => a.key == b.key,
        (None, None) => t1.record.employee_name == t2.record.employee_name,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employee::EmployeeIdentity;
    use crate::models::record::ParsedTransaction;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn tx(key: &str, day: u32, desc: &str, amount: &str) -> ClassifiedTransaction {
        ClassifiedTransaction {
            record: ParsedTransaction {
                employee_name: Some(key.to_string()),
                date: NaiveDate::from_ymd_opt(2025, 4, day),
                amount: Some(Decimal::from_str(amount).unwrap()),
                description: Some(desc.to_string()),
                ..Default::default()
            },
            employee: Some(EmployeeIdentity::new(key, key)),
            incomplete: false,
            is_credit: false,
            issues: Vec::new(),
        }
    }

    #[test]
    fn test_detects_double_charge() {
        let txs = vec![
            tx("E1", 15, "STARBUCKS #501", "5.00"),
            tx("E1", 15, "STARBUCKS #502", "5.00"),
            tx("E1", 20, "WHOLE FOODS", "30.00"),
        ];
        let dups = find_duplicates(&txs, 1, 0.9);
        assert_eq!(dups.len(), 1);
        assert_eq!((dups[0].first, dups[0].second), (0, 1));
    }

    #[test]
    fn test_ignores_different_amounts_and_cardholders() {
        let txs = vec![
            tx("E1", 15, "STARBUCKS", "5.00"),
            tx("E1", 15, "STARBUCKS", "6.00"),
            tx("E2", 15, "STARBUCKS", "5.00"),
        ];
        assert!(find_duplicates(&txs, 1, 0.9).is_empty());
    }

    #[test]
    fn test_respects_window() {
        let txs = vec![tx("E1", 1, "UBER TRIP", "18.20"), tx("E1", 4, "UBER TRIP", "18.20")];
        assert!(find_duplicates(&txs, 1, 0.9).is_empty());
        assert_eq!(find_duplicates(&txs, 3, 0.9).len(), 1);
    }
}
