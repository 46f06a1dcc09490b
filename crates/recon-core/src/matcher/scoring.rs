//! Pairwise transaction/receipt scores.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::similarity::name_similarity;
use crate::models::config::MatchConfig;
use crate::models::record::{ClassifiedReceipt, ClassifiedTransaction};

/// Component scores of one candidate pair, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub amount: f64,
    pub date: f64,
    pub name: f64,
    /// Weighted sum of the components.
    pub total: f64,
    /// Amounts equal to the cent.
    pub amount_exact: bool,
    /// Same calendar day.
    pub date_exact: bool,
}

impl ScoreBreakdown {
    pub fn is_exact(&self) -> bool {
        self.amount_exact && self.date_exact
    }
}

/// Score a transaction against one receipt.
pub fn score_pair(
    config: &MatchConfig,
    transaction: &ClassifiedTransaction,
    receipt: &ClassifiedReceipt,
) -> ScoreBreakdown {
    let amount = amount_score(transaction.amount(), receipt.amount(), config.amount_tolerance);
    let date = date_score(transaction.date(), receipt.date(), config.date_window_days);
    let name = name_similarity(transaction.description(), receipt.description());

    let total = config.amount_weight * amount + config.date_weight * date + config.name_weight * name;

    ScoreBreakdown {
        amount,
        date,
        name,
        total: total.clamp(0.0, 1.0),
        amount_exact: matches!((transaction.amount(), receipt.amount()), (Some(a), Some(b)) if a == b),
        date_exact: matches!((transaction.date(), receipt.date()), (Some(a), Some(b)) if a == b),
    }
}

/// 1 when equal, decaying linearly to 0 at `tolerance`. Missing amounts score 0.
pub fn amount_score(a: Option<Decimal>, b: Option<Decimal>, tolerance: Decimal) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    let diff = (a - b).abs();
    if diff.is_zero() {
        return 1.0;
    }
    if tolerance.is_zero() || diff >= tolerance {
        return 0.0;
    }
    let ratio = (diff / tolerance).to_f64().unwrap_or(1.0);
    (1.0 - ratio).clamp(0.0, 1.0)
}

/// 1 on the same day, decaying linearly to 0 at `window_days + 1`.
/// Missing dates score 0.
pub fn date_score(a: Option<NaiveDate>, b: Option<NaiveDate>, window_days: i64) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    let days = (a - b).num_days().abs();
    if days > window_days {
        return 0.0;
    }
    1.0 - days as f64 / (window_days as f64 + 1.0)
}
