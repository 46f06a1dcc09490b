//! Match outcomes.

use serde::{Deserialize, Serialize};

/// Fixed vocabulary explaining every match outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Amount and date agree exactly.
    ExactMatch,
    /// Best candidate cleared the threshold without exact amount and date.
    FuzzyMatch,
    /// No receipt of the same employee cleared the threshold.
    NoCandidate,
    /// Several candidates tied at the top score; left for manual review.
    AmbiguousMultipleCandidates,
    /// The transaction's employee could not be resolved.
    EmployeeUnresolved,
}

impl ReasonCode {
    pub const ALL: [ReasonCode; 5] = [
        ReasonCode::ExactMatch,
        ReasonCode::FuzzyMatch,
        ReasonCode::NoCandidate,
        ReasonCode::AmbiguousMultipleCandidates,
        ReasonCode::EmployeeUnresolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::ExactMatch => "exact_match",
            ReasonCode::FuzzyMatch => "fuzzy_match",
            ReasonCode::NoCandidate => "no_candidate",
            ReasonCode::AmbiguousMultipleCandidates => "ambiguous_multiple_candidates",
            ReasonCode::EmployeeUnresolved => "employee_unresolved",
        }
    }

    /// Whether this outcome carries a receipt.
    pub fn is_matched(&self) -> bool {
        matches!(self, ReasonCode::ExactMatch | ReasonCode::FuzzyMatch)
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one transaction.
///
/// `receipt` and `confidence` are either both set or both empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Index of the transaction in the matched slice.
    pub transaction: usize,

    /// Index of the assigned receipt, if any.
    pub receipt: Option<usize>,

    /// Score of the assigned receipt in [0, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Why the outcome is what it is.
    pub reason: ReasonCode,

    /// Receipts considered for this transaction.
    pub candidates: usize,
}

impl MatchResult {
    pub(crate) fn matched(transaction: usize, receipt: usize, confidence: f64, reason: ReasonCode, candidates: usize) -> Self {
        Self {
            transaction,
            receipt: Some(receipt),
            confidence: Some(confidence),
            reason,
            candidates,
        }
    }

    pub(crate) fn unmatched(transaction: usize, reason: ReasonCode, candidates: usize) -> Self {
        Self {
            transaction,
            receipt: None,
            confidence: None,
            reason,
            candidates,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.receipt.is_some()
    }
}
