//! Transaction and receipt records at each pipeline stage.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::employee::EmployeeIdentity;

/// Where a record was read from.
///
/// Ordering is document, then page, then line: the original document order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Document index within the run (statement first, receipts in submission order).
    pub document: usize,
    /// Page index within the document (0-indexed).
    pub page: usize,
    /// Line number within the page (1-indexed).
    pub line: usize,
}

/// A card transaction as printed on the statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    /// Cardholder name from the active employee header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,

    /// Transaction date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Posting date, when the statement prints one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_date: Option<NaiveDate>,

    /// Signed amount; negative for credits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,

    /// Merchant / description text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Reference or invoice number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// GL account / cost-center code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gl_code: Option<String>,

    /// Position in the source document.
    pub source: SourceLocation,
}

/// A line from an expense receipt report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedReceipt {
    /// Employee name from the active report header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,

    /// Receipt date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Signed amount; negative for refunds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,

    /// Vendor / description text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// GL account / cost-center code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gl_code: Option<String>,

    /// Position in the source document.
    pub source: SourceLocation,
}

/// Why a classified record needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordIssue {
    MissingDate,
    MissingAmount,
    MissingDescription,
    EmployeeUnresolved,
}

impl std::fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecordIssue::MissingDate => "missing date",
            RecordIssue::MissingAmount => "missing amount",
            RecordIssue::MissingDescription => "missing description",
            RecordIssue::EmployeeUnresolved => "employee unresolved",
        };
        f.write_str(s)
    }
}

/// A statement transaction with derived flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedTransaction {
    /// Normalized parsed fields.
    #[serde(flatten)]
    pub record: ParsedTransaction,

    /// Resolved employee, `None` when the name did not resolve.
    pub employee: Option<EmployeeIdentity>,

    /// Set when a required field is missing or the employee is unresolved.
    pub incomplete: bool,

    /// Set iff the amount is negative.
    pub is_credit: bool,

    /// Reasons behind `incomplete`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<RecordIssue>,
}

/// A receipt line with derived flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedReceipt {
    /// Normalized parsed fields.
    #[serde(flatten)]
    pub record: ParsedReceipt,

    /// Resolved employee, `None` when the name did not resolve.
    pub employee: Option<EmployeeIdentity>,

    /// Set when a required field is missing or the employee is unresolved.
    pub incomplete: bool,

    /// Set iff the amount is negative.
    pub is_credit: bool,

    /// Reasons behind `incomplete`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<RecordIssue>,
}

impl ClassifiedTransaction {
    pub fn amount(&self) -> Option<Decimal> {
        self.record.amount
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.record.date
    }

    pub fn description(&self) -> &str {
        self.record.description.as_deref().unwrap_or("")
    }
}

impl ClassifiedReceipt {
    pub fn amount(&self) -> Option<Decimal> {
        self.record.amount
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.record.date
    }

    pub fn description(&self) -> &str {
        self.record.description.as_deref().unwrap_or("")
    }
}
