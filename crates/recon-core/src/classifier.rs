//! Record classification: normalization, employee resolution and flags.

use rust_decimal::Decimal;

use crate::models::employee::EmployeeIdentity;
use crate::models::record::{
    ClassifiedReceipt, ClassifiedTransaction, ParsedReceipt, ParsedTransaction, RecordIssue,
};
use crate::parser::rules::normalize_text;
use crate::resolver::EmployeeLookup;

/// Classify a statement transaction.
///
/// Pure: the same input and lookup always give the same output, and
/// classifying an already-normalized record changes nothing.
pub fn classify_transaction(parsed: ParsedTransaction, lookup: &EmployeeLookup) -> ClassifiedTransaction {
    let mut record = parsed;
    record.amount = record.amount.map(normalize_amount);
    record.description = record.description.as_deref().and_then(normalize_text);
    record.reference = record.reference.as_deref().and_then(normalize_text);
    record.gl_code = record.gl_code.as_deref().and_then(normalize_text);

    let employee = resolve_employee(record.employee_name.as_deref(), lookup);
    let issues = issues(
        record.date.is_some(),
        record.amount,
        record.description.is_some(),
        employee.is_some(),
    );

    ClassifiedTransaction {
        is_credit: is_credit(record.amount),
        incomplete: !issues.is_empty(),
        employee,
        issues,
        record,
    }
}

/// Classify a receipt line. Refunds follow the same sign rule as card credits.
pub fn classify_receipt(parsed: ParsedReceipt, lookup: &EmployeeLookup) -> ClassifiedReceipt {
    let mut record = parsed;
    record.amount = record.amount.map(normalize_amount);
    record.description = record.description.as_deref().and_then(normalize_text);
    record.gl_code = record.gl_code.as_deref().and_then(normalize_text);

    let employee = resolve_employee(record.employee_name.as_deref(), lookup);
    let issues = issues(
        record.date.is_some(),
        record.amount,
        record.description.is_some(),
        employee.is_some(),
    );

    ClassifiedReceipt {
        is_credit: is_credit(record.amount),
        incomplete: !issues.is_empty(),
        employee,
        issues,
        record,
    }
}

fn normalize_amount(amount: Decimal) -> Decimal {
    let rounded = amount.round_dp(2);
    if rounded.is_zero() {
        // -0.00 is not a credit
        Decimal::ZERO
    } else {
        rounded
    }
}

fn is_credit(amount: Option<Decimal>) -> bool {
    amount.is_some_and(|a| a.is_sign_negative() && !a.is_zero())
}

fn resolve_employee(name: Option<&str>, lookup: &EmployeeLookup) -> Option<EmployeeIdentity> {
    name.and_then(|n| lookup.resolve(n))
}

fn issues(has_date: bool, amount: Option<Decimal>, has_description: bool, resolved: bool) -> Vec<RecordIssue> {
    let mut issues = Vec::new();
    if !has_date {
        issues.push(RecordIssue::MissingDate);
    }
    if amount.is_none() {
        issues.push(RecordIssue::MissingAmount);
    }
    if !has_description {
        issues.push(RecordIssue::MissingDescription);
    }
    if !resolved {
        issues.push(RecordIssue::EmployeeUnresolved);
    }
    issues
}
