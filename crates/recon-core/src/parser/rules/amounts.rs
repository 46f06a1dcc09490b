//! Amount parsing for statement and receipt lines.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a printed amount, keeping its sign.
///
/// Accepts a leading `-`, `$` before or after the number, thousands
/// separators, accounting parentheses, a trailing `-` and a `CR` suffix.
/// Returns `None` when no number can be read.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let upper = trimmed.to_ascii_uppercase();
    let negative = (trimmed.starts_with('(') && trimmed.ends_with(')'))
        || trimmed.contains(['-', '\u{2212}'])
        || upper.ends_with("CR");

    let digits: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let value = Decimal::from_str(&digits).ok()?;
    if negative && !value.is_zero() {
        Some(-value)
    } else {
        Some(value)
    }
}

/// Format an amount with two decimals and thousands separators (1,234.56).
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.abs());
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{}{}.{}", sign, formatted, decimal_part)
}
