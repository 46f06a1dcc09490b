//! Rule-based field parsers for statement and receipt lines.

pub mod amounts;
pub mod dates;
pub mod patterns;

pub use amounts::{format_amount, parse_amount};
pub use dates::{parse_date, YearHint};

/// Collapse internal whitespace runs and trim; `None` when nothing is left.
pub fn normalize_text(s: &str) -> Option<String> {
    let joined = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Normalize a header name, dropping trailing separators.
pub fn normalize_name(s: &str) -> Option<String> {
    normalize_text(s.trim_end_matches([',', ':', ';', '-']))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  CHEVRON   #12345\tHOUSTON "), Some("CHEVRON #12345 HOUSTON".to_string()));
        assert_eq!(normalize_text(" \t "), None);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("SMITH, JOHN,"), Some("SMITH, JOHN".to_string()));
    }
}
