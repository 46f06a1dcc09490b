//! Document layouts and their rule sets.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::rules::patterns::*;

/// Supported document layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Corporate card statement.
    Statement,
    /// Expense receipt report.
    ReceiptReport,
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::Statement => f.write_str("statement"),
            Layout::ReceiptReport => f.write_str("receipt report"),
        }
    }
}

/// A named record pattern.
#[derive(Debug, Clone, Copy)]
pub struct RecordRule {
    pub name: &'static str,
    pub pattern: &'static Regex,
}

/// How one line was recognised.
#[derive(Debug)]
pub enum LineMatch<'t> {
    /// Employee header with name and optional identifying detail.
    Header { name: &'t str, detail: Option<&'t str> },
    /// Statement closing date token.
    ClosingDate(&'t str),
    /// Record line, with the rule that matched.
    Record { rule: &'static str, captures: Captures<'t> },
    /// Starts like an employee header but no header rule could read it.
    UnreadableHeader,
}

/// Ordered pattern rules for one layout, selected once per document.
#[derive(Debug, Clone)]
pub struct LayoutRules {
    layout: Layout,
    headers: Vec<&'static Regex>,
    header_keyword: &'static Regex,
    closing_date: Option<&'static Regex>,
    records: Vec<RecordRule>,
}

impl LayoutRules {
    /// Rules for corporate card statements.
    pub fn statement() -> Self {
        Self {
            layout: Layout::Statement,
            headers: vec![&*STATEMENT_CARDHOLDER, &*STATEMENT_MASKED_CARD],
            header_keyword: &*STATEMENT_HEADER_KEYWORD,
            closing_date: Some(&*STATEMENT_CLOSING_DATE),
            records: vec![
                RecordRule { name: "transaction", pattern: &*STATEMENT_TRANSACTION },
                RecordRule { name: "transaction_partial", pattern: &*STATEMENT_TRANSACTION_PARTIAL },
            ],
        }
    }

    /// Rules for expense receipt reports.
    pub fn receipt_report() -> Self {
        Self {
            layout: Layout::ReceiptReport,
            headers: vec![&*RECEIPT_EMPLOYEE],
            header_keyword: &*RECEIPT_HEADER_KEYWORD,
            closing_date: None,
            records: vec![
                RecordRule { name: "receipt", pattern: &*RECEIPT_LINE },
                RecordRule { name: "receipt_vendor_first", pattern: &*RECEIPT_LINE_VENDOR_FIRST },
                RecordRule { name: "receipt_partial", pattern: &*RECEIPT_LINE_PARTIAL },
            ],
        }
    }

    pub fn for_layout(layout: Layout) -> Self {
        match layout {
            Layout::Statement => Self::statement(),
            Layout::ReceiptReport => Self::receipt_report(),
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Test a line against headers, then the closing date, then records in order.
    ///
    /// A line that matched nothing but opens with a header keyword is
    /// reported as [`LineMatch::UnreadableHeader`].
    pub fn match_line<'t>(&self, line: &'t str) -> Option<LineMatch<'t>> {
        for header in &self.headers {
            if let Some(caps) = header.captures(line) {
                if let Some(name) = caps.name("name") {
                    return Some(LineMatch::Header {
                        name: name.as_str(),
                        detail: caps.name("detail").or(caps.name("id")).map(|m| m.as_str().trim()),
                    });
                }
            }
        }

        if let Some(closing) = self.closing_date {
            if let Some(date) = closing.captures(line).and_then(|c| c.name("date")) {
                return Some(LineMatch::ClosingDate(date.as_str()));
            }
        }

        self.records
            .iter()
            .find_map(|rule| {
                rule.pattern
                    .captures(line)
                    .map(|captures| LineMatch::Record { rule: rule.name, captures })
            })
            .or_else(|| self.header_keyword.is_match(line).then_some(LineMatch::UnreadableHeader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_rule_order() {
        let rules = LayoutRules::statement();
        match rules.match_line("04/01/2025 CHEVRON 75.50") {
            Some(LineMatch::Record { rule, .. }) => assert_eq!(rule, "transaction"),
            other => panic!("unexpected {other:?}"),
        }
        match rules.match_line("04/01/2025 CHEVRON") {
            Some(LineMatch::Record { rule, .. }) => assert_eq!(rule, "transaction_partial"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_header_before_records() {
        let rules = LayoutRules::statement();
        match rules.match_line("JOHN SMITH XXXX XXXX XXXX 1234") {
            Some(LineMatch::Header { name, detail }) => {
                assert_eq!(name, "JOHN SMITH");
                assert_eq!(detail, Some("XXXX XXXX XXXX 1234"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_cardholder_detail_shapes() {
        let rules = LayoutRules::statement();
        for (line, expected) in [
            ("Cardholder: ALICE LEE 4821", "4821"),
            ("Cardholder: ALICE LEE ID: E200", "E200"),
            ("Cardholder: ALICE LEE Card Ending 4821", "4821"),
        ] {
            match rules.match_line(line) {
                Some(LineMatch::Header { name, detail }) => {
                    assert_eq!(name, "ALICE LEE");
                    assert_eq!(detail, Some(expected));
                }
                other => panic!("unexpected {other:?} for {line}"),
            }
        }
    }

    #[test]
    fn test_unreadable_header_is_reported() {
        assert!(matches!(
            LayoutRules::statement().match_line("Cardholder: ALICE LEE (secondary)"),
            Some(LineMatch::UnreadableHeader)
        ));
        assert!(matches!(
            LayoutRules::receipt_report().match_line("Employee: 12345"),
            Some(LineMatch::UnreadableHeader)
        ));
        assert!(LayoutRules::statement().match_line("Payment due date").is_none());
    }

    #[test]
    fn test_layouts_do_not_share_headers() {
        assert!(LayoutRules::receipt_report().match_line("Cardholder: JOHN SMITH").is_none());
        assert!(LayoutRules::statement().match_line("Employee: John Smith").is_none());
    }

    #[test]
    fn test_closing_date_only_in_statements() {
        let line = "Closing Date 04/30/2025";
        assert!(matches!(
            LayoutRules::statement().match_line(line),
            Some(LineMatch::ClosingDate("04/30/2025"))
        ));
        assert!(LayoutRules::receipt_report().match_line(line).is_none());
    }
}
