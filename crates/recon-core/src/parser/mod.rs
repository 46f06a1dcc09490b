//! Field parsing: page text to raw transaction and receipt records.
//!
//! Each document is read with one [`LayoutRules`] value. The active employee
//! header lives in a [`ParseContext`] that is passed into every page and
//! returned from it, so a cardholder's table can continue on the next page.

mod layout;
pub mod rules;
mod stats;

pub use layout::{Layout, LayoutRules, LineMatch, RecordRule};
pub use stats::ParseStats;

use chrono::NaiveDate;
use regex::Captures;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::models::config::ParserConfig;
use crate::models::record::{ParsedReceipt, ParsedTransaction, SourceLocation};
use crate::pdf::RawTextBlock;
use rules::{normalize_name, normalize_text, parse_amount, parse_date, YearHint};

/// Employee header currently in effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeHeader {
    /// Name as printed.
    pub name: String,
    /// Card number, employee id or similar, when printed.
    pub detail: Option<String>,
}

/// State carried from line to line and from page to page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseContext {
    /// Index of the document within the run.
    pub document: usize,
    /// Header that subsequent records are attributed to.
    pub employee: Option<EmployeeHeader>,
    /// Statement closing date, when seen.
    pub closing_date: Option<NaiveDate>,
    /// Year for `MM/DD` dates when no closing date was seen.
    pub default_year: Option<i32>,
}

impl ParseContext {
    pub fn new(document: usize) -> Self {
        Self {
            document,
            ..Self::default()
        }
    }

    pub fn with_default_year(mut self, year: Option<i32>) -> Self {
        self.default_year = year;
        self
    }

    fn year_hint(&self) -> Option<YearHint> {
        self.closing_date
            .map(YearHint::Closing)
            .or(self.default_year.map(YearHint::Fixed))
    }
}

/// Fields read from one record line.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFields {
    pub employee_name: Option<String>,
    pub date: NaiveDate,
    pub posted_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub gl_code: Option<String>,
    pub source: SourceLocation,
}

/// A record type produced by one layout.
pub trait LayoutRecord: Sized {
    /// Layout whose rules produce this record.
    const LAYOUT: Layout;

    fn from_fields(fields: RecordFields) -> Self;
}

impl LayoutRecord for ParsedTransaction {
    const LAYOUT: Layout = Layout::Statement;

    fn from_fields(fields: RecordFields) -> Self {
        ParsedTransaction {
            employee_name: fields.employee_name,
            date: Some(fields.date),
            posted_date: fields.posted_date,
            amount: fields.amount,
            description: fields.description,
            reference: fields.reference,
            gl_code: fields.gl_code,
            source: fields.source,
        }
    }
}

impl LayoutRecord for ParsedReceipt {
    const LAYOUT: Layout = Layout::ReceiptReport;

    fn from_fields(fields: RecordFields) -> Self {
        ParsedReceipt {
            employee_name: fields.employee_name,
            date: Some(fields.date),
            amount: fields.amount,
            description: fields.description,
            gl_code: fields.gl_code,
            source: fields.source,
        }
    }
}

/// Records and counters for one page, plus the context for the next page.
#[derive(Debug, Clone)]
pub struct PageOutput<R> {
    pub records: Vec<R>,
    pub context: ParseContext,
    pub stats: ParseStats,
}

/// Records and counters for a whole document.
#[derive(Debug, Clone)]
pub struct ParseOutput<R> {
    pub layout: Layout,
    pub records: Vec<R>,
    pub stats: ParseStats,
    /// Context after the last page.
    pub context: ParseContext,
}

/// Parse one page, starting from `context`.
pub fn parse_page<R: LayoutRecord>(
    rules: &LayoutRules,
    block: &RawTextBlock,
    context: ParseContext,
) -> PageOutput<R> {
    debug_assert_eq!(rules.layout(), R::LAYOUT);

    let mut context = context;
    let mut records = Vec::new();
    let mut stats = ParseStats {
        pages: 1,
        ..ParseStats::default()
    };

    for (index, line) in block.text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let source = SourceLocation {
            document: context.document,
            page: block.page_index,
            line: index + 1,
        };

        match rules.match_line(line) {
            Some(LineMatch::Header { name, detail }) => match normalize_name(name) {
                Some(name) => {
                    trace!("Employee header at {:?}: {}", source, name);
                    context.employee = Some(EmployeeHeader {
                        name,
                        detail: detail.and_then(normalize_text),
                    });
                    stats.header();
                }
                None => {
                    context.employee = None;
                    stats.skip();
                }
            },
            Some(LineMatch::ClosingDate(token)) => match parse_date(token, None) {
                Some(date) => {
                    context.closing_date = Some(date);
                    stats.header();
                }
                None => stats.reject_date(),
            },
            Some(LineMatch::Record { rule, captures }) => {
                match read_record(&captures, &context, source) {
                    Some(fields) => {
                        trace!("Rule {} matched line {:?}", rule, source);
                        records.push(R::from_fields(fields));
                        stats.record();
                    }
                    None => {
                        trace!("Unreadable date on line {:?}: {}", source, line.trim());
                        stats.reject_date();
                    }
                }
            }
            Some(LineMatch::UnreadableHeader) => {
                // Records stay unattributed until the next readable header.
                warn!("Unreadable employee header at {:?}: {}", source, line.trim());
                context.employee = None;
                stats.skip();
            }
            None => {
                trace!("Skipped line {:?}: {}", source, line.trim());
                stats.skip();
            }
        }
    }

    PageOutput {
        records,
        context,
        stats,
    }
}

/// Parse all pages of a document in order, threading the context through.
pub fn parse_document<R: LayoutRecord>(
    rules: &LayoutRules,
    blocks: &[RawTextBlock],
    context: ParseContext,
) -> ParseOutput<R> {
    let initial = ParseOutput {
        layout: rules.layout(),
        records: Vec::new(),
        stats: ParseStats::default(),
        context,
    };

    let output = blocks.iter().fold(initial, |mut acc, block| {
        let page = parse_page::<R>(rules, block, acc.context);
        acc.records.extend(page.records);
        acc.stats += page.stats;
        acc.context = page.context;
        acc
    });

    debug!(
        "Parsed {} {} records from {} pages ({} of {} lines matched)",
        output.records.len(),
        output.layout,
        output.stats.pages,
        output.stats.lines_matched,
        output.stats.lines_scanned
    );

    output
}

fn read_record(
    captures: &Captures<'_>,
    context: &ParseContext,
    source: SourceLocation,
) -> Option<RecordFields> {
    let hint = context.year_hint();
    let date = parse_date(captures.name("date")?.as_str(), hint)?;

    let text = |group: &str| captures.name(group).and_then(|m| normalize_text(m.as_str()));

    Some(RecordFields {
        employee_name: context.employee.as_ref().map(|e| e.name.clone()),
        date,
        posted_date: captures
            .name("posted")
            .and_then(|m| parse_date(m.as_str(), hint)),
        amount: captures.name("amount").and_then(|m| parse_amount(m.as_str())),
        description: text("description"),
        reference: text("reference"),
        gl_code: text("gl"),
        source,
    })
}

/// Layout-aware parser configured once per run.
#[derive(Debug, Clone, Default)]
pub struct FieldParser {
    default_year: Option<i32>,
}

impl FieldParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        Self {
            default_year: config.default_year,
        }
    }

    /// Parse the pages of document `document` with the layout of `R`.
    pub fn parse<R: LayoutRecord>(&self, blocks: &[RawTextBlock], document: usize) -> ParseOutput<R> {
        let context = ParseContext::new(document).with_default_year(self.default_year);
        parse_document(&LayoutRules::for_layout(R::LAYOUT), blocks, context)
    }

    /// Parse statement pages of document `document` into transactions.
    pub fn parse_transactions(
        &self,
        blocks: &[RawTextBlock],
        document: usize,
    ) -> ParseOutput<ParsedTransaction> {
        self.parse(blocks, document)
    }

    /// Parse receipt report pages of document `document` into receipts.
    pub fn parse_receipts(&self, blocks: &[RawTextBlock], document: usize) -> ParseOutput<ParsedReceipt> {
        self.parse(blocks, document)
    }
}

/// Parse statement pages with default settings.
pub fn parse_transactions(blocks: &[RawTextBlock]) -> ParseOutput<ParsedTransaction> {
    FieldParser::new().parse_transactions(blocks, 0)
}

/// Parse receipt report pages with default settings.
pub fn parse_receipts(blocks: &[RawTextBlock]) -> ParseOutput<ParsedReceipt> {
    FieldParser::new().parse_receipts(blocks, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const STATEMENT_PAGE_1: &str = "\
CORPORATE CARD STATEMENT
Statement Closing Date: 04/30/2025
Trans Date Post Date Description Amount
Cardholder: JOHN SMITH Account Ending 1234
04/01/2025 04/02/2025 CHEVRON #12345 HOUSTON TX 75.50
04/03 04/04 DELTA AIR 0062 6400-100 $1,204.10
";

    const STATEMENT_PAGE_2: &str = "\
Page 2 of 2
04/05/2025 04/06/2025 REFUND STAPLES (25.00)
ALICE LEE XXXX-XXXX-XXXX-4821
04/07/2025 04/08/2025 UBER TRIP 18.20
";

    #[test]
    fn test_parse_statement_across_pages() {
        let blocks = vec![
            RawTextBlock::new(0, STATEMENT_PAGE_1),
            RawTextBlock::new(1, STATEMENT_PAGE_2),
        ];
        let output = parse_transactions(&blocks);

        assert_eq!(output.records.len(), 4);

        let chevron = &output.records[0];
        assert_eq!(chevron.employee_name.as_deref(), Some("JOHN SMITH"));
        assert_eq!(chevron.date, Some(ymd(2025, 4, 1)));
        assert_eq!(chevron.posted_date, Some(ymd(2025, 4, 2)));
        assert_eq!(chevron.amount, Some(dec("75.50")));
        assert_eq!(chevron.description.as_deref(), Some("CHEVRON #12345 HOUSTON TX"));
        assert_eq!(chevron.source, SourceLocation { document: 0, page: 0, line: 5 });

        let delta = &output.records[1];
        assert_eq!(delta.date, Some(ymd(2025, 4, 3)));
        assert_eq!(delta.gl_code.as_deref(), Some("6400-100"));
        assert_eq!(delta.amount, Some(dec("1204.10")));

        // Page 2 continues John Smith's table until Alice Lee's header.
        let refund = &output.records[2];
        assert_eq!(refund.employee_name.as_deref(), Some("JOHN SMITH"));
        assert_eq!(refund.amount, Some(dec("-25.00")));
        assert_eq!(refund.source.page, 1);

        assert_eq!(output.records[3].employee_name.as_deref(), Some("ALICE LEE"));

        assert_eq!(output.stats.pages, 2);
        assert_eq!(output.stats.records, 4);
        assert_eq!(output.stats.header_lines, 3);
        assert_eq!(output.stats.lines_skipped, 3);
        assert_eq!(output.stats.lines_scanned, 10);
        assert_eq!(
            output.context.employee,
            Some(EmployeeHeader {
                name: "ALICE LEE".to_string(),
                detail: Some("XXXX-XXXX-XXXX-4821".to_string())
            })
        );
    }

    #[test]
    fn test_context_is_threaded_explicitly() {
        let rules = LayoutRules::statement();
        let first = parse_page::<ParsedTransaction>(
            &rules,
            &RawTextBlock::new(0, "Cardholder: JOHN SMITH\n"),
            ParseContext::default(),
        );
        assert!(first.records.is_empty());

        let second = parse_page::<ParsedTransaction>(
            &rules,
            &RawTextBlock::new(1, "04/01/2025 CHEVRON 75.50"),
            first.context.clone(),
        );
        assert_eq!(second.records[0].employee_name.as_deref(), Some("JOHN SMITH"));

        // The same page without the carried context has no employee.
        let fresh = parse_page::<ParsedTransaction>(
            &rules,
            &RawTextBlock::new(1, "04/01/2025 CHEVRON 75.50"),
            ParseContext::default(),
        );
        assert_eq!(fresh.records[0].employee_name, None);
    }

    #[test]
    fn test_cardholder_header_with_bare_card_digits() {
        let text = "\
Cardholder: JOHN SMITH
04/01/2025 CHEVRON 75.50
Cardholder: ALICE LEE 4821
04/04/2025 TAXI 20.00
";
        let output = parse_transactions(&[RawTextBlock::new(0, text)]);
        assert_eq!(output.records.len(), 2);
        assert_eq!(output.records[1].employee_name.as_deref(), Some("ALICE LEE"));
        assert_eq!(output.stats.header_lines, 2);
    }

    #[test]
    fn test_unreadable_header_ends_previous_employee() {
        let text = "\
Cardholder: JOHN SMITH
04/01/2025 CHEVRON 75.50
Cardholder: ALICE LEE (secondary card)
04/04/2025 TAXI 20.00
";
        let output = parse_transactions(&[RawTextBlock::new(0, text)]);
        assert_eq!(output.records.len(), 2);
        assert_eq!(output.records[0].employee_name.as_deref(), Some("JOHN SMITH"));
        assert_eq!(output.records[1].employee_name, None);
        assert_eq!(output.stats.lines_skipped, 1);
        assert_eq!(output.context.employee, None);
    }

    #[test]
    fn test_incomplete_lines_are_kept() {
        let text = "\
Cardholder: JOHN SMITH
04/01/2025 04/02/2025 75.50
04/02/2025 CHEVRON N/A
";
        let output = parse_transactions(&[RawTextBlock::new(0, text)]);
        assert_eq!(output.records.len(), 2);

        assert_eq!(output.records[0].description, None);
        assert_eq!(output.records[0].amount, Some(dec("75.50")));

        assert_eq!(output.records[1].description.as_deref(), Some("CHEVRON N/A"));
        assert_eq!(output.records[1].amount, None);
    }

    #[test]
    fn test_unparseable_date_is_skipped() {
        let text = "\
Cardholder: JOHN SMITH
13/45/2025 CHEVRON 75.50
04/01 NO YEAR KNOWN 10.00
";
        let output = parse_transactions(&[RawTextBlock::new(0, text)]);
        assert!(output.records.is_empty());
        assert_eq!(output.stats.lines_skipped, 2);
        assert_eq!(output.stats.dates_rejected, 2);
        assert!(!output.stats.is_format_mismatch());
    }

    #[test]
    fn test_default_year_applies_without_closing_date() {
        let parser = FieldParser::from_config(&ParserConfig {
            default_year: Some(2024),
        });
        let output = parser.parse_transactions(&[RawTextBlock::new(0, "04/01 CHEVRON 10.00")], 0);
        assert_eq!(output.records[0].date, Some(ymd(2024, 4, 1)));
    }

    #[test]
    fn test_format_mismatch_vs_empty_page() {
        let unknown = "Lorem ipsum dolor sit amet\nconsectetur adipiscing elit\n";
        let output = parse_transactions(&[RawTextBlock::new(0, unknown)]);
        assert!(output.records.is_empty());
        assert_eq!(output.stats.lines_scanned, 2);
        assert_eq!(output.stats.lines_matched, 0);
        assert!(output.stats.is_format_mismatch());

        let empty = parse_transactions(&[RawTextBlock::new(0, "")]);
        assert!(empty.records.is_empty());
        assert_eq!(empty.stats.lines_scanned, 0);
        assert!(!empty.stats.is_format_mismatch());
    }

    #[test]
    fn test_parse_receipt_report() {
        let text = "\
EXPENSE REPORT
Employee Name: J. Smith ID: E123
Date Vendor GL Amount
04/01/2025 Chevron 6100-200 $75.50
Hilton Garden Inn 04/02/2025 312.40
04/03/2025 Office Depot refund -12.99
Report Total 375.91
";
        let output = parse_receipts(&[RawTextBlock::new(0, text)]);
        assert_eq!(output.layout, Layout::ReceiptReport);
        assert_eq!(output.records.len(), 3);

        let chevron = &output.records[0];
        assert_eq!(chevron.employee_name.as_deref(), Some("J. Smith"));
        assert_eq!(chevron.description.as_deref(), Some("Chevron"));
        assert_eq!(chevron.gl_code.as_deref(), Some("6100-200"));
        assert_eq!(chevron.amount, Some(dec("75.50")));

        assert_eq!(output.records[1].description.as_deref(), Some("Hilton Garden Inn"));
        assert_eq!(output.records[1].date, Some(ymd(2025, 4, 2)));
        assert_eq!(output.records[2].amount, Some(dec("-12.99")));
        assert_eq!(output.stats.lines_skipped, 3);
    }

    #[test]
    fn test_document_index_recorded() {
        let output = FieldParser::new().parse_receipts(
            &[RawTextBlock::new(0, "Employee: A. Lee\n04/01/2025 Taxi 20.00")],
            3,
        );
        assert_eq!(output.records[0].source.document, 3);
    }
}
