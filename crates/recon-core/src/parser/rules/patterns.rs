//! Regex patterns for card statements and expense receipt reports.
//!
//! Record patterns are written as templates; `@DATE@`, `@AMOUNT@` and
//! `@GL@` expand to the shared token patterns below.

use lazy_static::lazy_static;
use regex::Regex;

/// `MM/DD/YYYY`, `MM/DD/YY`, `MM/DD`, `MM-DD-YYYY`, `YYYY-MM-DD`.
pub const DATE_TOKEN: &str =
    r"(?:\d{1,2}/\d{1,2}(?:/\d{4}|/\d{2})?|\d{1,2}-\d{1,2}-\d{4}|\d{4}-\d{1,2}-\d{1,2})";

/// Signed amount with optional currency symbol, thousands separators,
/// accounting parentheses, trailing minus or `CR` suffix. A leading sign
/// must touch the number or the currency symbol.
pub const AMOUNT_TOKEN: &str =
    r"(?:\(?[-+\u{2212}]?(?:\$\s?[-+\u{2212}]?)?(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2}(?:\s?\$)?\)?(?:-|\s?CR)?)";

/// Hyphenated GL account / cost-center code, e.g. `6100-200`.
pub const GL_TOKEN: &str = r"(?:\d{4,5}-\d{2,5})";

fn rule(template: &str) -> Regex {
    let expanded = template
        .replace("@DATE@", DATE_TOKEN)
        .replace("@AMOUNT@", AMOUNT_TOKEN)
        .replace("@GL@", GL_TOKEN);
    Regex::new(&expanded).unwrap()
}

lazy_static! {
    // Statement: employee headers
    pub static ref STATEMENT_CARDHOLDER: Regex = Regex::new(
        r"(?i)^\s*card\s*holder(?:\s+name)?\s*[:\-]?\s+(?P<name>[a-z][a-z.,'\- ]*?[a-z.])(?:\s+(?:(?:account|acct|card)(?:\s+(?:number|no\.?|ending(?:\s+in)?))?\s*[:#]?\s*)?(?P<detail>[x*\d][x*\d\- ]*)|\s+(?:employee\s+)?id\s*[:#]?\s*(?P<id>[a-z0-9][a-z0-9\-]*))?\s*$"
    ).unwrap();

    pub static ref STATEMENT_HEADER_KEYWORD: Regex = Regex::new(
        r"(?i)^\s*card\s*holder\b"
    ).unwrap();

    pub static ref STATEMENT_MASKED_CARD: Regex = Regex::new(
        r"^\s*(?P<name>[A-Z][A-Z.'\-]*(?:\s+[A-Z][A-Z.'\-]*)+?)\s+(?P<detail>(?:[X*]{4}[\s\-]?){1,3}\d{4})\s*$"
    ).unwrap();

    // Statement: closing date, source of the year for MM/DD dates
    pub static ref STATEMENT_CLOSING_DATE: Regex = Regex::new(
        r"(?i)\b(?:closing|statement)\s+date\s*[:\-]?\s*(?P<date>\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{1,2}-\d{1,2})"
    ).unwrap();

    // Statement: transaction lines
    pub static ref STATEMENT_TRANSACTION: Regex = rule(
        r"^\s*(?P<date>@DATE@)(?:\s+(?P<posted>@DATE@))?(?:\s+(?P<reference>\d{10,30}))?(?:\s+(?P<description>.*?))?(?:\s+(?P<gl>@GL@))?\s+(?P<amount>@AMOUNT@)\s*$"
    );

    pub static ref STATEMENT_TRANSACTION_PARTIAL: Regex = rule(
        r"^\s*(?P<date>@DATE@)(?:\s+(?P<posted>@DATE@))?(?:\s+(?P<reference>\d{10,30}))?(?:\s+(?P<description>.*?))?\s*$"
    );

    // Receipt report: employee headers
    pub static ref RECEIPT_EMPLOYEE: Regex = Regex::new(
        r"(?i)^\s*(?:employee(?:\s+name)?|report\s+(?:for|owner)|submitted\s+by)\s*[:\-]?\s+(?P<name>[a-z][a-z.,'\- ]*?[a-z.])(?:\s+(?:employee\s+)?(?:id|#)\s*[:#]?\s*(?P<detail>[a-z0-9\-]+))?\s*$"
    ).unwrap();

    pub static ref RECEIPT_HEADER_KEYWORD: Regex = Regex::new(
        r"(?i)^\s*(?:employee(?:\s+name)?|report\s+(?:for|owner)|submitted\s+by)\s*[:\-]"
    ).unwrap();

    // Receipt report: receipt lines
    pub static ref RECEIPT_LINE: Regex = rule(
        r"^\s*(?P<date>@DATE@)(?:\s+(?P<description>.*?))?(?:\s+(?P<gl>@GL@))?\s+(?P<amount>@AMOUNT@)\s*$"
    );

    pub static ref RECEIPT_LINE_VENDOR_FIRST: Regex = rule(
        r"^\s*(?P<description>[A-Za-z][^\d]*?)\s+(?P<date>@DATE@)(?:\s+(?P<gl>@GL@))?\s+(?P<amount>@AMOUNT@)\s*$"
    );

    pub static ref RECEIPT_LINE_PARTIAL: Regex = rule(
        r"^\s*(?P<date>@DATE@)(?:\s+(?P<description>.*?))?\s*$"
    );

    // Shared token matchers
    pub static ref DATE_MDY_PARTS: Regex = Regex::new(
        r"^(\d{1,2})[/\-](\d{1,2})(?:[/\-](\d{4}|\d{2}))?$"
    ).unwrap();

    pub static ref DATE_YMD_PARTS: Regex = Regex::new(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})$"
    ).unwrap();
}
