//! Line counters for format-change diagnostics.

use serde::{Deserialize, Serialize};

use super::Layout;
use crate::error::ParseError;

/// What happened to the lines of a document.
///
/// Blank lines are not counted. `lines_scanned == lines_matched + lines_skipped`
/// and `lines_matched == header_lines + records`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Pages read.
    pub pages: usize,
    /// Non-blank lines tested against the rules.
    pub lines_scanned: usize,
    /// Lines recognised by any rule.
    pub lines_matched: usize,
    /// Employee header and statement metadata lines.
    pub header_lines: usize,
    /// Records emitted.
    pub records: usize,
    /// Lines that matched no rule or carried an unreadable date.
    pub lines_skipped: usize,
    /// Skipped lines whose shape matched but whose date did not parse.
    pub dates_rejected: usize,
}

impl ParseStats {
    /// No line was scanned at all (empty or image-only document).
    pub fn is_empty(&self) -> bool {
        self.lines_scanned == 0
    }

    /// Lines were present but none matched: the layout has likely changed.
    pub fn is_format_mismatch(&self) -> bool {
        self.lines_scanned > 0 && self.lines_matched == 0
    }

    /// Share of scanned lines that matched, in [0, 1].
    pub fn match_rate(&self) -> f64 {
        if self.lines_scanned == 0 {
            0.0
        } else {
            self.lines_matched as f64 / self.lines_scanned as f64
        }
    }

    /// Turn a format mismatch into an error for callers that want to raise it.
    pub fn ensure_recognized(&self, layout: Layout) -> Result<(), ParseError> {
        if self.is_format_mismatch() {
            Err(ParseError::FormatMismatch {
                layout,
                lines_scanned: self.lines_scanned,
            })
        } else {
            Ok(())
        }
    }

    pub(crate) fn header(&mut self) {
        self.lines_scanned += 1;
        self.lines_matched += 1;
        self.header_lines += 1;
    }

    pub(crate) fn record(&mut self) {
        self.lines_scanned += 1;
        self.lines_matched += 1;
        self.records += 1;
    }

    pub(crate) fn skip(&mut self) {
        self.lines_scanned += 1;
        self.lines_skipped += 1;
    }

    pub(crate) fn reject_date(&mut self) {
        self.skip();
        self.dates_rejected += 1;
    }
}

impl std::ops::AddAssign for ParseStats {
    fn add_assign(&mut self, other: Self) {
        self.pages += other.pages;
        self.lines_scanned += other.lines_scanned;
        self.lines_matched += other.lines_matched;
        self.header_lines += other.header_lines;
        self.records += other.records;
        self.lines_skipped += other.lines_skipped;
        self.dates_rejected += other.dates_rejected;
    }
}
