//! One reconciliation run: extract, parse, classify, match.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classifier::{classify_receipt, classify_transaction};
use crate::error::{ExtractionError, ReconError, Result};
use crate::matcher::{find_duplicates, DuplicatePair, Matcher};
use crate::models::config::ReconConfig;
use crate::models::matching::{MatchResult, ReasonCode};
use crate::models::record::{ClassifiedReceipt, ClassifiedTransaction};
use crate::parser::{FieldParser, Layout, ParseStats};
use crate::pdf::{PdfTextExtractor, RawTextBlock, TextExtractor, TextLayer};
use crate::resolver::EmployeeLookup;

/// A receipt document that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    /// Document index within the run (receipt documents start at 1).
    pub document: usize,
    pub error: String,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationRun {
    pub transactions: Vec<ClassifiedTransaction>,
    pub receipts: Vec<ClassifiedReceipt>,
    /// One result per transaction, in transaction order.
    pub matches: Vec<MatchResult>,
    pub statement_stats: ParseStats,
    /// Receipt document counters, summed.
    pub receipt_stats: ParseStats,
    /// Printed names that did not resolve, sorted and deduplicated.
    pub unresolved_names: Vec<String>,
    /// Likely double charges on the statement.
    pub duplicates: Vec<DuplicatePair>,
    /// Receipt documents skipped as unreadable.
    pub document_failures: Vec<DocumentFailure>,
    /// Wall time of the run in milliseconds.
    pub processing_time_ms: u64,
}

/// Counts for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub transactions: usize,
    pub receipts: usize,
    pub matched: usize,
    pub reasons: BTreeMap<ReasonCode, usize>,
    pub incomplete_transactions: usize,
    pub incomplete_receipts: usize,
    pub credits: usize,
    pub unmatched_receipts: usize,
    pub duplicates: usize,
    pub document_failures: usize,
}

impl ReconciliationRun {
    pub fn summary(&self) -> RunSummary {
        let mut reasons: BTreeMap<ReasonCode, usize> =
            ReasonCode::ALL.iter().map(|&code| (code, 0)).collect();
        for result in &self.matches {
            *reasons.entry(result.reason).or_default() += 1;
        }

        let claimed: BTreeSet<usize> = self.matches.iter().filter_map(|m| m.receipt).collect();

        RunSummary {
            transactions: self.transactions.len(),
            receipts: self.receipts.len(),
            matched: claimed.len(),
            reasons,
            incomplete_transactions: self.transactions.iter().filter(|t| t.incomplete).count(),
            incomplete_receipts: self.receipts.iter().filter(|r| r.incomplete).count(),
            credits: self.transactions.iter().filter(|t| t.is_credit).count(),
            unmatched_receipts: self.receipts.len() - claimed.len(),
            duplicates: self.duplicates.len(),
            document_failures: self.document_failures.len(),
        }
    }

    /// Receipts no transaction claimed.
    pub fn unmatched_receipts(&self) -> impl Iterator<Item = (usize, &ClassifiedReceipt)> {
        let claimed: BTreeSet<usize> = self.matches.iter().filter_map(|m| m.receipt).collect();
        self.receipts
            .iter()
            .enumerate()
            .filter(move |(index, _)| !claimed.contains(index))
    }
}

/// Runs the pipeline with one configuration.
///
/// Holds no per-run state; a single instance can serve concurrent runs.
#[derive(Debug, Clone)]
pub struct Reconciler<E = PdfTextExtractor> {
    config: ReconConfig,
    extractor: E,
    parser: FieldParser,
    matcher: Matcher,
}

impl Reconciler<PdfTextExtractor> {
    /// Create a reconciler reading PDFs, validating the configuration.
    pub fn new(config: ReconConfig) -> Result<Self> {
        let extractor = PdfTextExtractor::from_config(&config.pdf);
        Self::with_extractor(config, extractor)
    }
}

impl<E: TextExtractor> Reconciler<E> {
    /// Create a reconciler with a custom text extractor.
    pub fn with_extractor(config: ReconConfig, extractor: E) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            parser: FieldParser::from_config(&config.parser),
            matcher: Matcher::new(config.matching.clone())?,
            extractor,
            config,
        })
    }

    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Reconcile one statement against receipt documents given as bytes.
    ///
    /// An unreadable statement fails the run.
    pub fn run(&self, statement: &[u8], receipts: &[&[u8]], lookup: &EmployeeLookup) -> Result<ReconciliationRun> {
        let statement = self.extractor.extract(statement)?;
        let receipts = receipts.iter().map(|data| self.extractor.extract(data)).collect();
        self.run_extracted(statement, receipts, lookup)
    }

    /// Reconcile pre-extracted page text.
    pub fn run_blocks(
        &self,
        statement: &[RawTextBlock],
        receipts: &[Vec<RawTextBlock>],
        lookup: &EmployeeLookup,
    ) -> Result<ReconciliationRun> {
        let receipts = receipts.iter().map(|blocks| Ok(blocks.clone())).collect();
        self.run_extracted(statement.to_vec(), receipts, lookup)
    }

    /// Reconcile a statement against receipt documents whose extraction
    /// may have failed, in submission order.
    pub fn run_extracted(
        &self,
        statement: Vec<RawTextBlock>,
        receipts: Vec<std::result::Result<Vec<RawTextBlock>, ExtractionError>>,
        lookup: &EmployeeLookup,
    ) -> Result<ReconciliationRun> {
        let start = Instant::now();

        check_text_layer(0, &statement);
        let statement_output = self.parser.parse_transactions(&statement, 0);
        self.check_format(0, Layout::Statement, &statement_output.stats)?;

        let mut parsed_receipts = Vec::new();
        let mut receipt_stats = ParseStats::default();
        let mut document_failures = Vec::new();

        for (offset, extracted) in receipts.into_iter().enumerate() {
            let document = offset + 1;
            let blocks = match extracted {
                Ok(blocks) => blocks,
                Err(e) if self.config.run.skip_unreadable_receipts => {
                    warn!("Skipping unreadable receipt document {}: {}", document, e);
                    document_failures.push(DocumentFailure {
                        document,
                        error: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(ReconError::Extraction(e)),
            };

            check_text_layer(document, &blocks);
            let output = self.parser.parse_receipts(&blocks, document);
            self.check_format(document, Layout::ReceiptReport, &output.stats)?;
            receipt_stats += output.stats;
            parsed_receipts.extend(output.records);
        }

        let transactions: Vec<ClassifiedTransaction> = statement_output
            .records
            .into_iter()
            .map(|record| classify_transaction(record, lookup))
            .collect();
        let receipts: Vec<ClassifiedReceipt> = parsed_receipts
            .into_iter()
            .map(|record| classify_receipt(record, lookup))
            .collect();

        let unresolved_names = unresolved_names(&transactions, &receipts);
        if !unresolved_names.is_empty() {
            warn!("{} employee names did not resolve", unresolved_names.len());
        }

        let matches = self.matcher.match_all(&transactions, &receipts);
        let duplicates = find_duplicates(
            &transactions,
            self.config.run.duplicate_window_days,
            self.config.run.duplicate_threshold,
        );

        let run = ReconciliationRun {
            transactions,
            receipts,
            matches,
            statement_stats: statement_output.stats,
            receipt_stats,
            unresolved_names,
            duplicates,
            document_failures,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        let summary = run.summary();
        info!(
            "Reconciled {} transactions against {} receipts: {} matched, {} unmatched receipts",
            summary.transactions, summary.receipts, summary.matched, summary.unmatched_receipts
        );
        Ok(run)
    }

    fn check_format(&self, document: usize, layout: Layout, stats: &ParseStats) -> Result<()> {
        if !stats.is_format_mismatch() {
            return Ok(());
        }
        if self.config.run.fail_on_format_mismatch {
            stats.ensure_recognized(layout)?;
        }
        warn!(
            "Document {}: none of {} lines matched the {} layout",
            document, stats.lines_scanned, layout
        );
        Ok(())
    }
}

fn check_text_layer(document: usize, blocks: &[RawTextBlock]) {
    if TextLayer::of(blocks) == TextLayer::Missing {
        warn!("Document {} has no text layer ({} pages)", document, blocks.len());
    } else {
        debug!("Document {}: {} pages of text", document, blocks.len());
    }
}

fn unresolved_names(transactions: &[ClassifiedTransaction], receipts: &[ClassifiedReceipt]) -> Vec<String> {
    let from_transactions = transactions
        .iter()
        .filter(|t| t.employee.is_none())
        .filter_map(|t| t.record.employee_name.clone());
    let from_receipts = receipts
        .iter()
        .filter(|r| r.employee.is_none())
        .filter_map(|r| r.record.employee_name.clone());

    from_transactions
        .chain(from_receipts)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::models::employee::EmployeeDirectory;
    use pretty_assertions::assert_eq;

    /// Reads UTF-8 text, one page per form feed.
    struct TextPages;

    impl TextExtractor for TextPages {
        fn extract(&self, data: &[u8]) -> crate::pdf::Result<Vec<RawTextBlock>> {
            let text = std::str::from_utf8(data).map_err(|e| ExtractionError::Parse(e.to_string()))?;
            Ok(text
                .split('\u{c}')
                .enumerate()
                .map(|(index, page)| RawTextBlock::new(index, page))
                .collect())
        }
    }

    const STATEMENT: &str = "\
Statement Closing Date: 04/30/2025
Cardholder: JOHN SMITH
04/01/2025 04/02/2025 CHEVRON #12345 HOUSTON TX 75.50
04/02/2025 04/03/2025 HILTON GARDEN INN 312.40
04/05/2025 04/06/2025 REFUND STAPLES (25.00)
\u{c}ALICE LEE XXXX-XXXX-XXXX-4821
04/07/2025 04/08/2025 UBER TRIP 18.20
Cardholder: PAT DOE
04/08/2025 04/08/2025 TAXI 20.00
";

    const RECEIPTS_SMITH: &str = "\
Employee Name: J SMITH ID: E123
04/01/2025 Chevron 6100-200 $75.50
Hilton Garden Inn 04/03/2025 312.40
";

    fn lookup() -> EmployeeLookup {
        EmployeeLookup::new(
            &EmployeeDirectory::default()
                .with_employee("E123", "John Smith")
                .with_employee("E200", "Alice Lee")
                .with_alias("J SMITH", "E123"),
        )
    }

    fn reconciler(config: ReconConfig) -> Reconciler<TextPages> {
        Reconciler::with_extractor(config, TextPages).unwrap()
    }

    #[test]
    fn test_full_run() {
        let run = reconciler(ReconConfig::default())
            .run(STATEMENT.as_bytes(), &[RECEIPTS_SMITH.as_bytes()], &lookup())
            .unwrap();

        assert_eq!(run.transactions.len(), 5);
        assert_eq!(run.receipts.len(), 2);
        assert_eq!(run.matches.len(), 5);

        let reasons: Vec<ReasonCode> = run.matches.iter().map(|m| m.reason).collect();
        assert_eq!(
            reasons,
            vec![
                ReasonCode::ExactMatch,
                ReasonCode::FuzzyMatch,
                ReasonCode::NoCandidate,
                ReasonCode::NoCandidate,
                ReasonCode::EmployeeUnresolved,
            ]
        );
        assert_eq!(run.matches[0].receipt, Some(0));
        assert_eq!(run.matches[1].receipt, Some(1));
        assert!(run.transactions[2].is_credit);
        assert_eq!(run.unresolved_names, vec!["PAT DOE".to_string()]);
        assert_eq!(run.receipts[0].record.source.document, 1);

        let summary = run.summary();
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.credits, 1);
        assert_eq!(summary.unmatched_receipts, 0);
        assert_eq!(summary.incomplete_transactions, 1);
        assert_eq!(summary.reasons[&ReasonCode::NoCandidate], 2);
        assert_eq!(summary.reasons[&ReasonCode::AmbiguousMultipleCandidates], 0);
    }

    #[test]
    fn test_unreadable_receipt_is_skipped() {
        let bad: &[u8] = &[0xff, 0xfe, 0x00];
        let run = reconciler(ReconConfig::default())
            .run(STATEMENT.as_bytes(), &[bad, RECEIPTS_SMITH.as_bytes()], &lookup())
            .unwrap();

        assert_eq!(run.document_failures.len(), 1);
        assert_eq!(run.document_failures[0].document, 1);
        // The readable document keeps its submission index.
        assert_eq!(run.receipts[0].record.source.document, 2);
        assert_eq!(run.summary().matched, 2);
    }

    #[test]
    fn test_unreadable_receipt_can_fail_the_run() {
        let mut config = ReconConfig::default();
        config.run.skip_unreadable_receipts = false;
        let bad: &[u8] = &[0xff, 0xfe, 0x00];

        let err = reconciler(config)
            .run(STATEMENT.as_bytes(), &[bad], &lookup())
            .unwrap_err();
        assert!(matches!(err, ReconError::Extraction(ExtractionError::Parse(_))));
    }

    #[test]
    fn test_unreadable_statement_fails() {
        let bad: &[u8] = &[0xff, 0xfe, 0x00];
        let err = reconciler(ReconConfig::default())
            .run(bad, &[], &lookup())
            .unwrap_err();
        assert!(matches!(err, ReconError::Extraction(_)));
    }

    #[test]
    fn test_format_mismatch_is_reported_or_raised() {
        let unknown = [RawTextBlock::new(0, "Lorem ipsum dolor\nsit amet")];

        let run = reconciler(ReconConfig::default())
            .run_blocks(&unknown, &[], &lookup())
            .unwrap();
        assert!(run.transactions.is_empty());
        assert!(run.statement_stats.is_format_mismatch());

        let mut config = ReconConfig::default();
        config.run.fail_on_format_mismatch = true;
        let err = reconciler(config).run_blocks(&unknown, &[], &lookup()).unwrap_err();
        assert!(matches!(
            err,
            ReconError::Parse(ParseError::FormatMismatch {
                layout: Layout::Statement,
                lines_scanned: 2
            })
        ));
    }

    #[test]
    fn test_empty_statement_is_not_a_mismatch() {
        let mut config = ReconConfig::default();
        config.run.fail_on_format_mismatch = true;
        let run = reconciler(config)
            .run_blocks(&[RawTextBlock::new(0, "")], &[], &lookup())
            .unwrap();
        assert!(run.statement_stats.is_empty());
        assert!(run.matches.is_empty());
    }

    #[test]
    fn test_duplicates_reported() {
        let statement = [RawTextBlock::new(
            0,
            "Cardholder: JOHN SMITH\n04/01/2025 STARBUCKS #501 5.00\n04/01/2025 STARBUCKS #501 5.00\n",
        )];
        let run = reconciler(ReconConfig::default())
            .run_blocks(&statement, &[], &lookup())
            .unwrap();
        assert_eq!(run.duplicates.len(), 1);
        assert_eq!(run.summary().duplicates, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ReconConfig::default();
        config.matching.amount_weight = 0.9;
        assert!(matches!(
            Reconciler::with_extractor(config, TextPages),
            Err(ReconError::Config(_))
        ));
    }

    #[test]
    fn test_reconciler_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Reconciler>();
        assert_send_sync::<EmployeeLookup>();
    }
}
