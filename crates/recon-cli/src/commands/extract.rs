//! Extract command - parse one document and dump its records.
//!
//! Used when maintaining line patterns: shows what each layout recognises
//! and how many lines it skipped.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::info;

use recon_core::parser::rules::format_amount;
use recon_core::parser::ParseStats;
use recon_core::pdf::{PdfTextExtractor, RawTextBlock, TextExtractor};
use recon_core::{FieldParser, ParsedReceipt, ParsedTransaction};

use super::{load_config, write_output, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Document layout
    #[arg(short, long, value_enum, default_value = "statement")]
    layout: LayoutArg,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print the raw page text instead of parsed records
    #[arg(long)]
    raw: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum LayoutArg {
    /// Corporate card statement
    Statement,
    /// Expense receipt report
    Receipt,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Records {
    Transactions(Vec<ParsedTransaction>),
    Receipts(Vec<ParsedReceipt>),
}

#[derive(Serialize)]
struct ExtractReport {
    records: Records,
    stats: ParseStats,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Extracting {}", args.input.display());
    let data = tokio::fs::read(&args.input).await?;
    let extractor = PdfTextExtractor::from_config(&config.pdf);
    let blocks = tokio::task::spawn_blocking(move || extractor.extract(&data)).await??;

    if args.raw {
        return write_output(&format_pages(&blocks), args.output.as_deref());
    }

    let parser = FieldParser::from_config(&config.parser);
    let (records, stats) = match args.layout {
        LayoutArg::Statement => {
            let output = parser.parse_transactions(&blocks, 0);
            (Records::Transactions(output.records), output.stats)
        }
        LayoutArg::Receipt => {
            let output = parser.parse_receipts(&blocks, 0);
            (Records::Receipts(output.records), output.stats)
        }
    };

    if stats.is_format_mismatch() {
        eprintln!(
            "{} None of {} lines matched; the document format may have changed.",
            console::style("⚠").yellow(),
            stats.lines_scanned
        );
    }

    let report = ExtractReport { records, stats };
    let content = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Csv => format_csv(&report.records)?,
        OutputFormat::Text => format_text(&report),
    };

    write_output(&content, args.output.as_deref())
}

fn format_pages(blocks: &[RawTextBlock]) -> String {
    blocks
        .iter()
        .map(|b| format!("--- page {} ---\n{}", b.page_index + 1, b.text.trim_end()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn format_csv(records: &Records) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    match records {
        Records::Transactions(transactions) => {
            wtr.write_record([
                "page", "line", "employee", "date", "posted_date", "amount", "description", "reference", "gl_code",
            ])?;
            for t in transactions {
                wtr.write_record([
                    &(t.source.page + 1).to_string(),
                    &t.source.line.to_string(),
                    &opt(&t.employee_name),
                    &opt(&t.date),
                    &opt(&t.posted_date),
                    &opt(&t.amount),
                    &opt(&t.description),
                    &opt(&t.reference),
                    &opt(&t.gl_code),
                ])?;
            }
        }
        Records::Receipts(receipts) => {
            wtr.write_record(["page", "line", "employee", "date", "amount", "description", "gl_code"])?;
            for r in receipts {
                wtr.write_record([
                    &(r.source.page + 1).to_string(),
                    &r.source.line.to_string(),
                    &opt(&r.employee_name),
                    &opt(&r.date),
                    &opt(&r.amount),
                    &opt(&r.description),
                    &opt(&r.gl_code),
                ])?;
            }
        }
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(report: &ExtractReport) -> String {
    let mut output = String::new();
    let stats = &report.stats;

    output.push_str(&format!(
        "Pages: {}  Lines: {}  Matched: {}  Skipped: {}  Bad dates: {}\n\n",
        stats.pages, stats.lines_scanned, stats.lines_matched, stats.lines_skipped, stats.dates_rejected
    ));

    match &report.records {
        Records::Transactions(transactions) => {
            for t in transactions {
                output.push_str(&format!(
                    "{:>3}:{:<3} {:<20} {:<10} {:>12}  {}\n",
                    t.source.page + 1,
                    t.source.line,
                    opt(&t.employee_name),
                    opt(&t.date),
                    opt(&t.amount.map(format_amount)),
                    opt(&t.description)
                ));
            }
        }
        Records::Receipts(receipts) => {
            for r in receipts {
                output.push_str(&format!(
                    "{:>3}:{:<3} {:<20} {:<10} {:>12}  {}\n",
                    r.source.page + 1,
                    r.source.line,
                    opt(&r.employee_name),
                    opt(&r.date),
                    opt(&r.amount.map(format_amount)),
                    opt(&r.description)
                ));
            }
        }
    }

    output
}
