//! Run command - reconcile a statement against receipt reports.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use recon_core::parser::rules::format_amount;
use recon_core::pdf::{PdfTextExtractor, RawTextBlock, TextExtractor};
use recon_core::{
    EmployeeDirectory, EmployeeLookup, ExtractionError, ReasonCode, ReconciliationRun, Reconciler, RunSummary,
};

use super::{load_config, write_output, OutputFormat};

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Card statement PDF
    #[arg(short, long)]
    statement: PathBuf,

    /// Receipt report PDFs or glob patterns, in submission order
    #[arg(short, long, num_args = 1..)]
    receipts: Vec<String>,

    /// Employee directory JSON (canonical names and aliases)
    #[arg(short, long)]
    employees: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Fail on unreadable receipts and unrecognised document formats
    #[arg(long)]
    strict: bool,

    /// Number of documents extracted in parallel
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,
}

#[derive(Serialize)]
struct RunReport<'a> {
    summary: RunSummary,
    #[serde(flatten)]
    run: &'a ReconciliationRun,
}

pub async fn run(args: RunArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.strict {
        config.run.skip_unreadable_receipts = false;
        config.run.fail_on_format_mismatch = true;
    }

    if !args.statement.exists() {
        anyhow::bail!("Statement file not found: {}", args.statement.display());
    }

    let directory = EmployeeDirectory::from_file(&args.employees)
        .map_err(|e| anyhow::anyhow!("Failed to load employees {}: {}", args.employees.display(), e))?;
    let lookup = EmployeeLookup::new(&directory);
    info!("Loaded {} employees", lookup.len());

    let receipt_files = expand_receipts(&args.receipts)?;
    eprintln!(
        "{} Reconciling {} against {} receipt documents",
        style("ℹ").blue(),
        args.statement.display(),
        receipt_files.len()
    );

    let reconciler = Reconciler::new(config)?;
    let extractor = reconciler.extractor().clone();

    let pb = ProgressBar::new(receipt_files.len() as u64 + 1);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents")
            .unwrap()
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));

    let statement_task = spawn_extraction(args.statement.clone(), extractor.clone(), semaphore.clone());
    let receipt_tasks: Vec<_> = receipt_files
        .iter()
        .map(|path| spawn_extraction(path.clone(), extractor.clone(), semaphore.clone()))
        .collect();

    // Awaiting in spawn order keeps submission order.
    let statement = statement_task
        .await?
        .map_err(|e| anyhow::anyhow!("Failed to read statement {}: {}", args.statement.display(), e))?;
    pb.inc(1);

    let mut receipts = Vec::with_capacity(receipt_tasks.len());
    for (task, path) in receipt_tasks.into_iter().zip(&receipt_files) {
        let extracted = task.await?;
        if let Err(e) = &extracted {
            warn!("Failed to read {}: {}", path.display(), e);
        }
        receipts.push(extracted);
        pb.inc(1);
    }
    pb.finish_with_message("Extracted");

    let run = reconciler.run_extracted(statement, receipts, &lookup)?;

    let content = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&RunReport {
            summary: run.summary(),
            run: &run,
        })?,
        OutputFormat::Csv => format_csv(&run)?,
        OutputFormat::Text => format_text(&run, &receipt_files),
    };
    write_output(&content, args.output.as_deref())?;

    print_summary(&run.summary());
    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Expand each pattern in order; a pattern that is a plain path matches itself.
fn expand_receipts(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let matched: Vec<PathBuf> = glob(pattern)?
            .filter_map(|r| r.ok())
            .filter(|p| is_pdf(p))
            .collect();

        if matched.is_empty() {
            warn!("No receipt documents match {}", pattern);
        }
        for path in matched {
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Read and extract one document off the async runtime.
fn spawn_extraction(
    path: PathBuf,
    extractor: PdfTextExtractor,
    semaphore: Arc<Semaphore>,
) -> tokio::task::JoinHandle<Result<Vec<RawTextBlock>, ExtractionError>> {
    tokio::spawn(async move {
        let _permit = semaphore
            .acquire_owned()
            .await
            .map_err(|e| ExtractionError::Parse(e.to_string()))?;

        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| ExtractionError::Parse(format!("cannot read {}: {}", path.display(), e)))?;
        debug!("Read {} ({} bytes)", path.display(), data.len());

        tokio::task::spawn_blocking(move || extractor.extract(&data))
            .await
            .map_err(|e| ExtractionError::TextExtraction(e.to_string()))?
    })
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_csv(run: &ReconciliationRun) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "employee_key",
        "employee_name",
        "date",
        "amount",
        "description",
        "credit",
        "incomplete",
        "reason",
        "confidence",
        "receipt_date",
        "receipt_amount",
        "receipt_vendor",
    ])?;

    for result in &run.matches {
        let t = &run.transactions[result.transaction];
        let receipt = result.receipt.map(|r| &run.receipts[r]);

        wtr.write_record([
            opt(t.employee.as_ref().map(|e| e.key.as_str())),
            opt(t.employee.as_ref().map(|e| e.display_name.as_str()).or(t.record.employee_name.as_deref())),
            opt(t.date()),
            opt(t.amount()),
            t.description().to_string(),
            t.is_credit.to_string(),
            t.incomplete.to_string(),
            result.reason.to_string(),
            opt(result.confidence.map(|c| format!("{:.3}", c))),
            opt(receipt.and_then(|r| r.date())),
            opt(receipt.and_then(|r| r.amount())),
            opt(receipt.map(|r| r.description())),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(run: &ReconciliationRun, receipt_files: &[PathBuf]) -> String {
    let mut output = String::new();

    output.push_str("Transactions:\n");
    for result in &run.matches {
        let t = &run.transactions[result.transaction];
        let who = t
            .employee
            .as_ref()
            .map(|e| e.display_name.clone())
            .or_else(|| t.record.employee_name.clone())
            .unwrap_or_else(|| "?".to_string());

        output.push_str(&format!(
            "  {:<10} {:<18} {:>12}  {:<30} {}",
            opt(t.date()),
            who,
            opt(t.amount().map(format_amount)),
            t.description(),
            result.reason
        ));
        if let (Some(r), Some(confidence)) = (result.receipt, result.confidence) {
            let receipt = &run.receipts[r];
            output.push_str(&format!(" -> {} ({:.0}%)", receipt.description(), confidence * 100.0));
        }
        if t.is_credit {
            output.push_str(" [credit]");
        }
        if t.incomplete {
            let issues: Vec<String> = t.issues.iter().map(ToString::to_string).collect();
            output.push_str(&format!(" [incomplete: {}]", issues.join(", ")));
        }
        output.push('\n');
    }

    let unmatched: Vec<_> = run.unmatched_receipts().collect();
    if !unmatched.is_empty() {
        output.push_str("\nUnmatched receipts:\n");
        for (_, r) in unmatched {
            output.push_str(&format!(
                "  {:<10} {:>12}  {}\n",
                opt(r.date()),
                opt(r.amount().map(format_amount)),
                r.description()
            ));
        }
    }

    if !run.unresolved_names.is_empty() {
        output.push_str("\nUnresolved employees:\n");
        for name in &run.unresolved_names {
            output.push_str(&format!("  {}\n", name));
        }
    }

    if !run.duplicates.is_empty() {
        output.push_str("\nPossible duplicate charges:\n");
        for pair in &run.duplicates {
            let first = &run.transactions[pair.first];
            output.push_str(&format!(
                "  {} {} {} (transactions {} and {})\n",
                opt(first.date()),
                opt(first.amount().map(format_amount)),
                first.description(),
                pair.first + 1,
                pair.second + 1
            ));
        }
    }

    if !run.document_failures.is_empty() {
        output.push_str("\nUnreadable receipt documents:\n");
        for failure in &run.document_failures {
            let name = receipt_files
                .get(failure.document - 1)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| format!("document {}", failure.document));
            output.push_str(&format!("  {}: {}\n", name, failure.error));
        }
    }

    output
}

fn print_summary(summary: &RunSummary) {
    eprintln!();
    eprintln!(
        "{} {} transactions, {} receipts, {} matched",
        style("✓").green(),
        summary.transactions,
        summary.receipts,
        style(summary.matched).green()
    );
    for code in ReasonCode::ALL {
        let count = summary.reasons.get(&code).copied().unwrap_or(0);
        if count > 0 {
            eprintln!("   {:<30} {}", code.as_str(), count);
        }
    }
    if summary.unmatched_receipts > 0 {
        eprintln!("   {} unmatched receipts", style(summary.unmatched_receipts).yellow());
    }
    if summary.incomplete_transactions > 0 {
        eprintln!("   {} incomplete transactions", style(summary.incomplete_transactions).yellow());
    }
    if summary.document_failures > 0 {
        eprintln!("   {} unreadable receipt documents", style(summary.document_failures).red());
    }
}
