//! Core library for corporate card reconciliation.
//!
//! This crate provides:
//! - PDF text extraction (text layer only)
//! - Rule-based field parsing of card statements and expense receipt reports
//! - Employee resolution against a canonical name / alias table
//! - Record classification (incomplete, credit)
//! - Weighted transaction-to-receipt matching with reason codes

pub mod classifier;
pub mod error;
pub mod matcher;
pub mod models;
pub mod parser;
pub mod pdf;
pub mod pipeline;
pub mod resolver;

pub use classifier::{classify_receipt, classify_transaction};
pub use error::{ConfigError, ExtractionError, ParseError, ReconError, Result};
pub use matcher::{find_duplicates, DuplicatePair, Matcher};
pub use models::config::ReconConfig;
pub use models::employee::{EmployeeDirectory, EmployeeIdentity, EmployeeKey};
pub use models::matching::{MatchResult, ReasonCode};
pub use models::record::{ClassifiedReceipt, ClassifiedTransaction, ParsedReceipt, ParsedTransaction};
pub use parser::{FieldParser, Layout, ParseStats};
pub use pdf::{PdfTextExtractor, RawTextBlock, TextExtractor};
pub use pipeline::{DocumentFailure, ReconciliationRun, Reconciler, RunSummary};
pub use resolver::{resolve, EmployeeLookup};
