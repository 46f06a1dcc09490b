//! Data models shared across the pipeline.

pub mod config;
pub mod employee;
pub mod matching;
pub mod record;

pub use config::{MatchConfig, ParserConfig, PdfConfig, ReconConfig, RunConfig};
pub use employee::{EmployeeDirectory, EmployeeIdentity, EmployeeKey};
pub use matching::{MatchResult, ReasonCode};
pub use record::{
    ClassifiedReceipt, ClassifiedTransaction, ParsedReceipt, ParsedTransaction, RecordIssue,
    SourceLocation,
};
