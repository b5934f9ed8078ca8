//! Output module for progress reporting and run summaries
//!
//! This module handles:
//! - Accumulating per-page outcomes into a run summary
//! - Printing the summary and writing a markdown report
//! - Displaying archive statistics from the database

mod markdown;
mod reporter;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_report, write_markdown_report, ReportContext, REPORT_FILE_NAME};
pub use reporter::Reporter;
pub use stats::{load_statistics, print_statistics, ArchiveStatistics};
pub use summary::{print_summary, PageError, RunSummary};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
