//! Run summary types
//!
//! This module defines the summary accumulated over a run and its console
//! rendering.

use crate::storage::RunCounts;

/// A page that could not be archived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageError {
    /// The URL that failed
    pub url: String,

    /// Human-readable reason
    pub reason: String,
}

/// Counts and errors accumulated over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Pages that reached an outcome (success or error)
    pub processed: u64,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub error_count: u64,

    /// Errors in the order they were recorded
    pub errors: Vec<PageError>,

    /// Set when the run stopped early (engine loss, interrupt)
    pub aborted: Option<String>,

    /// Links dropped because the frontier was full
    pub overflowed: u64,
}

impl RunSummary {
    /// Creates an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the run visited everything it found
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }

    /// Number of pages that produced a new or changed PDF
    pub fn written(&self) -> u64 {
        self.created + self.updated
    }

    /// Converts to the counts persisted with the run
    pub fn counts(&self) -> RunCounts {
        RunCounts {
            processed: self.processed,
            created: self.created,
            updated: self.updated,
            skipped: self.skipped,
            errors: self.error_count,
        }
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("=== Crawl Summary ===");
    println!();
    println!("  Processed: {}", summary.processed);
    println!("  Created:   {}", summary.created);
    println!("  Updated:   {}", summary.updated);
    println!("  Skipped:   {}", summary.skipped);
    println!("  Errors:    {}", summary.error_count);

    if summary.overflowed > 0 {
        println!("  Dropped (queue full): {}", summary.overflowed);
    }

    if !summary.errors.is_empty() {
        println!();
        println!("Errors:");
        for error in &summary.errors {
            println!("  - {}: {}", error.url, error.reason);
        }
    }

    if let Some(reason) = &summary.aborted {
        println!();
        println!("Run stopped early: {}", reason);
    }
}
