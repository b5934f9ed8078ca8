//! Markdown report generation
//!
//! This module generates a human-readable markdown report of a run,
//! written into the output folder next to the PDFs.

use crate::output::{OutputResult, RunSummary};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// File name of the report inside the output folder
pub const REPORT_FILE_NAME: &str = "crawl-report.md";

/// Run metadata shown at the top of the report
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    pub run_id: Option<i64>,
    pub seed_url: String,
    pub mode: String,
    pub workers: usize,
    pub started_at: String,
    pub finished_at: String,
    pub duration_seconds: u64,
    pub config_hash: String,
}

/// Writes the markdown report for a run
///
/// # Arguments
///
/// * `summary` - The final run summary
/// * `context` - Run metadata
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_markdown_report(
    summary: &RunSummary,
    context: &ReportContext,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_report(summary, context);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_report(summary: &RunSummary, context: &ReportContext) -> String {
    let mut md = String::new();

    md.push_str("# Site-Folio Crawl Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    if let Some(run_id) = context.run_id {
        md.push_str(&format!("- **Run ID**: {}\n", run_id));
    }
    md.push_str(&format!("- **Seed**: {}\n", context.seed_url));
    md.push_str(&format!("- **Mode**: {}\n", context.mode));
    md.push_str(&format!("- **Workers**: {}\n", context.workers));
    md.push_str(&format!("- **Started**: {}\n", context.started_at));
    md.push_str(&format!("- **Finished**: {}\n", context.finished_at));
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        context.duration_seconds,
        context.duration_seconds as f64 / 60.0
    ));
    if !context.config_hash.is_empty() {
        md.push_str(&format!("- **Config Hash**: {}\n", context.config_hash));
    }
    let status = match &summary.aborted {
        Some(reason) => format!("stopped early ({})", reason),
        None => "completed".to_string(),
    };
    md.push_str(&format!("- **Status**: {}\n\n", status));

    // Outcome table
    md.push_str("## Outcomes\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Processed | {} |\n", summary.processed));
    md.push_str(&format!("| Created | {} |\n", summary.created));
    md.push_str(&format!("| Updated | {} |\n", summary.updated));
    md.push_str(&format!("| Skipped | {} |\n", summary.skipped));
    md.push_str(&format!("| Errors | {} |\n\n", summary.error_count));

    if summary.overflowed > 0 {
        md.push_str(&format!(
            "{} discovered links were dropped because the queue was full.\n\n",
            summary.overflowed
        ));
    }

    // Errors
    if !summary.errors.is_empty() {
        md.push_str("## Errors\n\n");
        md.push_str("| URL | Reason |\n");
        md.push_str("|-----|--------|\n");
        for error in &summary.errors {
            md.push_str(&format!(
                "| {} | {} |\n",
                escape_cell(&error.url),
                escape_cell(&error.reason)
            ));
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str("*Generated by Site-Folio*\n");

    md
}

/// Keeps table cells on one row
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
