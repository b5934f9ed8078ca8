//! Crawler module for page discovery and processing
//!
//! This module contains the core crawling logic, including:
//! - The breadth-first frontier with exactly-once dispatch
//! - HTML parsing and link extraction
//! - The worker pool that renders and exports each page

mod coordinator;
mod frontier;
mod parser;

pub use coordinator::{Coordinator, StopHandle};
pub use frontier::{EnqueueResult, Frontier, FrontierEntry};
pub use parser::{extract_links_simple, parse_html, ParsedPage};

use crate::config::Config;
use crate::export::ExportMode;
use crate::output::RunSummary;
use crate::render::Renderer;
use crate::storage::Storage;
use crate::FolioError;
use std::sync::{Arc, Mutex};

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the seed and derive the domain scope
/// 2. Prepare the output folder and load stored hash records
/// 3. Render, export and follow links until the frontier is exhausted
/// 4. Record the run and return its summary
///
/// # Arguments
///
/// * `seed` - The seed URL
/// * `config` - The crawler configuration
/// * `mode` - Effective export mode
/// * `renderer` - The render engine
/// * `storage` - Hash record persistence
///
/// # Returns
///
/// * `Ok(RunSummary)` - Crawl finished (possibly stopped early, see `aborted`)
/// * `Err(FolioError)` - Crawl could not start
pub async fn crawl(
    seed: &str,
    config: &Config,
    mode: ExportMode,
    renderer: Arc<dyn Renderer>,
    storage: Arc<Mutex<dyn Storage>>,
) -> Result<RunSummary, FolioError> {
    let coordinator = Coordinator::new(seed, config, mode, renderer, storage)?;
    let (_, summary) = coordinator.run().await?;
    Ok(summary)
}
