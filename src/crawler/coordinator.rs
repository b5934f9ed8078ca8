//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker pool that drives a run:
//! - Validating the seed and building the domain scope
//! - Seeding the frontier and spawning workers
//! - Rendering, link extraction and export per page
//! - Stopping early on engine loss or interrupt
//! - Recording the run in storage

use crate::config::Config;
use crate::crawler::frontier::{EnqueueResult, Frontier, FrontierEntry};
use crate::crawler::parser::parse_html;
use crate::export::{ExportMode, Exporter, Outcome};
use crate::output::{Reporter, RunSummary};
use crate::render::Renderer;
use crate::storage::{RunStatus, Storage};
use crate::url::{normalize, DomainScope, NormalizedUrl};
use crate::FolioError;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

/// Shared state handed to every worker
struct WorkerContext {
    scope: DomainScope,
    render_timeout: Duration,
    renderer: Arc<dyn Renderer>,
    exporter: Exporter,
    frontier: Frontier,
    reporter: Reporter,
}

/// Handle for stopping a running crawl from outside (e.g. on Ctrl-C)
///
/// Stopping ends dispatching; renders already in flight finish or time out
/// and the run ends with a partial summary. Stopping a run that has already
/// finished does nothing.
#[derive(Clone)]
pub struct StopHandle {
    context: Weak<WorkerContext>,
}

impl StopHandle {
    pub fn stop(&self, reason: &str) {
        let Some(context) = self.context.upgrade() else {
            tracing::debug!("Stop requested after the run finished: {}", reason);
            return;
        };
        tracing::warn!("Stopping crawl: {}", reason);
        context.reporter.abort(reason);
        context.frontier.stop();
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    seed: NormalizedUrl,
    workers: usize,
    context: Arc<WorkerContext>,
    storage: Arc<Mutex<dyn Storage>>,
    config_hash: String,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `seed` - The seed URL as given by the user
    /// * `config` - Crawler and output settings
    /// * `mode` - Effective export mode
    /// * `renderer` - The render engine
    /// * `storage` - Hash record and run persistence
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(FolioError::InvalidSeed)` - The seed is not a crawlable URL
    /// * `Err(FolioError)` - The output folder could not be prepared
    pub fn new(
        seed: &str,
        config: &Config,
        mode: ExportMode,
        renderer: Arc<dyn Renderer>,
        storage: Arc<Mutex<dyn Storage>>,
    ) -> Result<Self, FolioError> {
        let seed = normalize(seed, None).map_err(FolioError::InvalidSeed)?;
        let scope = DomainScope::from_seed(&seed);
        let output_dir = config.output.resolve_directory(&seed);

        let exporter = Exporter::new(output_dir, mode, storage.clone())?;
        let frontier = Frontier::new(config.crawler.queue_capacity, config.crawler.max_pages);

        let context = WorkerContext {
            scope,
            render_timeout: Duration::from_secs(config.crawler.render_timeout_secs),
            renderer,
            exporter,
            frontier,
            reporter: Reporter::new(),
        };

        Ok(Self {
            seed,
            workers: config.crawler.workers.max(1),
            context: Arc::new(context),
            storage,
            config_hash: String::new(),
        })
    }

    /// Sets the configuration hash recorded with the run
    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    pub fn seed(&self) -> &NormalizedUrl {
        &self.seed
    }

    pub fn output_dir(&self) -> PathBuf {
        self.context.exporter.output_dir().to_path_buf()
    }

    /// Returns a handle that can stop the run while it is in progress
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            context: Arc::downgrade(&self.context),
        }
    }

    /// Runs the crawl to completion
    ///
    /// Returns the run id in storage (if the run could be recorded) and the
    /// final summary. Per-page failures never fail the run; they are listed
    /// in the summary.
    pub async fn run(self) -> Result<(Option<i64>, RunSummary), FolioError> {
        let mode = self.context.exporter.mode();
        let run_id = {
            let mut storage = self.storage.lock().unwrap_or_else(|e| e.into_inner());
            storage.create_run(self.seed.as_str(), mode.as_str(), &self.config_hash)
        };
        let run_id = match run_id {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Failed to record run start: {}", e);
                None
            }
        };

        tracing::info!(
            "Starting crawl of {} with {} worker(s), mode {}",
            self.seed,
            self.workers,
            mode
        );
        let start_time = Instant::now();

        let frontier = &self.context.frontier;
        frontier.enqueue(FrontierEntry::seed(self.seed.clone()));
        frontier.start();

        let handles: Vec<_> = (0..self.workers)
            .map(|worker_id| tokio::spawn(worker_loop(worker_id, self.context.clone())))
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        let phase = frontier.phase();
        self.context
            .reporter
            .set_overflowed(frontier.overflow_count());
        let summary = match Arc::try_unwrap(self.context) {
            Ok(context) => context.reporter.finalize(),
            Err(context) => {
                tracing::debug!("Worker context still shared, using a summary snapshot");
                context.reporter.snapshot()
            }
        };

        let status = if summary.is_complete() {
            RunStatus::Completed
        } else {
            RunStatus::Aborted
        };
        if let Some(id) = run_id {
            let finished = {
                let mut storage = self.storage.lock().unwrap_or_else(|e| e.into_inner());
                storage.finish_run(id, status, summary.counts())
            };
            if let Err(e) = finished {
                tracing::warn!("Failed to record run completion: {}", e);
            }
        }

        let elapsed = start_time.elapsed();
        tracing::info!(
            "Crawl finished: {} pages in {:.1}s ({:.2} pages/sec), phase {}",
            summary.processed,
            elapsed.as_secs_f64(),
            summary.processed as f64 / elapsed.as_secs_f64().max(0.001),
            phase
        );

        Ok((run_id, summary))
    }
}

async fn worker_loop(worker_id: usize, context: Arc<WorkerContext>) {
    tracing::debug!("Worker {} started", worker_id);

    while let Some(entry) = context.frontier.next().await {
        tracing::debug!(
            "Worker {} processing {} (depth {})",
            worker_id,
            entry.url,
            entry.depth
        );

        let result = match AssertUnwindSafe(process_entry(&context, &entry))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => {
                let reason = panic_reason(&*panic);
                tracing::error!("Worker {} panicked on {}: {}", worker_id, entry.url, reason);
                Err(format!("worker panicked: {}", reason))
            }
        };
        context.reporter.set_known(context.frontier.known_count());
        context.reporter.record(&entry.url, result);
        context.frontier.complete(&entry);
    }

    tracing::debug!("Worker {} finished", worker_id);
}

/// Extracts the message carried by a panic payload
fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Renders one page, feeds its links back into the frontier and exports it
async fn process_entry(context: &WorkerContext, entry: &FrontierEntry) -> Result<Outcome, String> {
    let rendered = match context
        .renderer
        .render(&entry.url, context.render_timeout)
        .await
    {
        Ok(rendered) => rendered,
        Err(e) => {
            if e.is_fatal() {
                tracing::error!("Render engine lost while loading {}: {}", entry.url, e);
                context.reporter.abort(e.to_string());
                context.frontier.stop();
            }
            return Err(e.to_string());
        }
    };

    let parsed = parse_html(&rendered.html, &rendered.document_url);
    let mut enqueued = 0;
    for link in parsed.links {
        if !context.scope.contains(&link) {
            tracing::trace!("Out of scope: {}", link);
            continue;
        }
        match context
            .frontier
            .enqueue(FrontierEntry::discovered(link, entry))
        {
            EnqueueResult::Enqueued => enqueued += 1,
            EnqueueResult::Duplicate | EnqueueResult::Overflow => {}
            EnqueueResult::Closed => break,
        }
    }
    tracing::debug!("{} new links from {}", enqueued, entry.url);

    context
        .exporter
        .export(&rendered)
        .await
        .map(|exported| exported.outcome)
        .map_err(|e| e.to_string())
}
