use crate::export::Outcome;
use crate::output::{PageError, RunSummary};
use crate::url::NormalizedUrl;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Thread-safe accumulator for per-page outcomes
///
/// Each recorded page emits one progress line in the form
/// `[processed/known] Created: url`.
#[derive(Debug, Default)]
pub struct Reporter {
    summary: Mutex<RunSummary>,
    known: AtomicUsize,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the number of distinct URLs discovered so far
    pub fn set_known(&self, known: usize) {
        self.known.store(known, Ordering::Relaxed);
    }

    /// Records the outcome of one page
    ///
    /// # Arguments
    ///
    /// * `url` - The page
    /// * `result` - The export outcome, or the reason it failed
    pub fn record(&self, url: &NormalizedUrl, result: Result<Outcome, String>) {
        let mut summary = self.lock();
        summary.processed += 1;
        let processed = summary.processed;
        let known = self.known.load(Ordering::Relaxed).max(processed as usize);

        match result {
            Ok(outcome) => {
                match outcome {
                    Outcome::Created => summary.created += 1,
                    Outcome::Updated => summary.updated += 1,
                    Outcome::Skipped => summary.skipped += 1,
                }
                tracing::info!("[{}/{}] {}: {}", processed, known, outcome, url);
            }
            Err(reason) => {
                summary.error_count += 1;
                tracing::warn!("[{}/{}] Error: {} ({})", processed, known, url, reason);
                summary.errors.push(PageError {
                    url: url.to_string(),
                    reason,
                });
            }
        }
    }

    /// Marks the run as stopped early; only the first reason is kept
    pub fn abort(&self, reason: impl Into<String>) {
        let mut summary = self.lock();
        if summary.aborted.is_none() {
            summary.aborted = Some(reason.into());
        }
    }

    /// Records how many links were dropped because the queue was full
    pub fn set_overflowed(&self, overflowed: usize) {
        self.lock().overflowed = overflowed as u64;
    }

    /// Returns a snapshot of the current summary
    pub fn snapshot(&self) -> RunSummary {
        self.lock().clone()
    }

    /// Consumes the reporter and returns the final summary
    pub fn finalize(self) -> RunSummary {
        self.summary.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, RunSummary> {
        self.summary.lock().unwrap_or_else(|e| e.into_inner())
    }
}
