//! Frontier for managing discovered URLs and worker dispatch
//!
//! This module handles:
//! - Queue of discovered-but-not-yet-rendered URLs, ordered by link depth
//!   and FIFO within a depth (BFS order)
//! - Level-ordered dispatch: the depth handed out never decreases, even with
//!   several workers
//! - Exactly-once enqueue and dispatch per normalized URL
//! - Queue bound and optional page limit
//! - Run phase tracking and waking idle workers

use crate::state::RunPhase;
use crate::url::NormalizedUrl;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

/// A URL waiting to be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// The URL to render
    pub url: NormalizedUrl,

    /// Page the link was found on (`None` for the seed)
    pub discovered_from: Option<NormalizedUrl>,

    /// Link distance from the seed
    pub depth: u32,
}

impl FrontierEntry {
    /// Creates the entry for the seed URL
    pub fn seed(url: NormalizedUrl) -> Self {
        Self {
            url,
            discovered_from: None,
            depth: 0,
        }
    }

    /// Creates the entry for a link found on `parent`
    pub fn discovered(url: NormalizedUrl, parent: &FrontierEntry) -> Self {
        Self {
            url,
            discovered_from: Some(parent.url.clone()),
            depth: parent.depth + 1,
        }
    }
}

/// Result of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueResult {
    /// Added to the queue
    Enqueued,

    /// Already queued or visited in this run
    Duplicate,

    /// Queue is full; the URL was not recorded and may be offered again later
    Overflow,

    /// Dispatching has stopped; nothing more is accepted
    Closed,
}

#[derive(Debug)]
struct Inner {
    queue: VecDeque<FrontierEntry>,

    /// Every URL ever enqueued
    seen: HashSet<NormalizedUrl>,

    /// Every URL handed to a worker
    visited: HashSet<NormalizedUrl>,

    in_flight: usize,

    /// In-flight entry count per depth
    in_flight_depths: BTreeMap<u32, usize>,

    overflowed: usize,
    stopped: bool,
    phase: RunPhase,
}

impl Inner {
    /// Whether an entry at `depth` may start given the pages in flight
    ///
    /// A page only discovers links one level below its own, so holding back
    /// entries more than one level below the shallowest in-flight page keeps
    /// the dispatched depth from ever decreasing.
    fn level_open(&self, depth: u32) -> bool {
        self.in_flight_depths
            .keys()
            .next()
            .map_or(true, |&shallowest| depth <= shallowest + 1)
    }

    fn start_entry(&mut self, depth: u32) {
        self.in_flight += 1;
        *self.in_flight_depths.entry(depth).or_insert(0) += 1;
    }

    fn finish_entry(&mut self, depth: u32) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if let Some(count) = self.in_flight_depths.get_mut(&depth) {
            *count -= 1;
            if *count == 0 {
                self.in_flight_depths.remove(&depth);
            }
        }
    }
}

/// Shared crawl frontier
///
/// One mutex guards the queue, the seen-set and the visited-set together,
/// so two workers discovering the same link produce a single enqueue, and a
/// URL is dispatched at most once per run. Entries leave the queue in depth
/// order; completion order across workers is not ordered.
pub struct Frontier {
    inner: Mutex<Inner>,
    notify: Notify,
    capacity: usize,
    max_pages: usize,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of queued entries (at least 1)
    /// * `max_pages` - Maximum number of dispatched pages (0 = unlimited)
    pub fn new(capacity: usize, max_pages: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                seen: HashSet::new(),
                visited: HashSet::new(),
                in_flight: 0,
                in_flight_depths: BTreeMap::new(),
                overflowed: 0,
                stopped: false,
                phase: RunPhase::Idle,
            }),
            notify: Notify::new(),
            capacity: capacity.max(1),
            max_pages,
        }
    }

    /// Offers an entry to the queue
    pub fn enqueue(&self, entry: FrontierEntry) -> EnqueueResult {
        let mut inner = self.lock();

        if inner.stopped || inner.phase == RunPhase::Done {
            return EnqueueResult::Closed;
        }

        if inner.seen.contains(&entry.url) {
            return EnqueueResult::Duplicate;
        }

        if inner.queue.len() >= self.capacity {
            inner.overflowed += 1;
            tracing::warn!(
                "Frontier full ({} entries), dropping {}",
                self.capacity,
                entry.url
            );
            return EnqueueResult::Overflow;
        }

        tracing::trace!("Enqueued {} (depth {})", entry.url, entry.depth);
        inner.seen.insert(entry.url.clone());
        let at = inner
            .queue
            .partition_point(|queued| queued.depth <= entry.depth);
        inner.queue.insert(at, entry);

        if inner.phase != RunPhase::Idle {
            self.refresh_phase(&mut inner);
        }
        self.notify.notify_waiters();

        EnqueueResult::Enqueued
    }

    /// Moves the frontier out of `Idle`
    ///
    /// Called once, after seeding and before workers start.
    pub fn start(&self) {
        let mut inner = self.lock();
        if inner.phase == RunPhase::Idle {
            self.refresh_phase(&mut inner);
        }
        self.notify.notify_waiters();
    }

    /// Waits for the next entry to render
    ///
    /// Returns `None` once the run is over: the queue is empty and nothing is
    /// in flight, the run was stopped, or the page limit was reached. Every
    /// `Some` must be matched by a call to [`Frontier::complete`]. An entry
    /// more than one level below the shallowest in-flight page waits until
    /// that page completes.
    pub async fn next(&self) -> Option<FrontierEntry> {
        loop {
            // Registered before inspecting state so a wakeup in between is not lost
            let notified = self.notify.notified();

            {
                let mut inner = self.lock();

                if inner.stopped || inner.phase == RunPhase::Done {
                    return None;
                }

                if self.max_pages > 0 && inner.visited.len() >= self.max_pages {
                    tracing::info!("Page limit of {} reached", self.max_pages);
                    inner.stopped = true;
                    self.refresh_phase(&mut inner);
                    self.notify.notify_waiters();
                    return None;
                }

                while let Some(depth) = inner.queue.front().map(|queued| queued.depth) {
                    if !inner.level_open(depth) {
                        tracing::trace!("Holding depth {} until shallower pages finish", depth);
                        break;
                    }
                    let Some(entry) = inner.queue.pop_front() else {
                        break;
                    };
                    if inner.visited.insert(entry.url.clone()) {
                        inner.start_entry(entry.depth);
                        self.refresh_phase(&mut inner);
                        return Some(entry);
                    }
                }

                if inner.in_flight == 0 {
                    self.refresh_phase(&mut inner);
                    self.notify.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks one dispatched entry as finished
    ///
    /// Links found on the page must be enqueued before this is called.
    pub fn complete(&self, entry: &FrontierEntry) {
        let mut inner = self.lock();
        inner.finish_entry(entry.depth);
        self.refresh_phase(&mut inner);
        self.notify.notify_waiters();
    }

    /// Stops dispatching; in-flight entries may still complete
    pub fn stop(&self) {
        let mut inner = self.lock();
        if !inner.stopped {
            tracing::debug!(
                "Frontier stopped with {} queued and {} in flight",
                inner.queue.len(),
                inner.in_flight
            );
        }
        inner.stopped = true;
        self.refresh_phase(&mut inner);
        self.notify.notify_waiters();
    }

    /// Returns the current run phase
    pub fn phase(&self) -> RunPhase {
        self.lock().phase
    }

    /// Returns true if `stop` was called or the page limit was hit
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Number of URLs handed to workers
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    /// Number of distinct URLs ever enqueued
    pub fn known_count(&self) -> usize {
        self.lock().seen.len()
    }

    /// Number of entries waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of entries currently being processed
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Number of links dropped because the queue was full
    pub fn overflow_count(&self) -> usize {
        self.lock().overflowed
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn refresh_phase(&self, inner: &mut Inner) {
        if inner.phase == RunPhase::Done {
            return;
        }

        let nothing_to_dispatch = inner.stopped || inner.queue.is_empty();
        let next = if nothing_to_dispatch && inner.in_flight == 0 {
            RunPhase::Done
        } else if nothing_to_dispatch {
            RunPhase::Draining
        } else {
            RunPhase::Running
        };

        if next != inner.phase {
            debug_assert!(inner.phase.can_transition_to(next));
            tracing::debug!("Run phase: {} -> {}", inner.phase, next);
            inner.phase = next;
        }
    }
}
