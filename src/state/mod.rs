//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `RunPhase`: Lifecycle of a run (idle, running, draining, done)

mod run_phase;

pub use run_phase::RunPhase;
