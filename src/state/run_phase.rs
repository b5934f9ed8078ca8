//! Lifecycle phase of a crawl run
//!
//! `Idle → Running → Draining → Done`. A run drains whenever the queue is
//! empty while pages are still in flight; if one of those pages discovers new
//! links (and the run was not stopped) it returns to `Running`.

use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Frontier built, no worker started yet
    Idle,

    /// Queued URLs are being handed out to workers
    Running,

    /// Nothing left to hand out; in-flight pages are finishing
    Draining,

    /// No page in flight and nothing left to dispatch
    Done,
}

impl RunPhase {
    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        match (self, next) {
            (Self::Idle, Self::Idle) => false,
            (Self::Idle, _) => true,
            (Self::Running, Self::Draining | Self::Done) => true,
            (Self::Draining, Self::Running | Self::Done) => true,
            _ => false,
        }
    }

    /// Returns true while the run has not finished
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Draining)
    }

    /// Returns true once the run has fully stopped
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
