//! URL handling module for Site-Folio
//!
//! This module provides URL canonicalization and the single-host scope check
//! that together decide which links the crawler will ever visit.

mod domain;
mod normalize;

// Re-export main types
pub use domain::DomainScope;
pub use normalize::{normalize, NormalizedUrl};
