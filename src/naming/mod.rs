//! Naming engine for PDF artifacts
//!
//! This module turns a page title and URL into a stable, filesystem-safe
//! file name, and resolves same-run collisions between different URLs that
//! derive the same base name.
//!
//! # Components
//!
//! - `derive_name`: deterministic `{Title}_{segment}` base name
//! - `NameRegistry`: per-run claim table that appends `_N` on collision

mod derive;
mod registry;

pub use derive::{derive_name, transliterate, MAX_NAME_LEN};
pub use registry::{NameRegistry, NamedArtifact};
