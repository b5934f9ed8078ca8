//! Export module for content-addressed PDF output
//!
//! This module decides whether a rendered page becomes a new artifact and
//! writes it to the output folder.
//!
//! # Components
//!
//! - `ExportMode`: How an existing archive is treated (overwrite, append, skip, update)
//! - `Outcome`: Result of exporting one page (created, updated, skipped)
//! - `content_digest`: SHA-256 over PDF bytes with volatile metadata blanked
//! - `Exporter`: Naming, hash comparison and atomic file writes

mod digest;
mod exporter;
mod mode;

pub use digest::content_digest;
pub use exporter::{decide, Action, ExportedPage, Exporter};
pub use mode::{ExportMode, Outcome};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while exporting a page
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
