//! Render module: turning a URL into HTML, a title and PDF bytes
//!
//! The crawler only sees the `Renderer` trait. `ChromiumRenderer` drives a
//! real browser over the DevTools protocol; tests supply scripted renderers.

mod chromium;

pub use chromium::{ChromiumOptions, ChromiumRenderer};

use crate::url::NormalizedUrl;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Output of rendering one page
#[derive(Debug, Clone)]
pub struct RenderResult {
    /// URL that was requested
    pub url: NormalizedUrl,

    /// Address the document was loaded from, after redirects
    ///
    /// Relative links resolve against this, not against `url`.
    pub document_url: Url,

    /// Document title, empty if the page has none
    pub title: String,

    /// Serialized DOM after load
    pub html: String,

    /// Printed PDF
    pub pdf_bytes: Vec<u8>,

    /// When the page was captured
    pub timestamp: DateTime<Utc>,
}

/// Errors reported by a renderer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The page could not be loaded (network failure, timeout, bad response)
    #[error("Load error: {0}")]
    Load(String),

    /// The page loaded but could not be printed or read
    #[error("Render error: {0}")]
    Render(String),

    /// The engine itself is gone; no further page can be rendered
    #[error("Render engine unavailable: {0}")]
    EngineUnavailable(String),
}

impl RenderError {
    /// Returns true if the whole run must stop
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::EngineUnavailable(_))
    }
}

/// A page renderer
///
/// Implementations must be safe to call from several workers at once.
/// The crawler never retries a failed render.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Loads `url` and returns its title, HTML and PDF
    ///
    /// # Arguments
    ///
    /// * `url` - Page to render
    /// * `timeout` - Upper bound on loading the page
    async fn render(&self, url: &NormalizedUrl, timeout: Duration)
        -> Result<RenderResult, RenderError>;
}
