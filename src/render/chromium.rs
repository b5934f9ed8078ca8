use crate::render::{RenderError, RenderResult, Renderer};
use crate::url::NormalizedUrl;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use chrono::Utc;
use futures::StreamExt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// A4 in inches
const PAPER_WIDTH_IN: f64 = 8.27;
const PAPER_HEIGHT_IN: f64 = 11.69;

/// 3cm top margin leaves room for the URL header, 1cm elsewhere
const MARGIN_TOP_IN: f64 = 1.18;
const MARGIN_SIDE_IN: f64 = 0.39;

/// Time allowed for printing once the page has loaded
const PRINT_TIMEOUT: Duration = Duration::from_secs(60);

/// Browser launch options
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    /// Explicit browser executable; falls back to `CHROMIUM_PATH`, then detection
    pub chrome_path: Option<PathBuf>,

    /// Run without a visible window
    pub headless: bool,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
        }
    }
}

/// Renderer backed by a Chromium instance over the DevTools protocol
///
/// Each call opens its own tab, so concurrent renders do not share state.
pub struct ChromiumRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Launches the browser
    ///
    /// # Returns
    ///
    /// * `Ok(ChromiumRenderer)` - Browser is running
    /// * `Err(RenderError::EngineUnavailable)` - Browser could not be started
    pub async fn launch(options: &ChromiumOptions) -> Result<Self, RenderError> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--hide-scrollbars")
            .arg("--mute-audio");

        if !options.headless {
            builder = builder.with_head();
        }

        if let Some(path) = resolve_executable(options) {
            tracing::info!("Using browser at {}", path.display());
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| RenderError::EngineUnavailable(format!("Invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::EngineUnavailable(format!("Failed to launch browser: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser handler event error: {}", e);
                }
            }
            tracing::debug!("Browser handler task completed");
        });

        tracing::info!("Browser launched");
        Ok(Self { browser, handler })
    }

    /// Closes the browser and waits for its handler to finish
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        let _ = self.handler.await;
    }

    async fn render_in_page(
        &self,
        page: &Page,
        url: &NormalizedUrl,
        timeout: Duration,
    ) -> Result<RenderResult, RenderError> {
        with_timeout(
            async {
                page.goto(url.as_str())
                    .await
                    .map_err(|e| RenderError::Load(e.to_string()))?;
                page.wait_for_navigation()
                    .await
                    .map_err(|e| RenderError::Load(e.to_string()))?;
                Ok(())
            },
            timeout,
            || RenderError::Load(format!("Timed out after {}s", timeout.as_secs())),
        )
        .await?;

        let document_url = page
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|raw| Url::parse(&raw).ok())
            .unwrap_or_else(|| url.as_url().clone());

        let title = page
            .get_title()
            .await
            .map_err(|e| RenderError::Render(format!("Failed to read title: {}", e)))?
            .unwrap_or_default();

        let html = page
            .content()
            .await
            .map_err(|e| RenderError::Render(format!("Failed to read HTML: {}", e)))?;

        let pdf_bytes = with_timeout(
            async {
                page.pdf(pdf_params(url))
                    .await
                    .map_err(|e| RenderError::Render(format!("Failed to print PDF: {}", e)))
            },
            PRINT_TIMEOUT,
            || RenderError::Render("Timed out while printing".to_string()),
        )
        .await?;

        Ok(RenderResult {
            url: url.clone(),
            document_url,
            title: title.trim().to_string(),
            html,
            pdf_bytes,
            timestamp: Utc::now(),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn render(
        &self,
        url: &NormalizedUrl,
        timeout: Duration,
    ) -> Result<RenderResult, RenderError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::EngineUnavailable(format!("Failed to open tab: {}", e)))?;

        let result = self.render_in_page(&page, url, timeout).await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close tab for {}: {}", url, e);
        }

        result
    }
}

/// Picks the executable from options, then `CHROMIUM_PATH`
///
/// `None` leaves the choice to chromiumoxide's own detection.
fn resolve_executable(options: &ChromiumOptions) -> Option<PathBuf> {
    if let Some(path) = &options.chrome_path {
        return Some(path.clone());
    }

    match std::env::var("CHROMIUM_PATH") {
        Ok(path) if !path.is_empty() => {
            let path = PathBuf::from(path);
            if path.exists() {
                Some(path)
            } else {
                tracing::warn!(
                    "CHROMIUM_PATH points to non-existent file: {}",
                    path.display()
                );
                None
            }
        }
        _ => None,
    }
}

async fn with_timeout<F, T, E>(operation: F, limit: Duration, on_timeout: E) -> Result<T, RenderError>
where
    F: Future<Output = Result<T, RenderError>>,
    E: FnOnce() -> RenderError,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}

fn pdf_params(url: &NormalizedUrl) -> PrintToPdfParams {
    PrintToPdfParams {
        print_background: Some(true),
        display_header_footer: Some(true),
        header_template: Some(header_template(url.as_str())),
        footer_template: Some("<div></div>".to_string()),
        paper_width: Some(PAPER_WIDTH_IN),
        paper_height: Some(PAPER_HEIGHT_IN),
        margin_top: Some(MARGIN_TOP_IN),
        margin_bottom: Some(MARGIN_SIDE_IN),
        margin_left: Some(MARGIN_SIDE_IN),
        margin_right: Some(MARGIN_SIDE_IN),
        ..Default::default()
    }
}

/// Builds the header shown on every printed page
///
/// Only the URL is shown; a capture time would make every print differ.
fn header_template(url: &str) -> String {
    format!(
        concat!(
            "<div style=\"font-size: 9px; color: #444444; padding: 5px 15px; width: 100%; ",
            "text-align: left; font-family: Arial, sans-serif; box-sizing: border-box; ",
            "overflow: hidden; white-space: nowrap; text-overflow: ellipsis;\">",
            "<span>{}</span></div>"
        ),
        escape_html(url)
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
